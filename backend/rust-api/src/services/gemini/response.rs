//! Wire types of the `generateContent` API and the strict reply parsing.

use serde::{Deserialize, Serialize};

use super::GatewayError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts,
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Some("model".to_string()),
            parts: vec![Part::text(text)],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<Blob>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_data: Option<FileData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn inline(mime_type: &str, base64_data: String) -> Self {
        Self {
            inline_data: Some(Blob {
                mime_type: mime_type.to_string(),
                data: base64_data,
            }),
            ..Self::default()
        }
    }

    pub fn file(mime_type: &str, file_uri: &str) -> Self {
        Self {
            file_data: Some(FileData {
                mime_type: mime_type.to_string(),
                file_uri: file_uri.to_string(),
            }),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub mime_type: String,
    pub file_uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
}

impl GenerationConfig {
    pub fn json() -> Self {
        Self {
            response_mime_type: "application/json".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    details: Vec<serde_json::Value>,
}

/// Concatenated text of the first candidate.
pub fn candidate_text(response: &GenerateContentResponse) -> Result<String, GatewayError> {
    let candidate = response.candidates.first().ok_or_else(|| {
        let reason = response
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.clone())
            .unwrap_or_else(|| "no candidates".to_string());
        GatewayError::InvalidResponse(format!("model returned no answer ({})", reason))
    })?;

    let text: String = candidate
        .content
        .as_ref()
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(GatewayError::InvalidResponse(format!(
            "empty answer (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }
    Ok(text)
}

/// Parses `text` as a JSON object. Anything else is rejected, including
/// replies wrapped in markdown fences.
pub fn parse_json_object(text: &str) -> Result<serde_json::Value, GatewayError> {
    let value: serde_json::Value = serde_json::from_str(text.trim())
        .map_err(|err| GatewayError::InvalidResponse(format!("reply is not JSON: {}", err)))?;
    if !value.is_object() {
        return Err(GatewayError::InvalidResponse(
            "reply is not a JSON object".to_string(),
        ));
    }
    Ok(value)
}

pub fn require_keys(value: &serde_json::Value, keys: &[&str]) -> Result<(), GatewayError> {
    let missing: Vec<&str> = keys
        .iter()
        .copied()
        .filter(|key| value.get(*key).is_none())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(GatewayError::InvalidResponse(format!(
            "reply is missing required fields: {}",
            missing.join(", ")
        )))
    }
}

/// Strict parse into a typed contract.
pub fn parse_typed<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, GatewayError> {
    let value = parse_json_object(text)?;
    serde_json::from_value(value)
        .map_err(|err| GatewayError::InvalidResponse(format!("reply does not match schema: {}", err)))
}

/// Builds a structured error from a non-success response.
pub fn api_error(http_status: u16, body: &str) -> GatewayError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let reason = envelope
                .error
                .details
                .iter()
                .find_map(|detail| detail.get("reason").and_then(|r| r.as_str()))
                .map(str::to_string);
            GatewayError::Api {
                http_status: envelope.error.code.unwrap_or(http_status),
                provider_status: envelope.error.status,
                reason,
                message: envelope.error.message,
            }
        }
        Err(_) => GatewayError::Api {
            http_status,
            provider_status: None,
            reason: None,
            message: body.chars().take(500).collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response_from(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn joins_text_parts_of_first_candidate() {
        let response = response_from(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "{\"a\":"}, {"text": " 1}"}]},
                "finishReason": "STOP"
            }]
        }));
        assert_eq!(candidate_text(&response).unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn blocked_prompt_is_invalid_response() {
        let response = response_from(json!({"promptFeedback": {"blockReason": "SAFETY"}}));
        let err = candidate_text(&response).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidResponse(ref msg) if msg.contains("SAFETY")));
    }

    #[test]
    fn fenced_json_is_rejected() {
        let err = parse_json_object("```json\n{\"summary\": \"x\"}\n```").unwrap_err();
        assert!(matches!(err, GatewayError::InvalidResponse(_)));
        assert!(parse_json_object("[1, 2]").is_err());
        assert!(parse_json_object(" {\"summary\": \"x\"} ").is_ok());
    }

    #[test]
    fn missing_required_keys_are_listed() {
        let value = json!({"summary": "x"});
        let err = require_keys(&value, &["summary", "key_concepts"]).unwrap_err();
        assert!(err.to_string().contains("key_concepts"));
    }

    #[test]
    fn structured_error_body_is_decoded() {
        let body = json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT",
                "details": [{"@type": "type.googleapis.com/google.rpc.ErrorInfo", "reason": "API_KEY_INVALID"}]
            }
        })
        .to_string();

        match api_error(400, &body) {
            GatewayError::Api {
                http_status,
                provider_status,
                reason,
                ..
            } => {
                assert_eq!(http_status, 400);
                assert_eq!(provider_status.as_deref(), Some("INVALID_ARGUMENT"));
                assert_eq!(reason.as_deref(), Some("API_KEY_INVALID"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn unstructured_error_body_keeps_status() {
        let err = api_error(503, "upstream connect error");
        assert_eq!(err.to_string(), "503 UNKNOWN: upstream connect error");
    }

    #[test]
    fn request_serializes_in_camel_case() {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![
                Part::text("hello"),
                Part::inline("image/png", "aGk=".into()),
            ])],
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::text("tutor")],
            }),
            generation_config: Some(GenerationConfig::json()),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(value["generationConfig"]["responseMimeType"], "application/json");
        assert!(value["systemInstruction"].get("role").is_none());
    }
}
