use serde::{Deserialize, Serialize};
use validator::Validate;

pub(crate) fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

#[derive(Debug, Deserialize, Validate)]
pub struct AskQuestionRequest {
    pub session_id: String,
    #[validate(length(min = 1, message = "Question must not be empty"))]
    pub question: String,
    #[serde(default = "empty_object")]
    pub context: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct AskQuestionResponse {
    pub success: bool,
    pub response: String,
    pub interaction_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_mock: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct FirstQuestionRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct FirstQuestionResponse {
    pub success: bool,
    pub question: String,
    pub is_fallback: bool,
}
