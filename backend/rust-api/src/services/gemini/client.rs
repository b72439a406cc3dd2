use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};

use super::files::FilesApi;
use super::prompts;
use super::response::{
    api_error, candidate_text, parse_json_object, parse_typed, require_keys, Content,
    GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
};
use super::{AiGateway, ChatHandle, ChatRole, ChatTurn, GatewayError};
use crate::config::GeminiConfig;
use crate::metrics::track_ai_call;
use crate::models::{
    answer::AnswerEvaluation,
    practice::{PracticeProblem, PracticeProblemSet},
};
use crate::services::staging::StagedUpload;

/// Gemini REST client.
pub struct GeminiGateway {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    poll_interval: Duration,
    poll_timeout: Duration,
}

impl GeminiGateway {
    pub fn new(config: &GeminiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            poll_interval: config.poll_interval,
            poll_timeout: config.poll_timeout,
        })
    }

    fn api_key(&self) -> Result<&str, GatewayError> {
        self.api_key.as_deref().ok_or(GatewayError::NotConfigured)
    }

    fn files(&self) -> Result<FilesApi<'_>, GatewayError> {
        Ok(FilesApi {
            http: &self.http,
            base_url: &self.base_url,
            api_key: self.api_key()?,
        })
    }

    async fn generate(&self, request: &GenerateContentRequest) -> Result<String, GatewayError> {
        let api_key = self.api_key()?;
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!("Gemini returned {}", status);
            return Err(api_error(status.as_u16(), &body));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|err| GatewayError::InvalidResponse(format!("generateContent reply: {}", err)))?;
        candidate_text(&parsed)
    }

    async fn generate_json(
        &self,
        parts: Vec<Part>,
        required_keys: &[&str],
    ) -> Result<serde_json::Value, GatewayError> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(parts)],
            system_instruction: None,
            generation_config: Some(GenerationConfig::json()),
        };
        let text = self.generate(&request).await?;
        let value = parse_json_object(&text)?;
        require_keys(&value, required_keys)?;
        Ok(value)
    }

    async fn generate_typed<T: serde::de::DeserializeOwned>(
        &self,
        prompt: String,
    ) -> Result<T, GatewayError> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(prompt)])],
            system_instruction: None,
            generation_config: Some(GenerationConfig::json()),
        };
        let text = self.generate(&request).await?;
        parse_typed(&text)
    }

    async fn analyze_inline_image(
        &self,
        file: &StagedUpload,
        prompt: String,
        required_keys: &[&str],
    ) -> Result<serde_json::Value, GatewayError> {
        self.api_key()?;
        let bytes = file
            .read()
            .await
            .map_err(|err| GatewayError::Staging(err.to_string()))?;
        let encoded = general_purpose::STANDARD.encode(bytes);

        self.generate_json(
            vec![Part::inline(file.mime_type(), encoded), Part::text(prompt)],
            required_keys,
        )
        .await
    }

    async fn analyze_uploaded_file(
        &self,
        file: &StagedUpload,
        prompt: String,
        required_keys: &[&str],
    ) -> Result<serde_json::Value, GatewayError> {
        let files = self.files()?;
        let remote = files.upload(file).await?;
        let name = remote.name.clone();

        let result = async {
            let ready = files
                .wait_until_active(remote, self.poll_interval, self.poll_timeout)
                .await?;
            let mime_type = if ready.mime_type.is_empty() {
                file.mime_type().to_string()
            } else {
                ready.mime_type.clone()
            };
            self.generate_json(
                vec![Part::file(&mime_type, &ready.uri), Part::text(prompt)],
                required_keys,
            )
            .await
        }
        .await;

        files.delete(&name).await;
        result
    }
}

#[async_trait]
impl AiGateway for GeminiGateway {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn analyze_video(
        &self,
        file: &StagedUpload,
        context: &str,
    ) -> Result<serde_json::Value, GatewayError> {
        track_ai_call(
            "analyze_video",
            self.analyze_uploaded_file(
                file,
                prompts::video_analysis(context),
                prompts::VIDEO_REQUIRED_KEYS,
            ),
        )
        .await
    }

    async fn analyze_image_problem(
        &self,
        file: &StagedUpload,
        subject_hint: &str,
    ) -> Result<serde_json::Value, GatewayError> {
        let subject = if subject_hint.trim().is_empty() {
            "math"
        } else {
            subject_hint.trim()
        };
        track_ai_call(
            "analyze_image_problem",
            self.analyze_inline_image(
                file,
                prompts::image_problem(subject),
                prompts::PROBLEM_REQUIRED_KEYS,
            ),
        )
        .await
    }

    async fn analyze_document(
        &self,
        file: &StagedUpload,
        focus_areas: &str,
    ) -> Result<serde_json::Value, GatewayError> {
        track_ai_call(
            "analyze_document",
            self.analyze_uploaded_file(
                file,
                prompts::document_analysis(focus_areas),
                prompts::DOCUMENT_REQUIRED_KEYS,
            ),
        )
        .await
    }

    async fn creative_workshop(
        &self,
        file: &StagedUpload,
        creative_goal: &str,
    ) -> Result<serde_json::Value, GatewayError> {
        track_ai_call(
            "creative_workshop",
            self.analyze_inline_image(
                file,
                prompts::creative_workshop(creative_goal),
                prompts::CREATIVE_REQUIRED_KEYS,
            ),
        )
        .await
    }

    async fn start_interactive_session(
        &self,
        context: &str,
        user_level: &str,
    ) -> Result<ChatHandle, GatewayError> {
        self.api_key()?;
        let handle = ChatHandle::new(prompts::tutor_system_instruction(context, user_level));
        tracing::info!("Started chat {} at level {}", handle.id(), user_level);
        Ok(handle)
    }

    async fn send_message(
        &self,
        chat: Option<&ChatHandle>,
        message: &str,
    ) -> Result<String, GatewayError> {
        let chat = chat.ok_or(GatewayError::NoActiveSession)?;

        // Holding the transcript lock serializes turns on one conversation.
        let mut transcript = chat.lock_transcript().await;

        let mut contents: Vec<Content> = transcript
            .iter()
            .map(|turn| match turn.role {
                ChatRole::User => Content::user(vec![Part::text(turn.text.clone())]),
                ChatRole::Model => Content::model(turn.text.clone()),
            })
            .collect();
        contents.push(Content::user(vec![Part::text(message)]));

        let request = GenerateContentRequest {
            contents,
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::text(chat.system_instruction())],
            }),
            generation_config: None,
        };

        let reply = track_ai_call("send_message", self.generate(&request)).await?;

        transcript.push(ChatTurn {
            role: ChatRole::User,
            text: message.to_string(),
        });
        transcript.push(ChatTurn {
            role: ChatRole::Model,
            text: reply.clone(),
        });
        Ok(reply)
    }

    async fn evaluate_answer(
        &self,
        question: &str,
        user_answer: &str,
        correct_answer: &str,
        context: &str,
    ) -> Result<AnswerEvaluation, GatewayError> {
        let prompt = prompts::answer_evaluation(question, user_answer, correct_answer, context);
        let evaluation: AnswerEvaluation =
            track_ai_call("evaluate_answer", self.generate_typed(prompt)).await?;
        validator::Validate::validate(&evaluation)
            .map_err(|err| GatewayError::InvalidResponse(err.to_string()))?;
        Ok(evaluation)
    }

    async fn generate_practice_problems(
        &self,
        topic: &str,
        difficulty: &str,
        count: u32,
    ) -> Result<Vec<PracticeProblem>, GatewayError> {
        let prompt = prompts::practice_problems(topic, difficulty, count);
        let set: PracticeProblemSet =
            track_ai_call("generate_practice_problems", self.generate_typed(prompt)).await?;
        Ok(set.problems)
    }

    async fn suggest_difficulty(
        &self,
        user_stats: &serde_json::Value,
    ) -> Result<serde_json::Value, GatewayError> {
        let stats = serde_json::to_string_pretty(user_stats)
            .map_err(|err| GatewayError::InvalidResponse(err.to_string()))?;
        track_ai_call(
            "suggest_difficulty",
            self.generate_json(
                vec![Part::text(prompts::difficulty_recommendation(&stats))],
                prompts::RECOMMENDATION_REQUIRED_KEYS,
            ),
        )
        .await
    }
}
