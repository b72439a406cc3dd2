//! Adapter around the hosted generative model.
//!
//! [`AiGateway`] is the seam the request handlers depend on; [`GeminiGateway`]
//! is the production implementation talking to the Gemini REST API. Analysis
//! operations never panic or propagate transport faults as anything other than
//! a [`GatewayError`] value, so callers can classify and fall back.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::models::{answer::AnswerEvaluation, practice::PracticeProblem};
use crate::services::staging::StagedUpload;

pub mod client;
pub mod files;
pub mod prompts;
pub mod response;

pub use client::GeminiGateway;

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("AI provider is not configured: set GEMINI_API_KEY")]
    NotConfigured,
    #[error("No active chat session. Call start_interactive_session first.")]
    NoActiveSession,
    #[error("{}", describe_api_error(.http_status, .provider_status, .reason, .message))]
    Api {
        http_status: u16,
        provider_status: Option<String>,
        reason: Option<String>,
        message: String,
    },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("file processing failed: {0}")]
    FileProcessing(String),
    #[error("timed out waiting for the model: {0}")]
    Timeout(String),
    #[error("invalid model response: {0}")]
    InvalidResponse(String),
    #[error("failed to stage upload: {0}")]
    Staging(String),
}

fn describe_api_error(
    http_status: &u16,
    provider_status: &Option<String>,
    reason: &Option<String>,
    message: &str,
) -> String {
    let mut text = format!(
        "{} {}: {}",
        http_status,
        provider_status.as_deref().unwrap_or("UNKNOWN"),
        message
    );
    if let Some(reason) = reason {
        text.push_str(&format!(" [{}]", reason));
    }
    text
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

/// Conversation state for one learning session.
///
/// Cloning is cheap and shares the transcript. Turns on one handle are
/// serialized through the transcript lock.
#[derive(Debug, Clone)]
pub struct ChatHandle {
    id: Uuid,
    system_instruction: Arc<str>,
    transcript: Arc<Mutex<Vec<ChatTurn>>>,
}

impl ChatHandle {
    pub fn new(system_instruction: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            system_instruction: Arc::from(system_instruction.into()),
            transcript: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    pub async fn lock_transcript(&self) -> MutexGuard<'_, Vec<ChatTurn>> {
        self.transcript.lock().await
    }

    pub async fn turns(&self) -> Vec<ChatTurn> {
        self.transcript.lock().await.clone()
    }
}

#[async_trait]
pub trait AiGateway: Send + Sync {
    /// Whether credentials are available. Operations fail with
    /// [`GatewayError::NotConfigured`] otherwise.
    fn is_configured(&self) -> bool;

    async fn analyze_video(
        &self,
        file: &StagedUpload,
        context: &str,
    ) -> Result<serde_json::Value, GatewayError>;

    async fn analyze_image_problem(
        &self,
        file: &StagedUpload,
        subject_hint: &str,
    ) -> Result<serde_json::Value, GatewayError>;

    async fn analyze_document(
        &self,
        file: &StagedUpload,
        focus_areas: &str,
    ) -> Result<serde_json::Value, GatewayError>;

    async fn creative_workshop(
        &self,
        file: &StagedUpload,
        creative_goal: &str,
    ) -> Result<serde_json::Value, GatewayError>;

    async fn start_interactive_session(
        &self,
        context: &str,
        user_level: &str,
    ) -> Result<ChatHandle, GatewayError>;

    /// Sends one turn. `None` is a caller bug and yields
    /// [`GatewayError::NoActiveSession`].
    async fn send_message(
        &self,
        chat: Option<&ChatHandle>,
        message: &str,
    ) -> Result<String, GatewayError>;

    async fn evaluate_answer(
        &self,
        question: &str,
        user_answer: &str,
        correct_answer: &str,
        context: &str,
    ) -> Result<AnswerEvaluation, GatewayError>;

    async fn generate_practice_problems(
        &self,
        topic: &str,
        difficulty: &str,
        count: u32,
    ) -> Result<Vec<PracticeProblem>, GatewayError>;

    async fn suggest_difficulty(
        &self,
        user_stats: &serde_json::Value,
    ) -> Result<serde_json::Value, GatewayError>;
}
