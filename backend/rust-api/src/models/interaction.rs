use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::bson_datetime_as_chrono;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Question,
    Answer,
    Hint,
    Explanation,
    Feedback,
}

/// One logged exchange with the AI tutor. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(rename = "_id")]
    pub id: String,
    pub session_id: String,
    pub interaction_type: InteractionKind,
    #[serde(with = "bson_datetime_as_chrono")]
    pub timestamp: DateTime<Utc>,
    pub prompt: String,
    pub response: String,
    #[serde(default)]
    pub user_response: Option<String>,
    #[serde(default)]
    pub is_correct: Option<bool>,
    #[serde(default)]
    pub context_data: serde_json::Value,
}

impl Interaction {
    pub fn new(
        session_id: &str,
        interaction_type: InteractionKind,
        prompt: impl Into<String>,
        response: impl Into<String>,
        context_data: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            interaction_type,
            timestamp: Utc::now(),
            prompt: prompt.into(),
            response: response.into(),
            user_response: None,
            is_correct: None,
            context_data,
        }
    }

    pub fn with_answer(mut self, user_response: impl Into<String>, is_correct: bool) -> Self {
        self.user_response = Some(user_response.into());
        self.is_correct = Some(is_correct);
        self
    }
}
