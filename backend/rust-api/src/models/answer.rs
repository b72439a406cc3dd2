use serde::{Deserialize, Serialize};
use validator::Validate;

use super::question::empty_object;

#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    pub session_id: String,
    pub question: String,
    pub user_answer: String,
    #[serde(default)]
    pub correct_answer: String,
    #[serde(default = "empty_object")]
    pub context: serde_json::Value,
}

/// Structured grading returned by the AI tutor.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnswerEvaluation {
    pub is_correct: bool,
    #[validate(range(min = 0.0, max = 100.0))]
    pub correctness_percentage: f64,
    #[serde(default)]
    pub feedback: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub what_was_good: serde_json::Value,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub what_to_improve: serde_json::Value,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub hint_for_next_time: serde_json::Value,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub encouragement: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct SubmitAnswerResponse {
    pub success: bool,
    pub evaluation: AnswerEvaluation,
    pub interaction_id: String,
}
