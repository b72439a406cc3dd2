use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RequestHintRequest {
    pub session_id: String,
    #[validate(length(min = 1, message = "Problem must not be empty"))]
    pub problem: String,
    #[serde(default)]
    pub current_progress: String,
}

/// JSON shape the tutor must answer a hint prompt with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HintReply {
    pub hint: String,
    #[serde(default)]
    pub encouragement: String,
}

#[derive(Debug, Serialize)]
pub struct RequestHintResponse {
    pub success: bool,
    pub hint: String,
    pub encouragement: String,
}
