use serde::{Deserialize, Serialize};
use validator::Validate;

fn default_difficulty() -> String {
    "medium".to_string()
}

fn default_count() -> u32 {
    5
}

#[derive(Debug, Deserialize, Validate)]
pub struct GeneratePracticeRequest {
    #[validate(length(min = 1, message = "Topic must not be empty"))]
    pub topic: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    #[serde(default = "default_count")]
    #[validate(range(min = 1, max = 20, message = "Count must be between 1 and 20"))]
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeProblem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub problem: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub options: Vec<serde_json::Value>,
    pub solution: String,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub learning_objective: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PracticeProblemSet {
    pub problems: Vec<PracticeProblem>,
}

#[derive(Debug, Serialize)]
pub struct GeneratePracticeResponse {
    pub success: bool,
    pub problems: Vec<PracticeProblem>,
}
