use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::bson_datetime_as_chrono;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptMap {
    #[serde(rename = "_id")]
    pub id: String,
    pub session_id: String,
    #[serde(with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    pub nodes: Vec<serde_json::Value>,
    pub edges: Vec<serde_json::Value>,
}

impl ConceptMap {
    /// Builds a map from the `concept_map` section of a document analysis.
    /// Returns `None` when the analysis has no such section.
    pub fn from_analysis(session_id: &str, analysis: &serde_json::Value) -> Option<Self> {
        let section = analysis.get("concept_map")?;
        let list = |key: &str| {
            section
                .get(key)
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default()
        };

        Some(Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            created_at: Utc::now(),
            nodes: list("nodes"),
            edges: list("edges"),
        })
    }
}
