use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{bson_datetime_as_chrono, SessionMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Video,
    Image,
    Document,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Video => "video",
            ContentKind::Image => "image",
            ContentKind::Document => "document",
        }
    }

    /// Whether a session running in `mode` can analyze this kind of content.
    pub fn accepted_by(&self, mode: SessionMode) -> bool {
        matches!(
            (mode, self),
            (SessionMode::Video, ContentKind::Video)
                | (SessionMode::Problem, ContentKind::Image)
                | (SessionMode::Creative, ContentKind::Image)
                | (SessionMode::Document, ContentKind::Document)
        )
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata and analysis of one uploaded file. The file itself is never kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedContent {
    #[serde(rename = "_id")]
    pub id: String,
    pub session_id: String,
    pub content_type: ContentKind,
    pub mode: SessionMode,
    pub filename: String,
    pub file_size: i64,
    #[serde(with = "bson_datetime_as_chrono")]
    pub uploaded_at: DateTime<Utc>,
    pub analysis_completed: bool,
    #[serde(default)]
    pub analysis_summary: String,
    #[serde(default)]
    pub key_concepts: Vec<serde_json::Value>,
    /// Set when the stored analysis is canned demo content. Never served from cache.
    #[serde(default)]
    pub is_mock: bool,
}

impl UploadedContent {
    pub fn new(
        session_id: &str,
        mode: SessionMode,
        content_type: ContentKind,
        filename: &str,
        file_size: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            content_type,
            mode,
            filename: filename.to_string(),
            file_size,
            uploaded_at: Utc::now(),
            analysis_completed: false,
            analysis_summary: String::new(),
            key_concepts: Vec::new(),
            is_mock: false,
        }
    }

    /// Parsed analysis, `None` until the analysis has been stored.
    pub fn analysis(&self) -> Option<serde_json::Value> {
        if !self.analysis_completed || self.analysis_summary.is_empty() {
            return None;
        }
        serde_json::from_str(&self.analysis_summary).ok()
    }
}

/// Serialized analysis plus the concepts pulled out of it, stored in one update.
#[derive(Debug, Clone)]
pub struct AnalysisRecord {
    pub summary: String,
    pub key_concepts: Vec<serde_json::Value>,
    pub is_mock: bool,
}

impl AnalysisRecord {
    pub fn from_analysis(analysis: &serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(Self {
            summary: serde_json::to_string(analysis)?,
            key_concepts: extract_key_concepts(analysis),
            is_mock: false,
        })
    }

    pub fn mocked(self) -> Self {
        Self {
            is_mock: true,
            ..self
        }
    }
}

/// `key_concepts` when present, otherwise the closest list the mode produces.
pub fn extract_key_concepts(analysis: &serde_json::Value) -> Vec<serde_json::Value> {
    ["key_concepts", "concepts_needed", "main_topics"]
        .iter()
        .find_map(|key| analysis.get(*key).and_then(|v| v.as_array()).cloned())
        .unwrap_or_default()
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub upload_id: String,
    pub analysis: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_cached: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_mock: Option<bool>,
}
