use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod answer;
pub mod concept_map;
pub mod content;
pub mod hint;
pub mod interaction;
pub mod practice;
pub mod progress;
pub mod question;

/// Pedagogical workflow selected for a learning session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Video,
    Problem,
    Document,
    Creative,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Video => "video",
            SessionMode::Problem => "problem",
            SessionMode::Document => "document",
            SessionMode::Creative => "creative",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SessionMode::Video => "Learn While You Watch",
            SessionMode::Problem => "Visual Problem Solver",
            SessionMode::Document => "Document Intelligence",
            SessionMode::Creative => "Creative Workshop",
        }
    }
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningSession {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub mode: SessionMode,
    pub title: String,
    #[serde(with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,
    pub duration_seconds: u32,
    pub completed: bool,
    pub questions_asked: u32,
    pub correct_answers: u32,
    pub hints_used: u32,
}

impl LearningSession {
    pub fn new(mode: SessionMode, title: String, user_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            mode,
            title,
            created_at: now,
            updated_at: now,
            duration_seconds: 0,
            completed: false,
            questions_asked: 0,
            correct_answers: 0,
            hints_used: 0,
        }
    }

    /// Percentage of correct answers over questions asked, 0 when nothing was asked.
    pub fn accuracy_rate(&self) -> f64 {
        accuracy(self.correct_answers, self.questions_asked)
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            mode: self.mode,
            title: self.title.clone(),
            duration_seconds: self.duration_seconds,
            questions_asked: self.questions_asked,
            correct_answers: self.correct_answers,
            hints_used: self.hints_used,
            accuracy_rate: self.accuracy_rate(),
            completed: self.completed,
            created_at: self.created_at.to_rfc3339(),
        }
    }
}

pub(crate) fn accuracy(correct: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    f64::from(correct) / f64::from(total) * 100.0
}

/// Counter increments applied atomically by the repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterDelta {
    pub questions_asked: u32,
    pub correct_answers: u32,
    pub hints_used: u32,
}

impl CounterDelta {
    pub fn question() -> Self {
        Self {
            questions_asked: 1,
            ..Self::default()
        }
    }

    pub fn correct_answer() -> Self {
        Self {
            correct_answers: 1,
            ..Self::default()
        }
    }

    pub fn hint() -> Self {
        Self {
            hints_used: 1,
            ..Self::default()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub mode: SessionMode,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub success: bool,
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub mode: SessionMode,
    pub title: String,
    pub duration_seconds: u32,
    pub questions_asked: u32,
    pub correct_answers: u32,
    pub hints_used: u32,
    pub accuracy_rate: f64,
    pub completed: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct SessionStatsResponse {
    pub success: bool,
    pub stats: SessionStats,
}

// Serde converters for chrono::DateTime <-> mongodb::bson::DateTime
pub(crate) mod bson_datetime_as_chrono {
    use chrono::{DateTime, Utc};
    use mongodb::bson;
    use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bson_dt = bson::DateTime::from_millis(date.timestamp_millis());
        bson_dt.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bson_dt = bson::DateTime::deserialize(deserializer)?;
        DateTime::from_timestamp_millis(bson_dt.timestamp_millis())
            .ok_or_else(|| D::Error::custom("timestamp out of range"))
    }
}
