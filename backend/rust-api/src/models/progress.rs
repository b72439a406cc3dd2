use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{accuracy, bson_datetime_as_chrono, LearningSession};

pub const DEFAULT_DIFFICULTY: &str = "medium";

/// Aggregate learning statistics of one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProgress {
    #[serde(rename = "_id")]
    pub user_id: String,
    pub total_sessions: u32,
    pub total_time_minutes: u32,
    pub total_questions: u32,
    pub total_correct: u32,
    #[serde(default)]
    pub subject_levels: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub learning_style: String,
    pub preferred_difficulty: String,
    #[serde(with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,
}

impl UserProgress {
    pub fn new(user_id: &str) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.to_string(),
            total_sessions: 0,
            total_time_minutes: 0,
            total_questions: 0,
            total_correct: 0,
            subject_levels: serde_json::Map::new(),
            learning_style: String::new(),
            preferred_difficulty: DEFAULT_DIFFICULTY.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn overall_accuracy(&self) -> f64 {
        accuracy(self.total_correct, self.total_questions)
    }

    pub fn absorb(&mut self, delta: ProgressDelta) {
        self.total_sessions += delta.sessions;
        self.total_time_minutes += delta.minutes;
        self.total_questions += delta.questions;
        self.total_correct += delta.correct;
        self.updated_at = Utc::now();
    }

    pub fn view(&self) -> ProgressView {
        ProgressView {
            user_id: self.user_id.clone(),
            total_sessions: self.total_sessions,
            total_time_minutes: self.total_time_minutes,
            total_questions: self.total_questions,
            total_correct: self.total_correct,
            overall_accuracy: self.overall_accuracy(),
            subject_levels: self.subject_levels.clone(),
            learning_style: self.learning_style.clone(),
            preferred_difficulty: self.preferred_difficulty.clone(),
        }
    }
}

/// Counters a finished session adds to its owner's progress, applied as one increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressDelta {
    pub sessions: u32,
    pub minutes: u32,
    pub questions: u32,
    pub correct: u32,
}

impl ProgressDelta {
    pub fn from_session(session: &LearningSession) -> Self {
        Self {
            sessions: 1,
            minutes: session.duration_seconds / 60,
            questions: session.questions_asked,
            correct: session.correct_answers,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressView {
    pub user_id: String,
    pub total_sessions: u32,
    pub total_time_minutes: u32,
    pub total_questions: u32,
    pub total_correct: u32,
    pub overall_accuracy: f64,
    pub subject_levels: serde_json::Map<String, serde_json::Value>,
    pub learning_style: String,
    pub preferred_difficulty: String,
}
