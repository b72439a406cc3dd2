//! Persistence of sessions, uploads, interactions, concept maps and progress.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{
    concept_map::ConceptMap,
    content::{AnalysisRecord, UploadedContent},
    interaction::Interaction,
    progress::{ProgressDelta, UserProgress},
    CounterDelta, LearningSession, SessionMode,
};

pub mod memory;
pub mod mongo;

pub use memory::MemoryRepository;
pub use mongo::MongoRepository;

pub const SESSIONS: &str = "learning_sessions";
pub const UPLOADS: &str = "uploaded_contents";
pub const INTERACTIONS: &str = "interactions";
pub const CONCEPT_MAPS: &str = "concept_maps";
pub const USER_PROGRESS: &str = "user_progress";

#[async_trait]
pub trait Repository: Send + Sync {
    async fn ping(&self) -> Result<()>;

    async fn insert_session(&self, session: &LearningSession) -> Result<()>;

    async fn get_session(&self, session_id: &str) -> Result<Option<LearningSession>>;

    /// Applies `delta` in one atomic update. Returns `false` when the session is gone.
    async fn increment_counters(&self, session_id: &str, delta: CounterDelta) -> Result<bool>;

    /// Marks an open session completed and returns its final state. `None` when
    /// the session is missing or was already completed, so only one caller wins.
    async fn complete_session(
        &self,
        session_id: &str,
        duration_seconds: u32,
    ) -> Result<Option<LearningSession>>;

    /// Deletes the session and everything recorded for it.
    async fn delete_session(&self, session_id: &str) -> Result<bool>;

    async fn insert_upload(&self, upload: &UploadedContent) -> Result<()>;

    async fn complete_upload_analysis(&self, upload_id: &str, record: &AnalysisRecord)
        -> Result<()>;

    /// Most recent upload of the session whose analysis is stored.
    async fn latest_completed_upload(&self, session_id: &str) -> Result<Option<UploadedContent>>;

    /// A completed, non-mock upload with the same name, size and mode, other than `exclude_id`.
    async fn find_cached_analysis(
        &self,
        filename: &str,
        file_size: i64,
        mode: SessionMode,
        exclude_id: &str,
    ) -> Result<Option<UploadedContent>>;

    async fn insert_interaction(&self, interaction: &Interaction) -> Result<()>;

    /// Interactions of the session, oldest first.
    async fn list_interactions(&self, session_id: &str) -> Result<Vec<Interaction>>;

    async fn insert_concept_map(&self, map: &ConceptMap) -> Result<()>;

    async fn list_concept_maps(&self, session_id: &str) -> Result<Vec<ConceptMap>>;

    async fn get_progress(&self, user_id: &str) -> Result<Option<UserProgress>>;

    /// Increments the user's totals in one update, creating the record on first use.
    async fn add_progress(&self, user_id: &str, delta: ProgressDelta) -> Result<()>;

    /// Updates only the preferred difficulty. Returns `false` when the user has no progress.
    async fn set_preferred_difficulty(&self, user_id: &str, level: &str) -> Result<bool>;
}
