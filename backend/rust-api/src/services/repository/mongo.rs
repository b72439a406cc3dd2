use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{self, doc};
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database};

use super::{Repository, CONCEPT_MAPS, INTERACTIONS, SESSIONS, UPLOADS, USER_PROGRESS};
use crate::metrics::track_db_operation;
use crate::models::{
    concept_map::ConceptMap,
    content::{AnalysisRecord, UploadedContent},
    interaction::Interaction,
    progress::{ProgressDelta, UserProgress, DEFAULT_DIFFICULTY},
    CounterDelta, LearningSession, SessionMode,
};

fn now_bson() -> bson::DateTime {
    bson::DateTime::from_millis(Utc::now().timestamp_millis())
}

#[derive(Clone)]
pub struct MongoRepository {
    db: Database,
}

impl MongoRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let client = mongodb::Client::with_uri_str(uri)
            .await
            .context("Failed to connect to MongoDB")?;
        let repository = Self::new(client.database(database));
        repository.ensure_indexes().await?;
        Ok(repository)
    }

    async fn ensure_indexes(&self) -> Result<()> {
        use mongodb::IndexModel;

        self.uploads()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "session_id": 1, "uploaded_at": -1 })
                    .build(),
            )
            .await
            .context("Failed to index uploads by session")?;
        self.uploads()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "filename": 1, "file_size": 1, "mode": 1 })
                    .build(),
            )
            .await
            .context("Failed to index uploads for cache lookups")?;
        self.interactions()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "session_id": 1, "timestamp": 1 })
                    .build(),
            )
            .await
            .context("Failed to index interactions")?;
        Ok(())
    }

    fn sessions(&self) -> Collection<LearningSession> {
        self.db.collection(SESSIONS)
    }

    fn uploads(&self) -> Collection<UploadedContent> {
        self.db.collection(UPLOADS)
    }

    fn interactions(&self) -> Collection<Interaction> {
        self.db.collection(INTERACTIONS)
    }

    fn concept_maps(&self) -> Collection<ConceptMap> {
        self.db.collection(CONCEPT_MAPS)
    }

    fn progress(&self) -> Collection<UserProgress> {
        self.db.collection(USER_PROGRESS)
    }
}

#[async_trait]
impl Repository for MongoRepository {
    async fn ping(&self) -> Result<()> {
        tokio::time::timeout(
            std::time::Duration::from_secs(1),
            self.db.run_command(doc! { "ping": 1 }),
        )
        .await
        .context("MongoDB timeout after 1s")?
        .context("MongoDB ping failed")?;
        Ok(())
    }

    async fn insert_session(&self, session: &LearningSession) -> Result<()> {
        track_db_operation("insert_one", SESSIONS, async {
            self.sessions()
                .insert_one(session)
                .await
                .context("Failed to insert learning session")?;
            Ok(())
        })
        .await
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<LearningSession>> {
        track_db_operation("find_one", SESSIONS, async {
            self.sessions()
                .find_one(doc! { "_id": session_id })
                .await
                .context("Failed to load learning session")
        })
        .await
    }

    async fn increment_counters(&self, session_id: &str, delta: CounterDelta) -> Result<bool> {
        track_db_operation("update_one", SESSIONS, async {
            let result = self
                .sessions()
                .update_one(
                    doc! { "_id": session_id },
                    doc! {
                        "$inc": {
                            "questions_asked": i64::from(delta.questions_asked),
                            "correct_answers": i64::from(delta.correct_answers),
                            "hints_used": i64::from(delta.hints_used),
                        },
                        "$set": { "updated_at": now_bson() },
                    },
                )
                .await
                .context("Failed to update session counters")?;
            Ok(result.matched_count > 0)
        })
        .await
    }

    async fn complete_session(
        &self,
        session_id: &str,
        duration_seconds: u32,
    ) -> Result<Option<LearningSession>> {
        track_db_operation("find_one_and_update", SESSIONS, async {
            self.sessions()
                .find_one_and_update(
                    doc! { "_id": session_id, "completed": false },
                    doc! {
                        "$set": {
                            "completed": true,
                            "duration_seconds": i64::from(duration_seconds),
                            "updated_at": now_bson(),
                        }
                    },
                )
                .return_document(ReturnDocument::After)
                .await
                .context("Failed to complete learning session")
        })
        .await
    }

    async fn delete_session(&self, session_id: &str) -> Result<bool> {
        track_db_operation("delete_many", SESSIONS, async {
            let by_session = doc! { "session_id": session_id };
            self.uploads()
                .delete_many(by_session.clone())
                .await
                .context("Failed to delete uploads")?;
            self.interactions()
                .delete_many(by_session.clone())
                .await
                .context("Failed to delete interactions")?;
            self.concept_maps()
                .delete_many(by_session)
                .await
                .context("Failed to delete concept maps")?;
            let result = self
                .sessions()
                .delete_one(doc! { "_id": session_id })
                .await
                .context("Failed to delete learning session")?;
            Ok(result.deleted_count > 0)
        })
        .await
    }

    async fn insert_upload(&self, upload: &UploadedContent) -> Result<()> {
        track_db_operation("insert_one", UPLOADS, async {
            self.uploads()
                .insert_one(upload)
                .await
                .context("Failed to insert upload")?;
            Ok(())
        })
        .await
    }

    async fn complete_upload_analysis(
        &self,
        upload_id: &str,
        record: &AnalysisRecord,
    ) -> Result<()> {
        track_db_operation("update_one", UPLOADS, async {
            let key_concepts =
                bson::to_bson(&record.key_concepts).context("Failed to encode key concepts")?;
            self.uploads()
                .update_one(
                    doc! { "_id": upload_id },
                    doc! {
                        "$set": {
                            "analysis_completed": true,
                            "analysis_summary": record.summary.as_str(),
                            "key_concepts": key_concepts,
                            "is_mock": record.is_mock,
                        }
                    },
                )
                .await
                .context("Failed to store analysis")?;
            Ok(())
        })
        .await
    }

    async fn latest_completed_upload(&self, session_id: &str) -> Result<Option<UploadedContent>> {
        track_db_operation("find_one", UPLOADS, async {
            self.uploads()
                .find_one(doc! { "session_id": session_id, "analysis_completed": true })
                .sort(doc! { "uploaded_at": -1 })
                .await
                .context("Failed to load latest analysis")
        })
        .await
    }

    async fn find_cached_analysis(
        &self,
        filename: &str,
        file_size: i64,
        mode: SessionMode,
        exclude_id: &str,
    ) -> Result<Option<UploadedContent>> {
        track_db_operation("find_one", UPLOADS, async {
            self.uploads()
                .find_one(doc! {
                    "filename": filename,
                    "file_size": file_size,
                    "mode": mode.as_str(),
                    "analysis_completed": true,
                    "is_mock": { "$ne": true },
                    "_id": { "$ne": exclude_id },
                })
                .sort(doc! { "uploaded_at": -1 })
                .await
                .context("Failed to look up cached analysis")
        })
        .await
    }

    async fn insert_interaction(&self, interaction: &Interaction) -> Result<()> {
        track_db_operation("insert_one", INTERACTIONS, async {
            self.interactions()
                .insert_one(interaction)
                .await
                .context("Failed to insert interaction")?;
            Ok(())
        })
        .await
    }

    async fn list_interactions(&self, session_id: &str) -> Result<Vec<Interaction>> {
        track_db_operation("find", INTERACTIONS, async {
            self.interactions()
                .find(doc! { "session_id": session_id })
                .sort(doc! { "timestamp": 1 })
                .await
                .context("Failed to query interactions")?
                .try_collect()
                .await
                .context("Failed to read interactions")
        })
        .await
    }

    async fn insert_concept_map(&self, map: &ConceptMap) -> Result<()> {
        track_db_operation("insert_one", CONCEPT_MAPS, async {
            self.concept_maps()
                .insert_one(map)
                .await
                .context("Failed to insert concept map")?;
            Ok(())
        })
        .await
    }

    async fn list_concept_maps(&self, session_id: &str) -> Result<Vec<ConceptMap>> {
        track_db_operation("find", CONCEPT_MAPS, async {
            self.concept_maps()
                .find(doc! { "session_id": session_id })
                .sort(doc! { "created_at": 1 })
                .await
                .context("Failed to query concept maps")?
                .try_collect()
                .await
                .context("Failed to read concept maps")
        })
        .await
    }

    async fn get_progress(&self, user_id: &str) -> Result<Option<UserProgress>> {
        track_db_operation("find_one", USER_PROGRESS, async {
            self.progress()
                .find_one(doc! { "_id": user_id })
                .await
                .context("Failed to load user progress")
        })
        .await
    }

    async fn add_progress(&self, user_id: &str, delta: ProgressDelta) -> Result<()> {
        track_db_operation("update_one", USER_PROGRESS, async {
            let now = now_bson();
            self.progress()
                .update_one(
                    doc! { "_id": user_id },
                    doc! {
                        "$inc": {
                            "total_sessions": i64::from(delta.sessions),
                            "total_time_minutes": i64::from(delta.minutes),
                            "total_questions": i64::from(delta.questions),
                            "total_correct": i64::from(delta.correct),
                        },
                        "$set": { "updated_at": now },
                        "$setOnInsert": {
                            "subject_levels": {},
                            "learning_style": "",
                            "preferred_difficulty": DEFAULT_DIFFICULTY,
                            "created_at": now,
                        },
                    },
                )
                .upsert(true)
                .await
                .context("Failed to update user progress")?;
            Ok(())
        })
        .await
    }

    async fn set_preferred_difficulty(&self, user_id: &str, level: &str) -> Result<bool> {
        track_db_operation("update_one", USER_PROGRESS, async {
            let result = self
                .progress()
                .update_one(
                    doc! { "_id": user_id },
                    doc! { "$set": { "preferred_difficulty": level, "updated_at": now_bson() } },
                )
                .await
                .context("Failed to update preferred difficulty")?;
            Ok(result.matched_count > 0)
        })
        .await
    }
}
