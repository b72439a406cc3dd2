use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::Repository;
use crate::models::{
    concept_map::ConceptMap,
    content::{AnalysisRecord, UploadedContent},
    interaction::Interaction,
    progress::{ProgressDelta, UserProgress},
    CounterDelta, LearningSession, SessionMode,
};

#[derive(Default)]
struct Tables {
    sessions: HashMap<String, LearningSession>,
    uploads: Vec<UploadedContent>,
    interactions: Vec<Interaction>,
    concept_maps: Vec<ConceptMap>,
    progress: HashMap<String, UserProgress>,
}

/// Process-local storage for tests and `STORAGE_BACKEND=memory`.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn uploads_for(&self, session_id: &str) -> Vec<UploadedContent> {
        self.tables
            .read()
            .await
            .uploads
            .iter()
            .filter(|upload| upload.session_id == session_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn insert_session(&self, session: &LearningSession) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.sessions.contains_key(&session.id) {
            anyhow::bail!("duplicate session id {}", session.id);
        }
        tables.sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<LearningSession>> {
        Ok(self.tables.read().await.sessions.get(session_id).cloned())
    }

    async fn increment_counters(&self, session_id: &str, delta: CounterDelta) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.sessions.get_mut(session_id) {
            Some(session) => {
                session.questions_asked += delta.questions_asked;
                session.correct_answers += delta.correct_answers;
                session.hints_used += delta.hints_used;
                session.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn complete_session(
        &self,
        session_id: &str,
        duration_seconds: u32,
    ) -> Result<Option<LearningSession>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .sessions
            .get_mut(session_id)
            .filter(|session| !session.completed)
            .map(|session| {
                session.completed = true;
                session.duration_seconds = duration_seconds;
                session.updated_at = Utc::now();
                session.clone()
            }))
    }

    async fn delete_session(&self, session_id: &str) -> Result<bool> {
        let mut tables = self.tables.write().await;
        tables.uploads.retain(|upload| upload.session_id != session_id);
        tables
            .interactions
            .retain(|interaction| interaction.session_id != session_id);
        tables.concept_maps.retain(|map| map.session_id != session_id);
        Ok(tables.sessions.remove(session_id).is_some())
    }

    async fn insert_upload(&self, upload: &UploadedContent) -> Result<()> {
        self.tables.write().await.uploads.push(upload.clone());
        Ok(())
    }

    async fn complete_upload_analysis(
        &self,
        upload_id: &str,
        record: &AnalysisRecord,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        if let Some(upload) = tables.uploads.iter_mut().find(|upload| upload.id == upload_id) {
            upload.analysis_completed = true;
            upload.analysis_summary = record.summary.clone();
            upload.key_concepts = record.key_concepts.clone();
            upload.is_mock = record.is_mock;
        }
        Ok(())
    }

    async fn latest_completed_upload(&self, session_id: &str) -> Result<Option<UploadedContent>> {
        let tables = self.tables.read().await;
        Ok(tables
            .uploads
            .iter()
            .filter(|upload| upload.session_id == session_id && upload.analysis_completed)
            .max_by_key(|upload| upload.uploaded_at)
            .cloned())
    }

    async fn find_cached_analysis(
        &self,
        filename: &str,
        file_size: i64,
        mode: SessionMode,
        exclude_id: &str,
    ) -> Result<Option<UploadedContent>> {
        let tables = self.tables.read().await;
        Ok(tables
            .uploads
            .iter()
            .rev()
            .find(|upload| {
                upload.analysis_completed
                    && !upload.is_mock
                    && upload.id != exclude_id
                    && upload.filename == filename
                    && upload.file_size == file_size
                    && upload.mode == mode
            })
            .cloned())
    }

    async fn insert_interaction(&self, interaction: &Interaction) -> Result<()> {
        self.tables
            .write()
            .await
            .interactions
            .push(interaction.clone());
        Ok(())
    }

    async fn list_interactions(&self, session_id: &str) -> Result<Vec<Interaction>> {
        let tables = self.tables.read().await;
        let mut interactions: Vec<Interaction> = tables
            .interactions
            .iter()
            .filter(|interaction| interaction.session_id == session_id)
            .cloned()
            .collect();
        interactions.sort_by_key(|interaction| interaction.timestamp);
        Ok(interactions)
    }

    async fn insert_concept_map(&self, map: &ConceptMap) -> Result<()> {
        self.tables.write().await.concept_maps.push(map.clone());
        Ok(())
    }

    async fn list_concept_maps(&self, session_id: &str) -> Result<Vec<ConceptMap>> {
        Ok(self
            .tables
            .read()
            .await
            .concept_maps
            .iter()
            .filter(|map| map.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn get_progress(&self, user_id: &str) -> Result<Option<UserProgress>> {
        Ok(self.tables.read().await.progress.get(user_id).cloned())
    }

    async fn add_progress(&self, user_id: &str, delta: ProgressDelta) -> Result<()> {
        self.tables
            .write()
            .await
            .progress
            .entry(user_id.to_string())
            .or_insert_with(|| UserProgress::new(user_id))
            .absorb(delta);
        Ok(())
    }

    async fn set_preferred_difficulty(&self, user_id: &str, level: &str) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.progress.get_mut(user_id) {
            Some(progress) => {
                progress.preferred_difficulty = level.to_string();
                progress.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
