use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;

use crate::error::ApiError;
use crate::metrics::record_session_event;
use crate::models::{
    progress::ProgressDelta, CreateSessionRequest, CreateSessionResponse, LearningSession,
    SessionStats,
};
use crate::services::chat_registry::ChatSessionRegistry;
use crate::services::repository::Repository;
use crate::services::AppState;

pub struct SessionService {
    repository: Arc<dyn Repository>,
    chats: ChatSessionRegistry,
}

impl SessionService {
    pub fn new(state: &AppState) -> Self {
        Self {
            repository: state.repository.clone(),
            chats: state.chats.clone(),
        }
    }

    pub async fn create_session(
        &self,
        req: CreateSessionRequest,
    ) -> Result<CreateSessionResponse, ApiError> {
        let title = req
            .title
            .map(|title| title.trim().to_string())
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| format!("New {} session", req.mode));

        let session = LearningSession::new(req.mode, title, req.user_id);
        self.repository.insert_session(&session).await?;

        record_session_event("created", session.mode.as_str());
        tracing::info!(
            "Learning session created: {} (mode {})",
            session.id,
            session.mode
        );

        Ok(CreateSessionResponse {
            success: true,
            session_id: session.id,
            message: "Learning session created".to_string(),
        })
    }

    pub async fn get_session(&self, session_id: &str) -> Result<LearningSession, ApiError> {
        self.repository
            .get_session(session_id)
            .await?
            .ok_or(ApiError::SessionNotFound)
    }

    pub async fn get_stats(&self, session_id: &str) -> Result<SessionStats, ApiError> {
        Ok(self.get_session(session_id).await?.stats())
    }

    /// Marks the session completed, releases its chat handle and folds the
    /// counters into the owner's progress. Completing twice is a no-op.
    pub async fn complete_session(&self, session_id: &str) -> Result<SessionStats, ApiError> {
        let session = self.get_session(session_id).await?;
        if session.completed {
            return Ok(session.stats());
        }

        let elapsed = (Utc::now() - session.created_at).num_seconds().max(0);
        let duration_seconds = u32::try_from(elapsed).unwrap_or(u32::MAX);

        let completed = match self
            .repository
            .complete_session(session_id, duration_seconds)
            .await?
        {
            Some(completed) => completed,
            // Another request completed it first and owns the progress update.
            None => return self.get_stats(session_id).await,
        };
        self.chats.remove(session_id).await;

        if let Some(user_id) = completed.user_id.as_deref() {
            self.repository
                .add_progress(user_id, ProgressDelta::from_session(&completed))
                .await
                .with_context(|| format!("Failed to update progress of {}", user_id))?;
        }

        record_session_event("completed", completed.mode.as_str());
        tracing::info!(
            "Learning session completed: {} after {}s",
            session_id,
            duration_seconds
        );
        Ok(completed.stats())
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<(), ApiError> {
        let session = self.get_session(session_id).await?;
        self.chats.remove(session_id).await;
        if !self.repository.delete_session(session_id).await? {
            return Err(ApiError::SessionNotFound);
        }
        record_session_event("deleted", session.mode.as_str());
        tracing::info!("Learning session deleted: {}", session_id);
        Ok(())
    }
}
