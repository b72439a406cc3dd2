use std::sync::Arc;

use anyhow::Context;

use crate::error::ApiError;
use crate::models::{
    practice::{GeneratePracticeRequest, PracticeProblem},
    progress::{ProgressView, UserProgress},
};
use crate::services::failure::FailureClassifier;
use crate::services::gemini::AiGateway;
use crate::services::repository::Repository;
use crate::services::AppState;

pub struct PracticeService {
    repository: Arc<dyn Repository>,
    gateway: Arc<dyn AiGateway>,
    classifier: Arc<dyn FailureClassifier>,
}

impl PracticeService {
    pub fn new(state: &AppState) -> Self {
        Self {
            repository: state.repository.clone(),
            gateway: state.gateway.clone(),
            classifier: state.classifier.clone(),
        }
    }

    pub async fn generate_problems(
        &self,
        req: &GeneratePracticeRequest,
    ) -> Result<Vec<PracticeProblem>, ApiError> {
        let problems = self
            .gateway
            .generate_practice_problems(&req.topic, &req.difficulty, req.count)
            .await
            .map_err(|err| ApiError::from(self.classifier.classify(&err)))?;

        tracing::info!(
            "Generated {} {} problems about {}",
            problems.len(),
            req.difficulty,
            req.topic
        );
        Ok(problems)
    }

    async fn load_progress(&self, user_id: &str) -> Result<UserProgress, ApiError> {
        self.repository
            .get_progress(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("No progress recorded for user {}", user_id)))
    }

    pub async fn get_progress(&self, user_id: &str) -> Result<ProgressView, ApiError> {
        Ok(self.load_progress(user_id).await?.view())
    }

    /// Asks the tutor for a difficulty level and remembers it as the user's preference.
    pub async fn recommend_difficulty(&self, user_id: &str) -> Result<serde_json::Value, ApiError> {
        let progress = self.load_progress(user_id).await?;
        let stats = serde_json::to_value(progress.view()).context("Failed to encode progress")?;

        let recommendation = self
            .gateway
            .suggest_difficulty(&stats)
            .await
            .map_err(|err| ApiError::from(self.classifier.classify(&err)))?;

        if let Some(level) = recommendation
            .get("recommended_level")
            .and_then(|level| level.as_str())
        {
            if !self.repository.set_preferred_difficulty(user_id, level).await? {
                return Err(ApiError::NotFound(format!(
                    "No progress recorded for user {}",
                    user_id
                )));
            }
            tracing::info!("Preferred difficulty of {} set to {}", user_id, level);
        }

        Ok(recommendation)
    }
}
