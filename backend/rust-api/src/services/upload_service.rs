use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use crate::error::ApiError;
use crate::metrics::{record_mock, record_upload};
use crate::models::{
    concept_map::ConceptMap,
    content::{AnalysisRecord, UploadResponse, UploadedContent},
    LearningSession, SessionMode,
};
use crate::services::content_classifier::classify;
use crate::services::failure::FailureClassifier;
use crate::services::gemini::{AiGateway, GatewayError};
use crate::services::mock_fallback::{is_demo_file, mock_analysis};
use crate::services::repository::Repository;
use crate::services::staging::StagedUpload;
use crate::services::AppState;

/// A file received from the client, before validation.
pub struct IncomingFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

pub struct UploadService {
    repository: Arc<dyn Repository>,
    gateway: Arc<dyn AiGateway>,
    classifier: Arc<dyn FailureClassifier>,
    upload_dir: PathBuf,
}

impl UploadService {
    pub fn new(state: &AppState) -> Self {
        Self {
            repository: state.repository.clone(),
            gateway: state.gateway.clone(),
            classifier: state.classifier.clone(),
            upload_dir: state.config.uploads.dir.clone(),
        }
    }

    pub async fn upload_content(
        &self,
        session_id: &str,
        file: IncomingFile,
        context: &str,
    ) -> Result<UploadResponse, ApiError> {
        let kind = classify(&file.filename).map_err(|err| ApiError::BadRequest(err.to_string()))?;

        let session = self
            .repository
            .get_session(session_id)
            .await?
            .ok_or(ApiError::SessionNotFound)?;

        if !kind.accepted_by(session.mode) {
            return Err(ApiError::BadRequest(format!(
                "A {} session cannot analyze {} files",
                session.mode, kind
            )));
        }

        let upload = UploadedContent::new(
            &session.id,
            session.mode,
            kind,
            &file.filename,
            file.bytes.len() as i64,
        );
        self.repository.insert_upload(&upload).await?;
        tracing::info!(
            "Upload {} received for session {}: {} ({} bytes)",
            upload.id,
            session.id,
            upload.filename,
            upload.file_size
        );

        if let Some(analysis) = self.cached_analysis(&upload).await? {
            tracing::info!("Reusing cached analysis for {}", upload.filename);
            self.store_analysis(&upload, &session, &analysis, false).await?;
            record_upload(kind.as_str(), "cached");
            return Ok(UploadResponse {
                success: true,
                upload_id: upload.id,
                analysis,
                is_cached: Some(true),
                is_mock: None,
            });
        }

        let result = {
            let staged = StagedUpload::stage(&self.upload_dir, &file.filename, &file.bytes)
                .await
                .context("Failed to stage upload")?;
            tracing::debug!(
                "Analyzing {} as {} ({}, {} bytes)",
                staged.filename(),
                session.mode,
                staged.mime_type(),
                staged.size()
            );
            self.analyze(session.mode, &staged, context).await
        };

        match result {
            Ok(analysis) => {
                self.store_analysis(&upload, &session, &analysis, false).await?;
                record_upload(kind.as_str(), "analyzed");
                Ok(UploadResponse {
                    success: true,
                    upload_id: upload.id,
                    analysis,
                    is_cached: None,
                    is_mock: None,
                })
            }
            Err(err) => {
                let failure = self.classifier.classify(&err);
                tracing::warn!(
                    "Analysis of {} failed ({:?}): {}",
                    upload.filename,
                    failure.category,
                    err
                );

                if failure.is_transient() && is_demo_file(&upload.filename) {
                    let analysis = mock_analysis(&upload.filename, session.mode);
                    self.store_analysis(&upload, &session, &analysis, true).await?;
                    record_upload(kind.as_str(), "mock");
                    record_mock("upload");
                    return Ok(UploadResponse {
                        success: true,
                        upload_id: upload.id,
                        analysis,
                        is_cached: None,
                        is_mock: Some(true),
                    });
                }

                record_upload(kind.as_str(), "failed");
                Err(failure.into())
            }
        }
    }

    async fn cached_analysis(
        &self,
        upload: &UploadedContent,
    ) -> Result<Option<serde_json::Value>, ApiError> {
        let cached = self
            .repository
            .find_cached_analysis(&upload.filename, upload.file_size, upload.mode, &upload.id)
            .await?;
        Ok(cached.and_then(|previous| previous.analysis()))
    }

    async fn analyze(
        &self,
        mode: SessionMode,
        staged: &StagedUpload,
        context: &str,
    ) -> Result<serde_json::Value, GatewayError> {
        match mode {
            SessionMode::Video => self.gateway.analyze_video(staged, context).await,
            SessionMode::Problem => self.gateway.analyze_image_problem(staged, context).await,
            SessionMode::Document => self.gateway.analyze_document(staged, context).await,
            SessionMode::Creative => self.gateway.creative_workshop(staged, context).await,
        }
    }

    async fn store_analysis(
        &self,
        upload: &UploadedContent,
        session: &LearningSession,
        analysis: &serde_json::Value,
        is_mock: bool,
    ) -> Result<(), ApiError> {
        let mut record =
            AnalysisRecord::from_analysis(analysis).context("Failed to serialize analysis")?;
        if is_mock {
            record = record.mocked();
        }
        self.repository
            .complete_upload_analysis(&upload.id, &record)
            .await?;

        if session.mode == SessionMode::Document {
            if let Some(map) = ConceptMap::from_analysis(&session.id, analysis) {
                tracing::debug!(
                    "Concept map with {} nodes stored for session {}",
                    map.nodes.len(),
                    session.id
                );
                self.repository.insert_concept_map(&map).await?;
            }
        }
        Ok(())
    }
}
