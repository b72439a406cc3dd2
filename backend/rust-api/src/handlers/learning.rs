use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::{
    error::ApiError,
    extractors::{AppJson, ValidatedJson},
    models::{
        answer::SubmitAnswerRequest,
        hint::RequestHintRequest,
        question::{AskQuestionRequest, FirstQuestionRequest},
    },
    services::{
        tutor_service::TutorService,
        upload_service::{IncomingFile, UploadService},
        AppState,
    },
};

pub async fn upload_content(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut file: Option<IncomingFile> = None;
    let mut session_id = String::new();
    let mut context = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e.body_text())))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e.body_text())))?;
                if !filename.is_empty() {
                    file = Some(IncomingFile {
                        filename,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            "session_id" => {
                session_id = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?
                    .trim()
                    .to_string();
            }
            "context" => {
                context = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;
    tracing::info!(
        "Upload of {} ({} bytes) for session {}",
        file.filename,
        file.bytes.len(),
        session_id
    );

    let response = UploadService::new(&state)
        .upload_content(&session_id, file, &context)
        .await?;
    Ok(Json(response))
}

pub async fn ask_question(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<AskQuestionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Question for session: {}", req.session_id);

    let response = TutorService::new(&state).ask_question(req).await?;
    Ok(Json(response))
}

pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Answer submitted for session: {}", req.session_id);

    let response = TutorService::new(&state).submit_answer(req).await?;
    Ok(Json(response))
}

pub async fn request_hint(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RequestHintRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Hint requested for session: {}", req.session_id);

    let response = TutorService::new(&state).request_hint(req).await?;
    Ok(Json(response))
}

pub async fn first_question(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<FirstQuestionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Opening question for session: {}", req.session_id);

    let response = TutorService::new(&state)
        .first_question(&req.session_id)
        .await?;
    Ok(Json(response))
}
