use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::{
    error::ApiError,
    extractors::AppJson,
    models::{CreateSessionRequest, SessionStatsResponse},
    services::{session_service::SessionService, AppState},
};

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(
        "Creating {} session for user_id={:?}",
        req.mode,
        req.user_id
    );

    let response = SessionService::new(&state).create_session(req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn get_session_stats(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Getting stats of session: {}", session_id);

    let stats = SessionService::new(&state).get_stats(&session_id).await?;
    Ok(Json(SessionStatsResponse {
        success: true,
        stats,
    }))
}

pub async fn complete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Completing session: {}", session_id);

    let stats = SessionService::new(&state)
        .complete_session(&session_id)
        .await?;
    Ok(Json(SessionStatsResponse {
        success: true,
        stats,
    }))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Deleting session: {}", session_id);

    SessionService::new(&state)
        .delete_session(&session_id)
        .await?;
    Ok(Json(json!({ "success": true })))
}
