use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::{
    error::ApiError,
    extractors::ValidatedJson,
    models::practice::{GeneratePracticeRequest, GeneratePracticeResponse},
    services::{practice_service::PracticeService, AppState},
};

pub async fn generate_practice(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<GeneratePracticeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(
        "Generating {} practice problems about {}",
        req.count,
        req.topic
    );

    let problems = PracticeService::new(&state).generate_problems(&req).await?;
    Ok(Json(GeneratePracticeResponse {
        success: true,
        problems,
    }))
}

pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let progress = PracticeService::new(&state).get_progress(&user_id).await?;
    Ok(Json(json!({ "success": true, "progress": progress })))
}

pub async fn recommend_difficulty(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Difficulty recommendation for user: {}", user_id);

    let recommendation = PracticeService::new(&state)
        .recommend_difficulty(&user_id)
        .await?;
    Ok(Json(json!({ "success": true, "recommendation": recommendation })))
}
