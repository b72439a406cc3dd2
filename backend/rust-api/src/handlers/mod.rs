use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::json;
use std::sync::Arc;

use crate::metrics;
use crate::services::AppState;

pub mod learning;
pub mod practice;
pub mod sessions;

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut dependencies = serde_json::Map::new();

    let storage_healthy = match state.repository.ping().await {
        Ok(()) => {
            dependencies.insert(
                "storage".to_string(),
                json!({"status": "healthy", "backend": format!("{:?}", state.config.storage_backend).to_lowercase()}),
            );
            true
        }
        Err(e) => {
            dependencies.insert(
                "storage".to_string(),
                json!({"status": "unhealthy", "error": format!("{:#}", e)}),
            );
            false
        }
    };

    let ai_configured = state.gateway.is_configured();
    dependencies.insert(
        "ai".to_string(),
        json!({
            "status": if ai_configured { "configured" } else { "not_configured" },
            "model": state.config.gemini.model,
        }),
    );

    let (status_code, status) = match (storage_healthy, ai_configured) {
        (false, _) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
        (true, false) => (StatusCode::OK, "degraded"),
        (true, true) => (StatusCode::OK, "healthy"),
    };

    (
        status_code,
        Json(json!({
            "status": status,
            "service": "neuralsync-api",
            "version": env!("CARGO_PKG_VERSION"),
            "dependencies": dependencies
        })),
    )
}

pub async fn metrics_handler() -> impl IntoResponse {
    match metrics::render_metrics() {
        Ok(metrics_text) => (StatusCode::OK, metrics_text),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render metrics: {}", e),
        ),
    }
}

/// Protects `/metrics` with HTTP Basic auth against `METRICS_AUTH` (`user:password`).
/// Every request is refused while `METRICS_AUTH` is unset.
pub async fn metrics_auth_middleware(
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let expected = std::env::var("METRICS_AUTH").map_err(|_| {
        tracing::warn!("METRICS_AUTH is not set; refusing /metrics");
        StatusCode::UNAUTHORIZED
    })?;

    let encoded = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let decoded = general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|_| StatusCode::UNAUTHORIZED)?;
    let credentials = String::from_utf8(decoded).map_err(|_| StatusCode::UNAUTHORIZED)?;

    if credentials != expected {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}
