use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use services::AppState;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let cors = cors_layer(&app_state.config.cors_allowed_origins);
    let body_limit = app_state.config.uploads.max_bytes;

    Router::new()
        .route("/health", get(handlers::health_check))
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler)
                .layer(middleware::from_fn(handlers::metrics_auth_middleware)),
        )
        .nest("/api", api_routes())
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(middleware::from_fn(
            middlewares::trace::trace_context_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Sessions
        .route("/session/create/", post(handlers::sessions::create_session))
        .route(
            "/session/{id}/stats/",
            get(handlers::sessions::get_session_stats),
        )
        .route(
            "/session/{id}/complete/",
            post(handlers::sessions::complete_session),
        )
        .route("/session/{id}/", delete(handlers::sessions::delete_session))
        // Learning loop
        .route("/upload/", post(handlers::learning::upload_content))
        .route("/ask/", post(handlers::learning::ask_question))
        .route("/answer/", post(handlers::learning::submit_answer))
        .route("/hint/", post(handlers::learning::request_hint))
        .route("/first-question/", post(handlers::learning::first_question))
        // Practice and progress
        .route(
            "/practice/generate/",
            post(handlers::practice::generate_practice),
        )
        .route("/progress/{user_id}/", get(handlers::practice::get_progress))
        .route(
            "/progress/{user_id}/recommendation/",
            post(handlers::practice::recommend_difficulty),
        )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        return cors.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(allowed))
}
