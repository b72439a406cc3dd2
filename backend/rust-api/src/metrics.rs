use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, Encoder, HistogramVec,
    IntCounterVec, IntGauge, TextEncoder,
};

use crate::services::gemini::GatewayError;

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .unwrap();

    // Database Metrics (MongoDB)
    pub static ref DB_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "db_operations_total",
        "Total number of database operations",
        &["operation", "collection", "status"]
    )
    .unwrap();

    pub static ref DB_OPERATION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "db_operation_duration_seconds",
        "Database operation duration in seconds",
        &["operation", "collection"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .unwrap();

    // AI provider
    pub static ref AI_CALLS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "ai_calls_total",
        "Total number of AI gateway calls",
        &["operation", "outcome"]
    )
    .unwrap();

    pub static ref AI_CALL_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "ai_call_duration_seconds",
        "AI gateway call duration in seconds",
        &["operation"],
        vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]
    )
    .unwrap();

    // Business Metrics
    pub static ref UPLOADS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "uploads_total",
        "Total number of uploads by content kind and outcome",
        &["kind", "outcome"]
    )
    .unwrap();

    pub static ref MOCK_RESPONSES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "mock_responses_total",
        "Total number of demo responses served instead of model output",
        &["operation"]
    )
    .unwrap();

    pub static ref CHAT_SESSIONS_ACTIVE: IntGauge = register_int_gauge!(
        "chat_sessions_active",
        "Number of cached chat handles"
    )
    .unwrap();

    pub static ref SESSIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "learning_sessions_total",
        "Total number of learning session lifecycle events",
        &["event", "mode"]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

/// Helper: track database operation with metrics
pub async fn track_db_operation<F, T>(
    operation: &str,
    collection: &str,
    future: F,
) -> Result<T, anyhow::Error>
where
    F: std::future::Future<Output = Result<T, anyhow::Error>>,
{
    let start = std::time::Instant::now();
    let result = future.await;
    let duration = start.elapsed().as_secs_f64();

    let status = if result.is_ok() { "success" } else { "error" };

    DB_OPERATIONS_TOTAL
        .with_label_values(&[operation, collection, status])
        .inc();

    DB_OPERATION_DURATION_SECONDS
        .with_label_values(&[operation, collection])
        .observe(duration);

    result
}

fn error_outcome(err: &GatewayError) -> &'static str {
    match err {
        GatewayError::NotConfigured => "not_configured",
        GatewayError::NoActiveSession => "no_session",
        GatewayError::Api { .. } => "api_error",
        GatewayError::Transport(_) => "transport_error",
        GatewayError::FileProcessing(_) => "file_failed",
        GatewayError::Timeout(_) => "timeout",
        GatewayError::InvalidResponse(_) => "invalid_response",
        GatewayError::Staging(_) => "staging_error",
    }
}

/// Helper: track an AI gateway call with metrics
pub async fn track_ai_call<F, T>(operation: &str, future: F) -> Result<T, GatewayError>
where
    F: std::future::Future<Output = Result<T, GatewayError>>,
{
    let start = std::time::Instant::now();
    let result = future.await;
    let duration = start.elapsed().as_secs_f64();

    let outcome = match &result {
        Ok(_) => "success",
        Err(err) => error_outcome(err),
    };

    AI_CALLS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();

    AI_CALL_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration);

    result
}

pub fn record_upload(kind: &str, outcome: &str) {
    UPLOADS_TOTAL.with_label_values(&[kind, outcome]).inc();
}

pub fn record_mock(operation: &str) {
    MOCK_RESPONSES_TOTAL.with_label_values(&[operation]).inc();
}

pub fn record_session_event(event: &str, mode: &str) {
    SESSIONS_TOTAL.with_label_values(&[event, mode]).inc();
}
