//! Maps gateway failures to user-facing categories and HTTP statuses.

use axum::http::StatusCode;

use crate::services::gemini::GatewayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    QuotaExhausted,
    ModelOverloaded,
    InvalidCredentials,
    UpstreamTimeout,
    Other,
}

impl FailureCategory {
    pub fn status(self) -> StatusCode {
        match self {
            FailureCategory::QuotaExhausted => StatusCode::TOO_MANY_REQUESTS,
            FailureCategory::ModelOverloaded => StatusCode::SERVICE_UNAVAILABLE,
            FailureCategory::InvalidCredentials => StatusCode::UNAUTHORIZED,
            FailureCategory::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            FailureCategory::Other => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Quota and overload clear up on their own; everything else does not.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            FailureCategory::QuotaExhausted | FailureCategory::ModelOverloaded
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedFailure {
    pub category: FailureCategory,
    pub status: StatusCode,
    pub message: String,
}

impl ClassifiedFailure {
    fn new(category: FailureCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            status: category.status(),
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.category.is_transient()
    }
}

pub trait FailureClassifier: Send + Sync {
    fn classify(&self, err: &GatewayError) -> ClassifiedFailure;
}

/// Classifier for Gemini errors: structured fields first, message text second.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeminiFailureClassifier;

impl FailureClassifier for GeminiFailureClassifier {
    fn classify(&self, err: &GatewayError) -> ClassifiedFailure {
        if let Some(category) = structured_category(err) {
            return ClassifiedFailure::new(category, canonical_message(category, err));
        }
        classify_message(&err.to_string())
    }
}

fn structured_category(err: &GatewayError) -> Option<FailureCategory> {
    match err {
        GatewayError::Timeout(_) => Some(FailureCategory::UpstreamTimeout),
        GatewayError::Api {
            http_status,
            provider_status,
            reason,
            ..
        } => {
            let provider = provider_status.as_deref().unwrap_or_default();
            if *http_status == 429 || provider == "RESOURCE_EXHAUSTED" {
                Some(FailureCategory::QuotaExhausted)
            } else if *http_status == 503 || provider == "UNAVAILABLE" {
                Some(FailureCategory::ModelOverloaded)
            } else if reason.as_deref() == Some("API_KEY_INVALID") {
                Some(FailureCategory::InvalidCredentials)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn canonical_message(category: FailureCategory, err: &GatewayError) -> String {
    match category {
        FailureCategory::QuotaExhausted => "QUOTA_EXHAUSTED".to_string(),
        FailureCategory::ModelOverloaded => "MODEL_OVERLOADED".to_string(),
        FailureCategory::InvalidCredentials => "INVALID_CREDENTIALS".to_string(),
        FailureCategory::UpstreamTimeout => "UPSTREAM_TIMEOUT".to_string(),
        FailureCategory::Other => err.to_string(),
    }
}

/// Substring rules over the raw error text. First match wins.
pub fn classify_message(text: &str) -> ClassifiedFailure {
    if text.contains("429") || text.contains("RESOURCE_EXHAUSTED") {
        ClassifiedFailure::new(FailureCategory::QuotaExhausted, "QUOTA_EXHAUSTED")
    } else if text.contains("503")
        || text.to_lowercase().contains("overloaded")
        || text.contains("UNAVAILABLE")
    {
        ClassifiedFailure::new(FailureCategory::ModelOverloaded, "MODEL_OVERLOADED")
    } else if text.contains("API_KEY_INVALID") {
        ClassifiedFailure::new(FailureCategory::InvalidCredentials, "INVALID_CREDENTIALS")
    } else {
        ClassifiedFailure::new(FailureCategory::Other, text)
    }
}
