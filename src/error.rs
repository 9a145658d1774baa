use thiserror::Error;

/// Errors produced by the scraping pipeline and the translation layer
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    #[error("JavaScript evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Failed to parse embedded payload: {0}")]
    PayloadParseFailed(String),

    #[error("Not an idus.com product URL: {0}")]
    InvalidUrl(String),

    #[error("Model authorization failed: {0}")]
    ModelAuthFailed(String),

    #[error("Model throttled: {0}")]
    ModelThrottled(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Model request failed: {0}")]
    ModelRequestFailed(String),

    #[error("HTTP request failed: {0}")]
    HttpFailed(String),
}

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, ScrapeError>;

impl ScrapeError {
    /// Map a model-API HTTP status to the matching error variant
    pub fn from_model_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => ScrapeError::ModelAuthFailed(message),
            429 => ScrapeError::ModelThrottled(message),
            404 => ScrapeError::ModelUnavailable(message),
            _ => ScrapeError::ModelRequestFailed(format!("status {}: {}", status, message)),
        }
    }

    /// Whether this error is a throttling signal worth retrying
    pub fn is_throttle(&self) -> bool {
        matches!(self, ScrapeError::ModelThrottled(_))
    }

    /// Whether this error is a hard credential failure
    pub fn is_auth(&self) -> bool {
        matches!(self, ScrapeError::ModelAuthFailed(_))
    }
}
