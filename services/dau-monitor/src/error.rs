//! Error types for the DAU monitor service

/// Errors that can occur in the DAU monitor service
#[derive(Debug, thiserror::Error)]
pub enum DauMonitorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("timeout")]
    Timeout,

    #[error("Failed to fetch DAU (status {status}): {body}")]
    Remote { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for DAU monitor operations
pub type Result<T> = std::result::Result<T, DauMonitorError>;
