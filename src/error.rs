use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api {
        status: StatusCode,
        message: String,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn user_friendly_message(&self) -> String {
        match self {
            AppError::Network(e) if e.is_timeout() => {
                "The statistics service took too long to answer.".to_string()
            }
            AppError::Network(_) => "Check your internet connection.".to_string(),
            AppError::Api { status, .. } => match *status {
                StatusCode::NOT_FOUND => "No statistics available for that region.".to_string(),
                StatusCode::TOO_MANY_REQUESTS => {
                    "Too many requests. Please try again later.".to_string()
                }
                StatusCode::SERVICE_UNAVAILABLE => {
                    "Statistics service is currently unavailable.".to_string()
                }
                _ => format!("Server error ({})", status),
            },
            AppError::MalformedResponse(_) => {
                "The statistics service returned unexpected data.".to_string()
            }
            AppError::UnknownRegion(code) => format!("Unknown region \"{}\".", code),
            AppError::Config(msg) => format!("Configuration error: {}", msg),
        }
    }

    /// Whether re-issuing the same request can succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Network(_) | AppError::MalformedResponse(_) => true,
            AppError::Api { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            AppError::UnknownRegion(_) | AppError::Config(_) => false,
        }
    }
}
