//! Client error types

use rentdesk_core::reports::ReportError;
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Base URL could not be parsed
    #[error("Invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Response body did not match the expected report shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request rejected by the server
    #[error("Validation error: {0}")]
    Validation(String),

    /// Any other non-success status
    #[error("Server error ({status}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

impl From<ClientError> for ReportError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Unauthorized => Self::Unauthorized,
            ClientError::Forbidden(msg) => Self::Forbidden(msg),
            ClientError::NotFound(msg) => Self::NotFound(msg),
            ClientError::Validation(msg) => Self::Validation(vec![msg]),
            ClientError::Status { status, message } => Self::Upstream { status, message },
            ClientError::Http(e) => Self::Client(e.to_string()),
            ClientError::InvalidUrl(e) => Self::Client(e.to_string()),
            ClientError::InvalidResponse(msg) => Self::Client(msg),
        }
    }
}
