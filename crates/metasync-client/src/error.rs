//! Error types for the HTTP collaborators.

use metasync_core::catalog::CatalogError;
use metasync_core::enrich::GenerateError;

/// Errors that can occur when talking to the remote services.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP transport error (connection, DNS, TLS, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Failure inside the retry middleware stack
    #[error("HTTP request error: {0}")]
    HttpMiddleware(#[from] reqwest_middleware::Error),

    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authentication failed (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Permission denied (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Rate limited (429), retries exhausted
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Server error (5xx)
    #[error("Server error ({status}): {message}")]
    ServerError {
        /// HTTP status code
        status: u16,
        /// Error message from the server
        message: String,
    },

    /// Response did not match the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Returns true if this error is worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::RateLimited(_) => true,
            ClientError::ServerError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<ClientError> for CatalogError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::NotFound(m) => CatalogError::NotFound(m),
            ClientError::Unauthorized(m) | ClientError::Forbidden(m) => {
                CatalogError::Unauthorized(m)
            }
            ClientError::InvalidResponse(m) => CatalogError::InvalidResponse(m),
            ClientError::Serialization(e) => CatalogError::InvalidResponse(e.to_string()),
            other => CatalogError::Request(other.to_string()),
        }
    }
}

impl From<ClientError> for GenerateError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::InvalidResponse(m) => GenerateError::InvalidResponse(m),
            ClientError::Serialization(e) => GenerateError::InvalidResponse(e.to_string()),
            other => GenerateError::Request(other.to_string()),
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
