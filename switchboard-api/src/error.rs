//! Error types for remote gateway calls.

use thiserror::Error;

/// Result type for remote calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors a remote call can end with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never got a response (network down, connection reset).
    #[error("transport error: {0}")]
    Transport(String),

    /// The gateway answered with an error.
    #[error("{message}")]
    Remote {
        message: String,
        cause: Option<String>,
    },

    /// The response could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The addressed resource does not exist on the gateway.
    #[error("not found: {0}")]
    NotFound(String),

    /// Timeout.
    #[error("operation timed out")]
    Timeout,
}

impl ApiError {
    /// Shorthand for a remote rejection without a cause.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
            cause: None,
        }
    }

    /// The human-readable message of this error.
    pub fn message(&self) -> String {
        match self {
            Self::Remote { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// The underlying cause reported by the gateway, if any.
    pub fn cause(&self) -> Option<&str> {
        match self {
            Self::Remote { cause, .. } => cause.as_deref(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        Self::Malformed(error.to_string())
    }
}
