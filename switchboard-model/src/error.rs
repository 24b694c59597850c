//! Error types for domain entities.

use switchboard_api::ApiError;
use switchboard_config::ConfigError;
use thiserror::Error;

/// Result type for entity operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised by entity population and mutation.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A record was handed to the wrong entity, or carries no key at all.
    #[error("invalid record for {key}: {reason}")]
    InvalidRecord { key: String, reason: String },

    /// `fill_data` named an alternate mapping the entity does not have.
    #[error("unknown mapping: {0}")]
    UnknownMapping(String),

    /// The mutation makes no sense for this entity (e.g. dimming a relay).
    #[error("invalid mutation: {0}")]
    InvalidMutation(String),

    /// The app's configuration schema has not been fetched yet.
    #[error("configuration of app '{0}' is not initialized")]
    ConfigNotInitialized(String),

    /// A remote call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The configuration tree rejected a schema or payload.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ModelError {
    pub(crate) fn invalid_record(key: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
