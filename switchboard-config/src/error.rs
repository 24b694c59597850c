//! Error types for configuration trees.

use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while building, populating or editing a [`crate::ConfigTree`].
///
/// A payload that does not structurally match the schema the tree was built
/// from is a caller bug; it is reported here instead of being silently
/// ignored.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The payload names a field the schema never declared.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// The payload value for a field has the wrong JSON shape.
    #[error("field '{field}' expects {expected}")]
    ShapeMismatch {
        field: String,
        expected: &'static str,
    },

    /// A nested enum (or an explicit selection) names a choice that does not exist.
    #[error("'{choice}' is not a choice of field '{field}'")]
    UnknownChoice { field: String, choice: String },

    /// The schema description itself is malformed.
    #[error("invalid schema for field '{field}': {reason}")]
    InvalidSchema { field: String, reason: String },

    /// A repeat-group operation was attempted on a field that does not repeat.
    #[error("field '{0}' is not a repeated section")]
    NotRepeated(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn shape(field: &str, expected: &'static str) -> Self {
        Self::ShapeMismatch {
            field: field.to_string(),
            expected,
        }
    }

    pub(crate) fn invalid_schema(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSchema {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
