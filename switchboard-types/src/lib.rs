//! Core type definitions for Switchboard.
//!
//! This crate defines the small, domain-agnostic types shared by every other
//! crate in the workspace:
//! - [`EntityKey`]: the primary key used to match mirrored entities against
//!   remote records (numeric `id` or textual `name`)
//! - [`RecordPath`]: a dotted path into a JSON-shaped remote record
//!
//! Device-specific types (outputs, inputs, apps, ...) live in
//! `switchboard-model`, not here.

mod ids;
mod path;

pub use ids::EntityKey;
pub use path::RecordPath;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid entity key: {0}")]
    InvalidKey(String),

    #[error("invalid record path: {0:?}")]
    InvalidPath(String),
}
