//! Error types for the sync layer.

use switchboard_api::ApiError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while loading or applying remote state.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Fetching the remote list failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A pushed event could not be decoded.
    #[error("malformed event: {0}")]
    Serialization(#[from] serde_json::Error),
}
