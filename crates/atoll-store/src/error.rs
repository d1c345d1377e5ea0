//! Store error types.

use atoll_core::RegionId;
use thiserror::Error;

/// Store error type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// No record for the requested region.
    #[error("region not found: {0}")]
    NotFound(RegionId),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
