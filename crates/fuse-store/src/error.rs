//! Store error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed snapshot line {line}: {reason}")]
    Snapshot { line: usize, reason: String },
}

pub type StoreResult<T> = Result<T, StoreError>;
