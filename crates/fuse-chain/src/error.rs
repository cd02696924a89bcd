//! Chain error types.
//!
//! Reverted calls are not errors; see `reader::Reverted`. These cover
//! loading and decoding recorded chain state.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Invalid hex in {field}: {reason}")]
    InvalidHex { field: &'static str, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ChainResult<T> = Result<T, ChainError>;
