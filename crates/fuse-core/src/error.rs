//! Error types for fuse-core.

use rust_decimal::Decimal;
use thiserror::Error;

/// Core error types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("Negative scale: {0}")]
    NegativeScale(i32),

    #[error("Scale out of range: {0} (max 28)")]
    ScaleOutOfRange(i32),

    #[error("Negative rate: {0}")]
    NegativeRate(Decimal),

    #[error("Decimal overflow: {0}")]
    Overflow(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
