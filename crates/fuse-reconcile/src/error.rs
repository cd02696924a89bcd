//! Reconciliation error types.
//!
//! Reconciling an event never fails; these only cover construction.

use fuse_oracle::OracleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Oracle configuration error: {0}")]
    Oracle(#[from] OracleError),
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;
