//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Chain state error: {0}")]
    Chain(#[from] fuse_chain::ChainError),

    #[error("Reconcile error: {0}")]
    Reconcile(#[from] fuse_reconcile::ReconcileError),

    #[error("Store error: {0}")]
    Store(#[from] fuse_store::StoreError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] fuse_telemetry::TelemetryError),

    #[error("Malformed event at line {line}: {reason}")]
    EventLog { line: usize, reason: String },

    #[error("Event at block {block} log {log_index} arrived after block {prev_block} log {prev_log_index}")]
    OutOfOrder {
        block: u64,
        log_index: u64,
        prev_block: u64,
        prev_log_index: u64,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
