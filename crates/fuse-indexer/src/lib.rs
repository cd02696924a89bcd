//! Fuse pool indexer.
//!
//! Replays a JSON Lines event log against recorded chain state and writes
//! the reconciled entities as a JSON Lines snapshot:
//! - `config`: TOML configuration with environment overrides
//! - `app`: the replay loop and ordering check

pub mod app;
pub mod config;
pub mod error;

pub use app::{metrics_report, read_event_log, Indexer, ReplaySummary};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
