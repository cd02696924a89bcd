//! Prometheus counters and structured logging for the Fuse pool indexer.
//!
//! - Structured JSON logging with tracing (pretty output in development)
//! - Counters for processed / skipped events, reverted contract calls,
//!   created entities and price fallbacks

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
