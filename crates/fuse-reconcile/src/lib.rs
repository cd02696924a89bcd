//! State reconciliation for the Fuse pool indexer.
//!
//! Each chain event is reconciled completely before the next one: the
//! handler loads the affected aggregates, re-reads authoritative state from
//! the contracts at the event's block, and saves the merged result.
//!
//! - `market`: create and resync `Market` aggregates (one update per block)
//! - `pool`: create and resync `Pool` aggregates
//! - `stats`: per-position and per-pool-admin stats with a deduplicated log
//! - `handlers`: event dispatch

mod convert;
pub mod error;
pub mod handlers;
pub mod market;
pub mod pool;
pub mod stats;

#[cfg(test)]
pub(crate) mod fixtures;

pub use error::{ReconcileError, ReconcileResult};
pub use handlers::{EventHandler, HandleOutcome, SkipReason};
pub use market::{MarketReconciler, NO_NAME, NO_SYMBOL};
pub use pool::{PoolReconciler, PoolRegistration};
pub use stats::{
    get_or_create_account, get_or_create_pool_admin_stats, get_or_create_position,
    record_pool_admin_change, record_position_change,
};
