//! Core types for the Fuse pool indexer.
//!
//! This crate provides the types shared by every reconciliation component:
//! - `Market`, `Pool`, `Account` and the per-account / per-admin stats entities
//! - `ChainEvent` / `EventMeta`: the inbound events and their chain metadata
//! - Fixed-point helpers converting on-chain mantissas into `Decimal`
//! - Identifier helpers for the composite entity ids

pub mod decimal;
pub mod entity;
pub mod error;
pub mod event;
pub mod ids;

pub use decimal::{
    annualize, from_mantissa, mantissa_to_decimal, rate_to_apr, rate_to_apy, scale_factor,
    truncate, BLOCKS_PER_DAY, BLOCKS_PER_YEAR, DAYS_PER_YEAR, MANTISSA_DECIMALS,
    MARKET_TOKEN_DECIMALS,
};
pub use entity::{
    Account, AccountMarketPosition, Entity, EntityKind, Market, Pool, PoolAdminStats,
    PoolAdminTransaction, PositionTransaction, StoredEntity,
};
pub use error::{CoreError, Result};
pub use event::{ChainEvent, EventMeta, EventRecord};
pub use ids::{address_id, log_entry_id, parse_address, pool_admin_id, position_id, tx_hash_id};
