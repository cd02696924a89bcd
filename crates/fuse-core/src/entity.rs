//! Persisted aggregate records.
//!
//! Every entity is owned by the entity store and keyed by a string id.
//! Addresses are stored as lowercase hex ids (see `ids::address_id`),
//! normalized values as `Decimal`, block heights and timestamps as `u64`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity type discriminant, used as the first half of a store key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Market,
    Pool,
    Account,
    AccountMarketPosition,
    PoolAdminStats,
    PositionTransaction,
    PoolAdminTransaction,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Market => "market",
            Self::Pool => "pool",
            Self::Account => "account",
            Self::AccountMarketPosition => "account_market_position",
            Self::PoolAdminStats => "pool_admin_stats",
            Self::PositionTransaction => "position_transaction",
            Self::PoolAdminTransaction => "pool_admin_transaction",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lending market (one per market-token contract).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub id: String,
    pub name: String,
    pub symbol: String,

    pub underlying_address: String,
    pub underlying_name: String,
    pub underlying_symbol: String,
    pub underlying_decimals: u32,
    /// Underlying price in the base asset.
    pub underlying_price: Decimal,
    pub underlying_price_usd: Decimal,

    pub collateral_factor: Decimal,
    pub reserve_factor: Decimal,
    pub interest_rate_model_address: String,

    pub cash: Decimal,
    pub reserves: Decimal,
    pub total_borrows: Decimal,
    /// Market-token supply (8 decimals).
    pub total_supply: Decimal,
    pub total_borrows_usd: Decimal,
    pub total_supply_usd: Decimal,

    pub exchange_rate: Decimal,
    pub borrow_index: Decimal,

    /// Per-year borrow rate.
    pub borrow_rate: Decimal,
    pub borrow_rate_apr: Decimal,
    pub borrow_rate_apy: Decimal,
    /// Per-year supply rate.
    pub supply_rate: Decimal,
    pub supply_rate_apr: Decimal,
    pub supply_rate_apy: Decimal,

    /// Idempotence key: last block this market was reconciled at.
    pub accrual_block_number: u64,
    pub block_timestamp: u64,

    /// Owning pool (controller address id).
    pub pool: String,
}

/// Isolated lending pool (one per controller contract).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id: String,
    pub name: String,
    pub creator: String,
    pub admin: String,
    pub price_oracle: String,
    pub close_factor: Decimal,
    pub liquidation_incentive: Decimal,
    pub max_assets: u64,
    /// Member market ids in listing order.
    pub markets: Vec<String>,
    /// Registration index in the pool directory.
    pub index: u64,
    pub block_posted: u64,
    pub timestamp_posted: u64,
}

impl Pool {
    /// Append a market id unless it is already a member.
    pub fn add_market(&mut self, market_id: &str) -> bool {
        if self.markets.iter().any(|m| m == market_id) {
            return false;
        }
        self.markets.push(market_id.to_string());
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub count_liquidated: u32,
    pub count_liquidator: u32,
    pub has_borrowed: bool,
}

/// Per (market, account) running record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMarketPosition {
    pub id: String,
    pub market: String,
    pub account: String,
    pub symbol: String,
    pub accrual_block_number: u64,
    pub entered_market: bool,
    pub token_balance: Decimal,
    pub total_underlying_supplied: Decimal,
    pub total_underlying_redeemed: Decimal,
    pub total_underlying_borrowed: Decimal,
    pub total_underlying_repaid: Decimal,
    pub account_borrow_index: Decimal,
    pub stored_borrow_balance: Decimal,
}

/// Per (pool, admin) snapshot of governance parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolAdminStats {
    pub id: String,
    pub pool: String,
    pub admin: String,
    pub accrual_block_number: u64,
    pub price_oracle: String,
    pub close_factor: Decimal,
    pub liquidation_incentive: Decimal,
    pub max_assets: u64,
}

/// Audit-log entry for an `AccountMarketPosition`. Write-once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionTransaction {
    pub id: String,
    pub position: String,
    pub tx_hash: String,
    pub timestamp: u64,
    pub block: u64,
    pub log_index: u64,
}

/// Audit-log entry for a `PoolAdminStats`. Write-once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolAdminTransaction {
    pub id: String,
    pub pool_admin: String,
    pub tx_hash: String,
    pub timestamp: u64,
    pub block: u64,
    pub log_index: u64,
}

/// Any stored entity. The store keeps values in this form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum StoredEntity {
    Market(Market),
    Pool(Pool),
    Account(Account),
    AccountMarketPosition(AccountMarketPosition),
    PoolAdminStats(PoolAdminStats),
    PositionTransaction(PositionTransaction),
    PoolAdminTransaction(PoolAdminTransaction),
}

impl StoredEntity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Market(_) => EntityKind::Market,
            Self::Pool(_) => EntityKind::Pool,
            Self::Account(_) => EntityKind::Account,
            Self::AccountMarketPosition(_) => EntityKind::AccountMarketPosition,
            Self::PoolAdminStats(_) => EntityKind::PoolAdminStats,
            Self::PositionTransaction(_) => EntityKind::PositionTransaction,
            Self::PoolAdminTransaction(_) => EntityKind::PoolAdminTransaction,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Market(e) => &e.id,
            Self::Pool(e) => &e.id,
            Self::Account(e) => &e.id,
            Self::AccountMarketPosition(e) => &e.id,
            Self::PoolAdminStats(e) => &e.id,
            Self::PositionTransaction(e) => &e.id,
            Self::PoolAdminTransaction(e) => &e.id,
        }
    }
}

/// A typed record the entity store can hold.
pub trait Entity: Clone + Sized {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    /// Fresh record with every field at its zero value.
    fn blank(id: &str) -> Self;

    fn into_stored(self) -> StoredEntity;

    fn from_stored(stored: &StoredEntity) -> Option<&Self>;
}

macro_rules! impl_entity {
    ($ty:ident) => {
        impl Entity for $ty {
            const KIND: EntityKind = EntityKind::$ty;

            fn id(&self) -> &str {
                &self.id
            }

            fn blank(id: &str) -> Self {
                Self {
                    id: id.to_string(),
                    ..Default::default()
                }
            }

            fn into_stored(self) -> StoredEntity {
                StoredEntity::$ty(self)
            }

            fn from_stored(stored: &StoredEntity) -> Option<&Self> {
                match stored {
                    StoredEntity::$ty(entity) => Some(entity),
                    _ => None,
                }
            }
        }
    };
}

impl_entity!(Market);
impl_entity!(Pool);
impl_entity!(Account);
impl_entity!(AccountMarketPosition);
impl_entity!(PoolAdminStats);
impl_entity!(PositionTransaction);
impl_entity!(PoolAdminTransaction);
