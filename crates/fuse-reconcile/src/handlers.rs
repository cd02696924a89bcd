//! Chain event dispatch.
//!
//! Events referencing a market or pool that was never created are skipped
//! whole; no partial record is written for them.

use crate::convert::scaled;
use crate::error::ReconcileResult;
use crate::market::MarketReconciler;
use crate::pool::{PoolReconciler, PoolRegistration};
use crate::stats::{get_or_create_account, mirror_pool, record_pool_admin_change, record_position_change};
use alloy::primitives::{Address, U256};
use fuse_chain::ChainReader;
use fuse_core::{address_id, ChainEvent, EventMeta, EventRecord, Market, Pool, MANTISSA_DECIMALS};
use fuse_oracle::ProtocolConfig;
use fuse_store::EntityStore;
use fuse_telemetry::Metrics;
use rust_decimal::Decimal;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UnknownMarket,
    UnknownPool,
    AlreadyListed,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownMarket => "unknown_market",
            Self::UnknownPool => "unknown_pool",
            Self::AlreadyListed => "already_listed",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    Applied,
    Skipped(SkipReason),
}

/// A governance parameter carried by a controller event.
enum PoolParam {
    CloseFactor(Decimal),
    LiquidationIncentive(Decimal),
    MaxAssets(u64),
}

pub struct EventHandler<'a> {
    markets: MarketReconciler<'a>,
    pools: PoolReconciler<'a>,
}

impl<'a> EventHandler<'a> {
    pub fn new(chain: &'a dyn ChainReader, config: &'a ProtocolConfig) -> ReconcileResult<Self> {
        Ok(Self {
            markets: MarketReconciler::new(chain, config)?,
            pools: PoolReconciler::new(chain),
        })
    }

    /// Reconcile one event completely.
    pub fn handle<S: EntityStore>(&self, store: &mut S, record: &EventRecord) -> HandleOutcome {
        let meta = &record.meta;
        let outcome = match &record.event {
            ChainEvent::PoolRegistered {
                index,
                comptroller,
                name,
                creator,
                block_posted,
                timestamp_posted,
            } => {
                let registration = PoolRegistration {
                    comptroller: *comptroller,
                    index: *index,
                    name: name.clone(),
                    creator: *creator,
                    block_posted: *block_posted,
                    timestamp_posted: *timestamp_posted,
                };
                self.on_pool_registered(store, &registration, meta)
            }
            ChainEvent::MarketListed { market } => self.on_market_listed(store, *market, meta),
            ChainEvent::MarketEntered { market, account } => {
                self.on_membership(store, *market, *account, true, meta)
            }
            ChainEvent::MarketExited { market, account } => {
                self.on_membership(store, *market, *account, false, meta)
            }
            ChainEvent::NewCloseFactor {
                new_close_factor_mantissa,
            } => self.on_pool_param(store, PoolParam::CloseFactor(factor(*new_close_factor_mantissa)), meta),
            ChainEvent::NewLiquidationIncentive {
                new_liquidation_incentive_mantissa,
            } => self.on_pool_param(
                store,
                PoolParam::LiquidationIncentive(factor(*new_liquidation_incentive_mantissa)),
                meta,
            ),
            ChainEvent::NewMaxAssets { new_max_assets } => {
                self.on_pool_param(store, PoolParam::MaxAssets(*new_max_assets), meta)
            }
            ChainEvent::NewPriceOracle { new_price_oracle } => {
                self.on_new_price_oracle(store, *new_price_oracle, meta)
            }
            ChainEvent::NewCollateralFactor {
                market,
                new_collateral_factor_mantissa,
            } => self.on_collateral_factor(store, *market, *new_collateral_factor_mantissa, meta),
            ChainEvent::AccrueInterest => {
                match self.markets.update_market(store, meta.address, meta.block_number, meta.block_timestamp) {
                    Some(_) => HandleOutcome::Applied,
                    None => HandleOutcome::Skipped(SkipReason::UnknownMarket),
                }
            }
        };

        let event = record.event.name();
        match outcome {
            HandleOutcome::Applied => Metrics::event_processed(event),
            HandleOutcome::Skipped(reason) => {
                debug!(event, %reason, block = meta.block_number, log_index = meta.log_index, "Skipped event");
                Metrics::event_skipped(event, reason.as_str());
            }
        }
        outcome
    }

    fn on_pool_registered<S: EntityStore>(
        &self,
        store: &mut S,
        registration: &PoolRegistration,
        meta: &EventMeta,
    ) -> HandleOutcome {
        // The controller may have announced its oracle before registering.
        let pool = match store.load::<Pool>(&address_id(&registration.comptroller)) {
            Some(existing) => self.pools.register_existing(existing, registration, meta.block_number),
            None => self.pools.create_pool(registration, meta.block_number),
        };
        store.save(pool);
        HandleOutcome::Applied
    }

    fn on_market_listed<S: EntityStore>(
        &self,
        store: &mut S,
        market: Address,
        meta: &EventMeta,
    ) -> HandleOutcome {
        let market_id = address_id(&market);
        if store.contains::<Market>(&market_id) {
            return HandleOutcome::Skipped(SkipReason::AlreadyListed);
        }
        store.save(self.markets.create_market(market, meta));

        if let Some(mut pool) = store.load::<Pool>(&address_id(&meta.address)) {
            if pool.add_market(&market_id) {
                store.save(pool);
            }
        }
        HandleOutcome::Applied
    }

    fn on_membership<S: EntityStore>(
        &self,
        store: &mut S,
        market: Address,
        account: Address,
        entered: bool,
        meta: &EventMeta,
    ) -> HandleOutcome {
        let Some(market) = store.load::<Market>(&address_id(&market)) else {
            return HandleOutcome::Skipped(SkipReason::UnknownMarket);
        };
        let account_id = address_id(&account);
        get_or_create_account(store, &account_id);

        let mut position = record_position_change(store, &market.id, &market.symbol, &account_id, meta);
        position.entered_market = entered;
        store.save(position);
        HandleOutcome::Applied
    }

    fn on_pool_param<S: EntityStore>(
        &self,
        store: &mut S,
        param: PoolParam,
        meta: &EventMeta,
    ) -> HandleOutcome {
        let Some(mut pool) = self.pools.update_pool(store, meta.address, meta.block_number) else {
            return HandleOutcome::Skipped(SkipReason::UnknownPool);
        };
        let mut stats = record_pool_admin_change(store, &pool.id, &pool.id, meta);

        match param {
            PoolParam::CloseFactor(value) => pool.close_factor = value,
            PoolParam::LiquidationIncentive(value) => pool.liquidation_incentive = value,
            PoolParam::MaxAssets(value) => pool.max_assets = value,
        }
        mirror_pool(&mut stats, &pool);

        store.save(pool);
        store.save(stats);
        HandleOutcome::Applied
    }

    fn on_new_price_oracle<S: EntityStore>(
        &self,
        store: &mut S,
        oracle: Address,
        meta: &EventMeta,
    ) -> HandleOutcome {
        let pool_id = address_id(&meta.address);
        let oracle_id = address_id(&oracle);

        let Some(mut pool) = self.pools.update_pool(store, meta.address, meta.block_number) else {
            // First event a controller emits; registration fills in the rest.
            let mut pool: Pool = store.create(&pool_id);
            pool.price_oracle = oracle_id;
            store.save(pool);
            return HandleOutcome::Applied;
        };

        let mut stats = record_pool_admin_change(store, &pool.id, &pool.id, meta);
        pool.price_oracle = oracle_id;
        mirror_pool(&mut stats, &pool);

        store.save(pool);
        store.save(stats);
        HandleOutcome::Applied
    }

    fn on_collateral_factor<S: EntityStore>(
        &self,
        store: &mut S,
        market: Address,
        mantissa: U256,
        meta: &EventMeta,
    ) -> HandleOutcome {
        let Some(mut market) = store.load::<Market>(&address_id(&market)) else {
            return HandleOutcome::Skipped(SkipReason::UnknownMarket);
        };
        market.collateral_factor = factor(mantissa);
        market.pool = address_id(&meta.address);
        store.save(market);
        HandleOutcome::Applied
    }
}

/// An `Exp` mantissa as a decimal factor.
fn factor(mantissa: U256) -> Decimal {
    scaled(mantissa, MANTISSA_DECIMALS, MANTISSA_DECIMALS)
}
