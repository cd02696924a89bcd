//! Pool Reconciler.
//!
//! Pools are created from the directory's registration event and resynced
//! from the controller on governance events. A resync only writes when an
//! on-chain value actually changed.

use crate::convert::{count, scaled};
use alloy::primitives::Address;
use fuse_chain::bindings::IComptroller;
use fuse_chain::{BlockView, CallResult, ChainReader};
use fuse_core::{address_id, Entity, Pool, MANTISSA_DECIMALS};
use fuse_store::EntityStore;
use fuse_telemetry::Metrics;
use tracing::{debug, info, warn};

/// Registration details carried by the pool directory event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolRegistration {
    pub comptroller: Address,
    pub index: u64,
    pub name: String,
    pub creator: Address,
    pub block_posted: u64,
    pub timestamp_posted: u64,
}

pub struct PoolReconciler<'a> {
    chain: &'a dyn ChainReader,
}

impl<'a> PoolReconciler<'a> {
    pub fn new(chain: &'a dyn ChainReader) -> Self {
        Self { chain }
    }

    /// Build a new `Pool` from its registration and the controller's live
    /// state at `block`. Not persisted.
    pub fn create_pool(&self, registration: &PoolRegistration, block: u64) -> Pool {
        let pool = Pool::blank(&address_id(&registration.comptroller));
        self.register(pool, registration, block)
    }

    /// Complete a pool stored before its registration (a controller emits
    /// `NewPriceOracle` first). Fields whose controller read reverts keep
    /// the stored value. Not persisted.
    pub fn register_existing(
        &self,
        existing: Pool,
        registration: &PoolRegistration,
        block: u64,
    ) -> Pool {
        self.register(existing, registration, block)
    }

    fn register(&self, mut pool: Pool, registration: &PoolRegistration, block: u64) -> Pool {
        let view = BlockView::new(self.chain, block);
        pool.name = registration.name.clone();
        pool.creator = address_id(&registration.creator);
        pool.index = registration.index;
        pool.block_posted = registration.block_posted;
        pool.timestamp_posted = registration.timestamp_posted;

        // Unset addresses fall back to zero; numeric fields already do.
        if pool.admin.is_empty() {
            pool.admin = address_id(&Address::ZERO);
        }
        if pool.price_oracle.is_empty() {
            pool.price_oracle = address_id(&Address::ZERO);
        }
        apply_controller_state(&view, registration.comptroller, &mut pool);

        Metrics::entity_created(Pool::KIND.as_str());
        info!(
            pool = %pool.id,
            name = %pool.name,
            index = pool.index,
            markets = pool.markets.len(),
            "Registered pool"
        );
        pool
    }

    /// Resync a stored pool at `block`. Returns `None` when the pool is
    /// unknown. Reverted reads keep the stored value; nothing is saved
    /// when no value changed.
    pub fn update_pool<S: EntityStore>(
        &self,
        store: &mut S,
        comptroller: Address,
        block: u64,
    ) -> Option<Pool> {
        let id = address_id(&comptroller);
        let Some(stored) = store.load::<Pool>(&id) else {
            debug!(pool = %id, block, "Update requested for unknown pool");
            return None;
        };

        let mut pool = stored.clone();
        apply_controller_state(&BlockView::new(self.chain, block), comptroller, &mut pool);

        if pool != stored {
            debug!(pool = %id, block, "Pool state changed");
            store.save(pool.clone());
        }
        Some(pool)
    }
}

/// Overwrite `pool`'s governance fields with the controller's values,
/// leaving any field whose read reverted untouched.
fn apply_controller_state(view: &BlockView<'_>, comptroller: Address, pool: &mut Pool) {
    if let Some(r) = keep_on_revert(view.call(comptroller, &IComptroller::adminCall {}), "admin") {
        pool.admin = address_id(&r._0);
    }
    if let Some(r) = keep_on_revert(view.call(comptroller, &IComptroller::oracleCall {}), "oracle") {
        pool.price_oracle = address_id(&r._0);
    }
    if let Some(r) = keep_on_revert(
        view.call(comptroller, &IComptroller::closeFactorMantissaCall {}),
        "closeFactorMantissa",
    ) {
        pool.close_factor = scaled(r._0, MANTISSA_DECIMALS, MANTISSA_DECIMALS);
    }
    if let Some(r) = keep_on_revert(
        view.call(comptroller, &IComptroller::liquidationIncentiveMantissaCall {}),
        "liquidationIncentiveMantissa",
    ) {
        pool.liquidation_incentive = scaled(r._0, MANTISSA_DECIMALS, MANTISSA_DECIMALS);
    }
    if let Some(r) = keep_on_revert(view.call(comptroller, &IComptroller::maxAssetsCall {}), "maxAssets") {
        pool.max_assets = count(r._0);
    }
    if let Some(r) = keep_on_revert(
        view.call(comptroller, &IComptroller::getAllMarketsCall {}),
        "getAllMarkets",
    ) {
        let live: Vec<String> = r._0.iter().map(address_id).collect();
        // Markets listed by event but missing from the live list stay members.
        let mut markets = live;
        for known in &pool.markets {
            if !markets.contains(known) {
                markets.push(known.clone());
            }
        }
        pool.markets = markets;
    }
}

fn keep_on_revert<T>(result: CallResult<T>, field: &'static str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(field, "Controller read reverted, keeping stored value");
            None
        }
    }
}
