//! Market Reconciler.
//!
//! `create_market` introspects a newly listed market once; `update_market`
//! re-reads its live state at most once per block.
//!
//! Every contract read is individually fallible:
//! - metadata reads fall back to sentinels (`NO_NAME`, `NO_SYMBOL`, zero address, 0 decimals)
//! - required state reads keep the previously stored value
//! - the supply rate (unsupported on some deployed markets) degrades to zero

use crate::convert::{product, scaled};
use crate::error::ReconcileResult;
use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use fuse_chain::bindings::{ICToken, IERC20};
use fuse_chain::{BlockView, ChainReader};
use fuse_core::{
    address_id, annualize, from_mantissa, parse_address, rate_to_apr, rate_to_apy, truncate,
    Entity, EventMeta, Market, DAYS_PER_YEAR, MANTISSA_DECIMALS, MARKET_TOKEN_DECIMALS,
};
use fuse_oracle::{PriceQuery, PriceResolver, ProtocolConfig};
use fuse_store::EntityStore;
use fuse_telemetry::Metrics;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

/// Recorded when a token's `name()` cannot be read.
pub const NO_NAME: &str = "no name detected";

/// Recorded when a token's `symbol()` cannot be read.
pub const NO_SYMBOL: &str = "NONE";

pub struct MarketReconciler<'a> {
    chain: &'a dyn ChainReader,
    config: &'a ProtocolConfig,
    prices: PriceResolver<'a>,
}

impl<'a> MarketReconciler<'a> {
    pub fn new(chain: &'a dyn ChainReader, config: &'a ProtocolConfig) -> ReconcileResult<Self> {
        Ok(Self {
            chain,
            config,
            prices: PriceResolver::new(config)?,
        })
    }

    /// Build a new `Market` for `market`, listed by the controller that
    /// emitted `listed`. Numeric state starts at zero and the market is
    /// not persisted; the caller saves it.
    pub fn create_market(&self, market: Address, listed: &EventMeta) -> Market {
        let view = BlockView::new(self.chain, listed.block_number);
        let mut m = Market::blank(&address_id(&market));
        m.pool = address_id(&listed.address);

        m.name = read_string(&view, market, ICToken::nameCall {}, |r| r._0, NO_NAME);
        m.symbol = read_string(&view, market, ICToken::symbolCall {}, |r| r._0, NO_SYMBOL);
        m.interest_rate_model_address = address_id(
            &view
                .call(market, &ICToken::interestRateModelCall {})
                .map(|r| r._0)
                .unwrap_or(Address::ZERO),
        );
        m.reserve_factor = view
            .call(market, &ICToken::reserveFactorMantissaCall {})
            .map(|r| scaled(r._0, MANTISSA_DECIMALS, MANTISSA_DECIMALS))
            .unwrap_or(Decimal::ZERO);

        if self.config.is_base_market(&market) {
            let base = &self.config.base_asset;
            m.underlying_address = address_id(&base.underlying);
            m.underlying_name = base.name.clone();
            m.underlying_symbol = base.symbol.clone();
            m.underlying_decimals = base.decimals;
            m.underlying_price = Decimal::ONE;
        } else {
            let underlying = match view.call(market, &ICToken::underlyingCall {}) {
                Ok(r) => r._0,
                Err(_) => {
                    warn!(market = %market, "underlying() reverted, recording zero address");
                    Address::ZERO
                }
            };
            self.introspect_underlying(&view, underlying, &mut m);
            if self.config.is_usd_reference_market(&market) {
                m.underlying_price_usd = Decimal::ONE;
            }
        }

        Metrics::entity_created(Market::KIND.as_str());
        info!(
            market = %m.id,
            pool = %m.pool,
            symbol = %m.symbol,
            underlying = %m.underlying_symbol,
            decimals = m.underlying_decimals,
            "Created market"
        );
        m
    }

    fn introspect_underlying(&self, view: &BlockView<'_>, token: Address, m: &mut Market) {
        m.underlying_address = address_id(&token);
        m.underlying_decimals = match view.call(token, &IERC20::decimalsCall {}) {
            Ok(r) => u32::from(r._0),
            Err(_) => {
                warn!(token = %token, "decimals() reverted, recording 0");
                0
            }
        };

        if let Some(fixed) = self.config.token_override(&token) {
            m.underlying_name = fixed.name.clone();
            m.underlying_symbol = fixed.symbol.clone();
        } else {
            m.underlying_name = read_string(view, token, IERC20::nameCall {}, |r| r._0, NO_NAME);
            m.underlying_symbol =
                read_string(view, token, IERC20::symbolCall {}, |r| r._0, NO_SYMBOL);
        }
    }

    /// Resync a stored market at `block`.
    ///
    /// Returns `None` when the market is unknown. When the market was
    /// already reconciled at `block` it is returned unchanged.
    pub fn update_market<S: EntityStore>(
        &self,
        store: &mut S,
        market: Address,
        block: u64,
        timestamp: u64,
    ) -> Option<Market> {
        let id = address_id(&market);
        let Some(mut m) = store.load::<Market>(&id) else {
            debug!(market = %id, block, "Update requested for unknown market");
            return None;
        };

        if m.accrual_block_number == block {
            debug!(market = %id, block, "Market already current");
            Metrics::market_update(false);
            return Some(m);
        }

        let view = BlockView::new(self.chain, block);
        let dp = m.underlying_decimals;

        if let Ok(r) = view.call(market, &ICToken::comptrollerCall {}) {
            m.pool = address_id(&r._0);
        }

        let underlying = parse_address(&m.underlying_address).unwrap_or(Address::ZERO);
        let price = self.prices.resolve(
            &view,
            &PriceQuery {
                market,
                underlying,
                decimals: dp,
            },
        );
        m.underlying_price = price.native;
        m.underlying_price_usd = price.usd;

        if let Some(raw) = read_required(&view, market, ICToken::totalSupplyCall {}, |r| r._0) {
            m.total_supply = scaled(raw, MARKET_TOKEN_DECIMALS, MARKET_TOKEN_DECIMALS);
        }
        // Stored rate carries 18 + underlying - 8 fractional digits.
        if let Some(raw) = read_required(&view, market, ICToken::exchangeRateStoredCall {}, |r| r._0) {
            m.exchange_rate = scaled(raw, MANTISSA_DECIMALS + dp - MARKET_TOKEN_DECIMALS, MANTISSA_DECIMALS);
        }
        if let Some(raw) = read_required(&view, market, ICToken::borrowIndexCall {}, |r| r._0) {
            m.borrow_index = scaled(raw, MANTISSA_DECIMALS, MANTISSA_DECIMALS);
        }
        if let Some(raw) = read_required(&view, market, ICToken::totalReservesCall {}, |r| r._0) {
            m.reserves = scaled(raw, dp, dp);
        }
        if let Some(raw) = read_required(&view, market, ICToken::totalBorrowsCall {}, |r| r._0) {
            m.total_borrows = scaled(raw, dp, dp);
        }
        if let Some(raw) = read_required(&view, market, ICToken::getCashCall {}, |r| r._0) {
            m.cash = scaled(raw, dp, dp);
        }
        if let Some(raw) = read_required(&view, market, ICToken::reserveFactorMantissaCall {}, |r| r._0) {
            m.reserve_factor = scaled(raw, MANTISSA_DECIMALS, MANTISSA_DECIMALS);
        }
        if let Some(raw) = read_required(&view, market, ICToken::borrowRatePerBlockCall {}, |r| r._0) {
            let rates = Rates::from_per_block(raw);
            m.borrow_rate = rates.per_year;
            m.borrow_rate_apr = rates.apr;
            m.borrow_rate_apy = rates.apy;
        }

        let supply = match view.call(market, &ICToken::supplyRatePerBlockCall {}) {
            Ok(r) => Rates::from_per_block(r._0),
            Err(_) => {
                debug!(market = %id, block, "supplyRatePerBlock() reverted, using zero");
                Rates::ZERO
            }
        };
        m.supply_rate = supply.per_year;
        m.supply_rate_apr = supply.apr;
        m.supply_rate_apy = supply.apy;

        m.total_supply_usd = product(
            &[m.total_supply, m.exchange_rate, m.underlying_price_usd],
            MANTISSA_DECIMALS,
        );
        m.total_borrows_usd = product(&[m.total_borrows, m.underlying_price_usd], MANTISSA_DECIMALS);

        m.accrual_block_number = block;
        m.block_timestamp = timestamp;

        store.save(m.clone());
        Metrics::market_update(true);
        debug!(
            market = %id,
            block,
            price_usd = %m.underlying_price_usd,
            total_supply = %m.total_supply,
            "Market reconciled"
        );
        Some(m)
    }
}

/// Per-year, APR and APY forms of a per-block rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rates {
    per_year: Decimal,
    apr: Decimal,
    apy: Decimal,
}

impl Rates {
    const ZERO: Self = Self {
        per_year: Decimal::ZERO,
        apr: Decimal::ZERO,
        apy: Decimal::ZERO,
    };

    fn from_per_block(raw: U256) -> Self {
        let Ok(per_block) = from_mantissa(raw, MANTISSA_DECIMALS) else {
            warn!(%raw, "Rate mantissa out of range, using zero");
            return Self::ZERO;
        };
        let convert = |r: fuse_core::Result<Decimal>| {
            r.map(|v| truncate(v, MANTISSA_DECIMALS)).unwrap_or_else(|e| {
                warn!(%per_block, error = %e, "Rate conversion failed, using zero");
                Decimal::ZERO
            })
        };
        Self {
            per_year: convert(annualize(per_block)),
            apr: convert(rate_to_apr(per_block)),
            apy: convert(rate_to_apy(per_block, DAYS_PER_YEAR)),
        }
    }
}

fn read_string<C: SolCall>(
    view: &BlockView<'_>,
    to: Address,
    call: C,
    extract: impl FnOnce(C::Return) -> String,
    fallback: &str,
) -> String {
    match view.call(to, &call) {
        Ok(r) => extract(r),
        Err(_) => {
            debug!(contract = %to, method = C::SIGNATURE, "Metadata read reverted, using sentinel");
            fallback.to_string()
        }
    }
}

fn read_required<C: SolCall>(
    view: &BlockView<'_>,
    market: Address,
    call: C,
    extract: impl FnOnce(C::Return) -> U256,
) -> Option<U256> {
    match view.call(market, &call) {
        Ok(r) => Some(extract(r)),
        Err(_) => {
            warn!(
                market = %market,
                block = view.block(),
                method = C::SIGNATURE,
                "Market read reverted, keeping stored value"
            );
            None
        }
    }
}
