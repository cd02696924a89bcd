//! Price Resolution Service.
//!
//! Returns the underlying price of a market in two units: relative to the
//! base asset and in USD. Whichever unit the active oracle does not quote
//! in is derived through a second oracle read (the USD reference priced in
//! the base asset, or the base asset priced in USD).
//!
//! Resolution never fails. A reverted oracle read, an unsupported decimal
//! count or a zero divisor yields `PRICE_FALLBACK` for the affected unit.

use crate::config::{AssetRef, ProtocolConfig};
use crate::error::OracleResult;
use crate::schedule::{Denomination, OracleEpoch, OracleSchedule};
use alloy::primitives::Address;
use fuse_chain::bindings::IPriceOracle;
use fuse_chain::BlockView;
use fuse_core::{from_mantissa, truncate};
use fuse_telemetry::Metrics;
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// Value reported for a price that could not be resolved.
pub const PRICE_FALLBACK: Decimal = Decimal::ZERO;

/// Special-cased markets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketRole {
    /// Wraps the base asset: native price is always 1.
    Base,
    /// Wraps the USD reference: USD price is always 1.
    UsdReference,
    Other,
}

/// What the resolver needs to know about a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceQuery {
    pub market: Address,
    pub underlying: Address,
    pub decimals: u32,
}

impl From<&AssetRef> for PriceQuery {
    fn from(asset: &AssetRef) -> Self {
        Self {
            market: asset.market,
            underlying: asset.underlying,
            decimals: asset.decimals,
        }
    }
}

/// Underlying price in both units, truncated to the underlying's decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPrice {
    pub native: Decimal,
    pub usd: Decimal,
}

impl ResolvedPrice {
    pub const FALLBACK: Self = Self {
        native: PRICE_FALLBACK,
        usd: PRICE_FALLBACK,
    };
}

pub struct PriceResolver<'a> {
    config: &'a ProtocolConfig,
    schedule: OracleSchedule,
}

impl<'a> PriceResolver<'a> {
    pub fn new(config: &'a ProtocolConfig) -> OracleResult<Self> {
        let schedule = config.schedule()?;
        Ok(Self { config, schedule })
    }

    pub fn role_of(&self, market: &Address) -> MarketRole {
        if self.config.is_base_market(market) {
            MarketRole::Base
        } else if self.config.is_usd_reference_market(market) {
            MarketRole::UsdReference
        } else {
            MarketRole::Other
        }
    }

    /// Resolve the price of `query`'s underlying at the view's block.
    pub fn resolve(&self, view: &BlockView<'_>, query: &PriceQuery) -> ResolvedPrice {
        let Some(epoch) = self.schedule.select(view.block()) else {
            warn!(block = view.block(), "No oracle active at block");
            Metrics::price_fallback("no_oracle");
            return ResolvedPrice::FALLBACK;
        };

        let role = self.role_of(&query.market);
        let dp = query.decimals;

        let price = match epoch.denomination {
            Denomination::Native => {
                let reference = self.oracle_price(view, epoch, &(&self.config.usd_reference).into());
                match role {
                    MarketRole::Base => ResolvedPrice {
                        native: Decimal::ONE,
                        usd: divide(Decimal::ONE, reference),
                    },
                    MarketRole::UsdReference => ResolvedPrice {
                        native: self.oracle_price(view, epoch, query).unwrap_or(PRICE_FALLBACK),
                        usd: Decimal::ONE,
                    },
                    MarketRole::Other => {
                        let native = self.oracle_price(view, epoch, query);
                        ResolvedPrice {
                            native: native.unwrap_or(PRICE_FALLBACK),
                            usd: native.map_or(PRICE_FALLBACK, |n| divide(n, reference)),
                        }
                    }
                }
            }
            Denomination::Usd => {
                let base_usd = self.oracle_price(view, epoch, &(&self.config.base_asset).into());
                match role {
                    MarketRole::Base => ResolvedPrice {
                        native: Decimal::ONE,
                        usd: base_usd.unwrap_or(PRICE_FALLBACK),
                    },
                    MarketRole::UsdReference => ResolvedPrice {
                        native: divide(Decimal::ONE, base_usd),
                        usd: Decimal::ONE,
                    },
                    MarketRole::Other => {
                        let usd = self.oracle_price(view, epoch, query);
                        ResolvedPrice {
                            native: usd.map_or(PRICE_FALLBACK, |u| divide(u, base_usd)),
                            usd: usd.unwrap_or(PRICE_FALLBACK),
                        }
                    }
                }
            }
        };

        ResolvedPrice {
            native: truncate(price.native, dp),
            usd: truncate(price.usd, dp),
        }
    }

    /// One oracle read, scaled per the epoch's convention. `None` on revert
    /// or when the asset's decimals are outside what the convention supports.
    fn oracle_price(
        &self,
        view: &BlockView<'_>,
        epoch: &OracleEpoch,
        query: &PriceQuery,
    ) -> Option<Decimal> {
        let Some(scale) = epoch.convention.answer_scale(query.decimals) else {
            warn!(market = %query.market, decimals = query.decimals, "Unsupported decimals for oracle convention");
            Metrics::price_fallback("unsupported_decimals");
            return None;
        };

        let target = epoch.convention.query_address(query.market, query.underlying);
        let raw = match view.call(epoch.oracle, &IPriceOracle::getUnderlyingPriceCall { cToken: target }) {
            Ok(ret) => ret._0,
            Err(_) => {
                debug!(oracle = %epoch.oracle, %target, block = view.block(), "Oracle read reverted");
                Metrics::price_fallback("reverted");
                return None;
            }
        };

        match from_mantissa(raw, scale) {
            Ok(price) => Some(price),
            Err(e) => {
                warn!(%target, error = %e, "Oracle answer out of range");
                Metrics::price_fallback("out_of_range");
                None
            }
        }
    }
}

/// `numerator / divisor`, or the fallback when the divisor is missing or zero.
fn divide(numerator: Decimal, divisor: Option<Decimal>) -> Decimal {
    divisor
        .and_then(|d| numerator.checked_div(d))
        .unwrap_or(PRICE_FALLBACK)
}
