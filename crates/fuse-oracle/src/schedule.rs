//! Block-height → oracle generation table.
//!
//! The schedule is an ordered list of epochs. An epoch is active from its
//! `activation_block` (inclusive) until the next epoch activates. Lookup
//! walks from the most recent epoch backwards and the first match wins, so
//! a query at exactly an activation block selects the newer generation.

use crate::error::{OracleError, OracleResult};
use alloy::primitives::Address;
use fuse_core::ids::display_fromstr;
use fuse_core::MANTISSA_DECIMALS;
use serde::{Deserialize, Serialize};

/// How an oracle generation is called and how its answer is scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceConvention {
    /// Queried with the underlying token address; answer has 18 decimals
    /// regardless of the token.
    UnderlyingAddress,
    /// Queried with the market address; answer embeds the underlying's own
    /// decimals and has `36 - decimals` fractional digits.
    MarketAddressScaled,
}

impl PriceConvention {
    /// Fractional digits of the raw answer for an asset with `decimals`.
    /// `None` when the asset has more decimals than the convention supports.
    pub fn answer_scale(&self, decimals: u32) -> Option<u32> {
        match self {
            Self::UnderlyingAddress => Some(MANTISSA_DECIMALS),
            Self::MarketAddressScaled => (2 * MANTISSA_DECIMALS).checked_sub(decimals),
        }
    }

    /// Address the oracle expects for this asset.
    pub fn query_address(&self, market: Address, underlying: Address) -> Address {
        match self {
            Self::UnderlyingAddress => underlying,
            Self::MarketAddressScaled => market,
        }
    }
}

/// Currency the oracle's answers are quoted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Denomination {
    /// Quoted in the base asset (ETH).
    Native,
    Usd,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleEpoch {
    /// First block (inclusive) this epoch is authoritative for.
    pub activation_block: u64,
    #[serde(with = "display_fromstr")]
    pub oracle: Address,
    pub convention: PriceConvention,
    pub denomination: Denomination,
}

/// Validated, ascending list of oracle epochs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleSchedule {
    epochs: Vec<OracleEpoch>,
}

impl OracleSchedule {
    /// Build a schedule. Epochs must be non-empty and strictly ascending by
    /// activation block.
    pub fn new(epochs: Vec<OracleEpoch>) -> OracleResult<Self> {
        if epochs.is_empty() {
            return Err(OracleError::EmptySchedule);
        }
        for pair in epochs.windows(2) {
            if pair[1].activation_block <= pair[0].activation_block {
                return Err(OracleError::UnorderedSchedule(pair[1].activation_block));
            }
        }
        Ok(Self { epochs })
    }

    /// The epoch authoritative at `block`, or `None` before the first one.
    pub fn select(&self, block: u64) -> Option<&OracleEpoch> {
        self.epochs
            .iter()
            .rev()
            .find(|epoch| block >= epoch.activation_block)
    }

    pub fn epochs(&self) -> &[OracleEpoch] {
        &self.epochs
    }
}
