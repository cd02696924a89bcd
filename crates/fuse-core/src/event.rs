//! Inbound chain events.
//!
//! The host delivers events in canonical chain order (block number, then
//! log index). Each event carries its `EventMeta`, which is passed through
//! unchanged to the reconcilers and the audit trail.

use crate::ids::display_fromstr;
use alloy::primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// Chain metadata attached to every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMeta {
    /// Contract that emitted the log.
    #[serde(with = "display_fromstr")]
    pub address: Address,
    #[serde(with = "display_fromstr")]
    pub tx_hash: B256,
    pub block_number: u64,
    pub block_timestamp: u64,
    pub log_index: u64,
}

impl EventMeta {
    /// Canonical ordering key.
    #[inline]
    pub fn position(&self) -> (u64, u64) {
        (self.block_number, self.log_index)
    }
}

/// Decoded protocol events the indexer reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChainEvent {
    /// Pool directory registered a new pool.
    PoolRegistered {
        index: u64,
        #[serde(with = "display_fromstr")]
        comptroller: Address,
        name: String,
        #[serde(with = "display_fromstr")]
        creator: Address,
        block_posted: u64,
        timestamp_posted: u64,
    },
    MarketListed {
        #[serde(with = "display_fromstr")]
        market: Address,
    },
    MarketEntered {
        #[serde(with = "display_fromstr")]
        market: Address,
        #[serde(with = "display_fromstr")]
        account: Address,
    },
    MarketExited {
        #[serde(with = "display_fromstr")]
        market: Address,
        #[serde(with = "display_fromstr")]
        account: Address,
    },
    NewCloseFactor {
        #[serde(with = "display_fromstr")]
        new_close_factor_mantissa: U256,
    },
    NewCollateralFactor {
        #[serde(with = "display_fromstr")]
        market: Address,
        #[serde(with = "display_fromstr")]
        new_collateral_factor_mantissa: U256,
    },
    NewLiquidationIncentive {
        #[serde(with = "display_fromstr")]
        new_liquidation_incentive_mantissa: U256,
    },
    NewMaxAssets {
        new_max_assets: u64,
    },
    NewPriceOracle {
        #[serde(with = "display_fromstr")]
        new_price_oracle: Address,
    },
    /// Any market-token event that changes interest state; triggers a resync
    /// of the emitting market.
    AccrueInterest,
}

impl ChainEvent {
    /// Short label for logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PoolRegistered { .. } => "pool_registered",
            Self::MarketListed { .. } => "market_listed",
            Self::MarketEntered { .. } => "market_entered",
            Self::MarketExited { .. } => "market_exited",
            Self::NewCloseFactor { .. } => "new_close_factor",
            Self::NewCollateralFactor { .. } => "new_collateral_factor",
            Self::NewLiquidationIncentive { .. } => "new_liquidation_incentive",
            Self::NewMaxAssets { .. } => "new_max_assets",
            Self::NewPriceOracle { .. } => "new_price_oracle",
            Self::AccrueInterest => "accrue_interest",
        }
    }
}

/// One line of an event log: metadata plus payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub meta: EventMeta,
    pub event: ChainEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event_record() {
        let line = r#"{
            "meta": {
                "address": "0x3f2d1bc6d02522dbcdb216b2e75edddafe04b16f",
                "tx_hash": "0x1111111111111111111111111111111111111111111111111111111111111111",
                "block_number": 12060000,
                "block_timestamp": 1615000000,
                "log_index": 3
            },
            "event": {
                "kind": "market_entered",
                "market": "0x39aa39c021dfbae8fac545936693ac917d5e7563",
                "account": "0x00000000000000000000000000000000000000aa"
            }
        }"#;

        let record: EventRecord = serde_json::from_str(line).unwrap();
        assert_eq!(record.meta.position(), (12_060_000, 3));
        assert_eq!(record.event.name(), "market_entered");
        match record.event {
            ChainEvent::MarketEntered { account, .. } => {
                assert_eq!(account, Address::with_last_byte(0xaa));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_parse_mantissa_payload() {
        let json = r#"{"kind":"new_close_factor","new_close_factor_mantissa":"500000000000000000"}"#;
        let event: ChainEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            ChainEvent::NewCloseFactor {
                new_close_factor_mantissa: U256::from(500_000_000_000_000_000u64)
            }
        );
    }
}
