//! Entity identifiers.
//!
//! Every entity is keyed by a stable string. Addresses and hashes are
//! rendered as lowercase `0x`-prefixed hex so the same contract always
//! maps to the same id regardless of how the caller spelled it.

use crate::error::{CoreError, Result};
use alloy::primitives::{Address, B256};
use std::str::FromStr;

/// Lowercase hex id for an address.
pub fn address_id(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}

/// Lowercase hex id for a transaction hash.
pub fn tx_hash_id(hash: &B256) -> String {
    format!("0x{}", hex::encode(hash.as_slice()))
}

/// Parse an address id back into an `Address`.
pub fn parse_address(id: &str) -> Result<Address> {
    Address::from_str(id).map_err(|e| CoreError::InvalidAddress(format!("{id}: {e}")))
}

/// `marketId-accountId`
pub fn position_id(market_id: &str, account_id: &str) -> String {
    format!("{market_id}-{account_id}")
}

/// `poolId-adminId`
pub fn pool_admin_id(pool_id: &str, admin_id: &str) -> String {
    format!("{pool_id}-{admin_id}")
}

/// `statsId-txHash-logIndex`
pub fn log_entry_id(stats_id: &str, tx_hash: &B256, log_index: u64) -> String {
    format!("{stats_id}-{}-{log_index}", tx_hash_id(tx_hash))
}

/// Serde adapter for types that round-trip through `Display` / `FromStr`
/// (`Address`, `B256`, `U256`).
pub mod display_fromstr {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::fmt::Display;
    use std::str::FromStr;

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Display,
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        T::from_str(&s).map_err(de::Error::custom)
    }
}
