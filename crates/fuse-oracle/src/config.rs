//! Protocol constants table.
//!
//! Loaded once at startup and passed by reference to every component that
//! needs addresses, oracle history or metadata overrides. `Default` holds
//! the mainnet deployment.

use crate::error::{OracleError, OracleResult};
use crate::schedule::{Denomination, OracleEpoch, OracleSchedule, PriceConvention};
use alloy::primitives::{address, Address};
use fuse_core::ids::display_fromstr;
use serde::{Deserialize, Serialize};

/// A market whose underlying is priced specially.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    #[serde(with = "display_fromstr")]
    pub market: Address,
    #[serde(with = "display_fromstr")]
    pub underlying: Address,
    pub decimals: u32,
    pub name: String,
    pub symbol: String,
}

/// Fixed metadata for tokens whose `name()` / `symbol()` do not return
/// strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenOverride {
    #[serde(with = "display_fromstr")]
    pub address: Address,
    pub name: String,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Oracle generations, ascending by activation block.
    #[serde(default = "default_oracle_schedule")]
    pub oracle_schedule: Vec<OracleEpoch>,
    /// Market wrapping the chain's native coin. Its price in the base
    /// asset is 1 by definition.
    #[serde(default = "default_base_asset")]
    pub base_asset: AssetRef,
    /// Market whose underlying is the USD reference. Its USD price is 1
    /// by definition.
    #[serde(default = "default_usd_reference")]
    pub usd_reference: AssetRef,
    #[serde(default = "default_token_overrides")]
    pub token_overrides: Vec<TokenOverride>,
}

const MASTER_PRICE_ORACLE: Address = address!("1887118e49e0f4a78bd71b792a49de03504a764d");

fn default_oracle_schedule() -> Vec<OracleEpoch> {
    vec![
        OracleEpoch {
            activation_block: 0,
            oracle: MASTER_PRICE_ORACLE,
            convention: PriceConvention::UnderlyingAddress,
            denomination: Denomination::Native,
        },
        OracleEpoch {
            activation_block: 7_715_909,
            oracle: MASTER_PRICE_ORACLE,
            convention: PriceConvention::MarketAddressScaled,
            denomination: Denomination::Native,
        },
        OracleEpoch {
            activation_block: 10_678_765,
            oracle: MASTER_PRICE_ORACLE,
            convention: PriceConvention::MarketAddressScaled,
            denomination: Denomination::Usd,
        },
    ]
}

fn default_base_asset() -> AssetRef {
    AssetRef {
        market: address!("4ddc2d193948926d02f9b1fe9e1daa0718270ed5"),
        underlying: Address::ZERO,
        decimals: 18,
        name: "Ether".to_string(),
        symbol: "ETH".to_string(),
    }
}

fn default_usd_reference() -> AssetRef {
    AssetRef {
        market: address!("39aa39c021dfbae8fac545936693ac917d5e7563"),
        underlying: address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
        decimals: 6,
        name: "USD Coin".to_string(),
        symbol: "USDC".to_string(),
    }
}

fn default_token_overrides() -> Vec<TokenOverride> {
    vec![TokenOverride {
        address: address!("89d24a6b4ccb1b6faa2625fe562bdd9a23260359"),
        name: "Dai Stablecoin v1.0 (DAI)".to_string(),
        symbol: "DAI".to_string(),
    }]
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            oracle_schedule: default_oracle_schedule(),
            base_asset: default_base_asset(),
            usd_reference: default_usd_reference(),
            token_overrides: default_token_overrides(),
        }
    }
}

impl ProtocolConfig {
    /// Validate and build the oracle schedule.
    pub fn schedule(&self) -> OracleResult<OracleSchedule> {
        if self.base_asset.market == self.usd_reference.market {
            return Err(OracleError::InvalidConfig(
                "base asset and USD reference share a market".to_string(),
            ));
        }
        OracleSchedule::new(self.oracle_schedule.clone())
    }

    pub fn token_override(&self, token: &Address) -> Option<&TokenOverride> {
        self.token_overrides.iter().find(|o| &o.address == token)
    }

    pub fn is_base_market(&self, market: &Address) -> bool {
        &self.base_asset.market == market
    }

    pub fn is_usd_reference_market(&self, market: &Address) -> bool {
        &self.usd_reference.market == market
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule_is_valid() {
        let config = ProtocolConfig::default();
        let schedule = config.schedule().unwrap();
        assert_eq!(schedule.epochs().len(), 3);
        assert_eq!(
            schedule.select(10_678_765).unwrap().denomination,
            Denomination::Usd
        );
        assert_eq!(
            schedule.select(10_678_764).unwrap().denomination,
            Denomination::Native
        );
    }

    #[test]
    fn test_token_override_lookup() {
        let config = ProtocolConfig::default();
        let dai = address!("89d24a6b4ccb1b6faa2625fe562bdd9a23260359");
        assert_eq!(config.token_override(&dai).unwrap().symbol, "DAI");
        assert!(config.token_override(&Address::ZERO).is_none());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_str = r#"
            [[token_overrides]]
            address = "0x9f8f72aa9304c8b593d555f12ef6589cc3a579a2"
            name = "Maker"
            symbol = "MKR"
        "#;
        let config: ProtocolConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.token_overrides.len(), 1);
        assert_eq!(config.base_asset.symbol, "ETH");
        assert_eq!(config.oracle_schedule.len(), 3);
    }

    #[test]
    fn test_shared_special_market_rejected() {
        let mut config = ProtocolConfig::default();
        config.usd_reference.market = config.base_asset.market;
        assert!(matches!(config.schedule(), Err(OracleError::InvalidConfig(_))));
    }
}
