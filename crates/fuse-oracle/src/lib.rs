//! Price resolution for the Fuse pool indexer.
//!
//! Several oracle generations were live over the indexed history, each
//! with its own calling convention and quote currency. The schedule maps
//! block heights to the authoritative generation; the resolver queries it
//! and returns a price in the base asset and in USD.

pub mod config;
pub mod error;
pub mod resolver;
pub mod schedule;

pub use config::{AssetRef, ProtocolConfig, TokenOverride};
pub use error::{OracleError, OracleResult};
pub use resolver::{MarketRole, PriceQuery, PriceResolver, ResolvedPrice, PRICE_FALLBACK};
pub use schedule::{Denomination, OracleEpoch, OracleSchedule, PriceConvention};
