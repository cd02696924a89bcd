//! Shared chain fixtures: one pool with one 6-decimal market, priced by
//! the USD-denominated oracle.

use crate::handlers::EventHandler;
use crate::market::MarketReconciler;
use crate::pool::{PoolReconciler, PoolRegistration};
use alloy::primitives::{Address, B256, U256};
use fuse_chain::bindings::{ICToken, IComptroller, IPriceOracle, IERC20};
use fuse_chain::RecordedChain;
use fuse_core::EventMeta;
use fuse_oracle::ProtocolConfig;
use fuse_store::{EntityStore, InMemoryStore};

/// Inside the USD-denominated oracle epoch.
pub const BLOCK: u64 = 12_500_000;

pub const POOL: Address = Address::repeat_byte(0xaa);
pub const DIRECTORY: Address = Address::repeat_byte(0xd1);
pub const ADMIN: Address = Address::repeat_byte(0xad);
pub const ACCOUNT: Address = Address::repeat_byte(0x5e);
pub const USDT_MARKET: Address = Address::repeat_byte(0x11);
pub const USDT_TOKEN: Address = Address::repeat_byte(0x12);

pub fn pow10(n: usize) -> U256 {
    U256::from(10u8).pow(U256::from(n))
}

pub fn meta(address: Address, block: u64, timestamp: u64) -> EventMeta {
    EventMeta {
        address,
        tx_hash: B256::repeat_byte(0x01),
        block_number: block,
        block_timestamp: timestamp,
        log_index: 0,
    }
}

pub fn registration(comptroller: Address) -> PoolRegistration {
    PoolRegistration {
        comptroller,
        index: 7,
        name: "Tetranode's Locker".to_string(),
        creator: ADMIN,
        block_posted: BLOCK,
        timestamp_posted: 1_620_000_000,
    }
}

pub struct Fixture {
    pub chain: RecordedChain,
    pub config: ProtocolConfig,
}

impl Fixture {
    pub fn new() -> Self {
        let config = ProtocolConfig::default();
        let oracle = config.oracle_schedule[2].oracle;
        let mut chain = RecordedChain::new();

        chain
            .respond(USDT_MARKET, &ICToken::underlyingCall {}, &(USDT_TOKEN,))
            .respond(USDT_MARKET, &ICToken::nameCall {}, &("Pool 7 Tether USD".to_string(),))
            .respond(USDT_MARKET, &ICToken::symbolCall {}, &("fUSDT-7".to_string(),))
            .respond(USDT_MARKET, &ICToken::comptrollerCall {}, &(POOL,))
            .respond(USDT_MARKET, &ICToken::interestRateModelCall {}, &(Address::repeat_byte(0x1e),))
            .respond(USDT_MARKET, &ICToken::reserveFactorMantissaCall {}, &(pow10(17),))
            .respond(USDT_MARKET, &ICToken::totalSupplyCall {}, &(U256::from(5_000_000_000_000u64),))
            .respond(USDT_MARKET, &ICToken::exchangeRateStoredCall {}, &(U256::from(2u8) * pow10(14),))
            .respond(USDT_MARKET, &ICToken::borrowIndexCall {}, &(U256::from(105u8) * pow10(16),))
            .respond(USDT_MARKET, &ICToken::totalReservesCall {}, &(U256::from(1_500_000u64),))
            .respond(USDT_MARKET, &ICToken::totalBorrowsCall {}, &(U256::from(250_000_000u64),))
            .respond(USDT_MARKET, &ICToken::getCashCall {}, &(U256::from(750_000_000u64),))
            .respond(USDT_MARKET, &ICToken::borrowRatePerBlockCall {}, &(pow10(10),))
            .respond(USDT_MARKET, &ICToken::supplyRatePerBlockCall {}, &(U256::from(5u8) * pow10(9),));

        chain
            .respond(USDT_TOKEN, &IERC20::decimalsCall {}, &(6u8,))
            .respond(USDT_TOKEN, &IERC20::nameCall {}, &("Tether USD".to_string(),))
            .respond(USDT_TOKEN, &IERC20::symbolCall {}, &("USDT".to_string(),));

        // $1.0001 at 30 fractional digits; ETH at $2000.
        chain
            .respond(
                oracle,
                &IPriceOracle::getUnderlyingPriceCall { cToken: USDT_MARKET },
                &(U256::from(10_001u64) * pow10(26),),
            )
            .respond(
                oracle,
                &IPriceOracle::getUnderlyingPriceCall {
                    cToken: config.base_asset.market,
                },
                &(U256::from(2_000u64) * pow10(18),),
            );

        chain
            .respond(POOL, &IComptroller::adminCall {}, &(ADMIN,))
            .respond(POOL, &IComptroller::oracleCall {}, &(oracle,))
            .respond(POOL, &IComptroller::closeFactorMantissaCall {}, &(U256::from(5u8) * pow10(17),))
            .respond(
                POOL,
                &IComptroller::liquidationIncentiveMantissaCall {},
                &(U256::from(108u8) * pow10(16),),
            )
            .respond(POOL, &IComptroller::maxAssetsCall {}, &(U256::from(20u8),))
            .respond(POOL, &IComptroller::getAllMarketsCall {}, &(vec![USDT_MARKET],));

        Self { chain, config }
    }

    pub fn pool(&self) -> Address {
        POOL
    }

    pub fn oracle(&self) -> Address {
        self.config.oracle_schedule[2].oracle
    }

    pub fn markets(&self) -> MarketReconciler<'_> {
        MarketReconciler::new(&self.chain, &self.config).unwrap()
    }

    pub fn pools(&self) -> PoolReconciler<'_> {
        PoolReconciler::new(&self.chain)
    }

    pub fn handler(&self) -> EventHandler<'_> {
        EventHandler::new(&self.chain, &self.config).unwrap()
    }

    /// Store holding the freshly listed market, never updated.
    pub fn listed_store(&self) -> InMemoryStore {
        let mut store = InMemoryStore::new();
        store.save(self.markets().create_market(USDT_MARKET, &meta(POOL, BLOCK, 0)));
        store
    }
}
