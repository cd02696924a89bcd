//! Stats and audit trail.
//!
//! Running per-(market, account) and per-(pool, admin) records, each with
//! an append-only log keyed `statsId-txHash-logIndex`. Log entries are
//! write-once: recording the same event twice stores one entry.
//!
//! `record_*` persist the log entry and return the stats record with its
//! accrual block advanced. The caller applies its own mutation to the
//! returned record and saves it.

use fuse_core::{
    log_entry_id, pool_admin_id, position_id, tx_hash_id, Account, AccountMarketPosition, Entity,
    EventMeta, Pool, PoolAdminStats, PoolAdminTransaction, PositionTransaction,
};
use fuse_store::EntityStore;
use fuse_telemetry::Metrics;
use tracing::{debug, info};

/// Load an account, creating and saving it on first reference.
pub fn get_or_create_account<S: EntityStore>(store: &mut S, account_id: &str) -> Account {
    if let Some(account) = store.load::<Account>(account_id) {
        return account;
    }
    let account: Account = store.create(account_id);
    store.save(account.clone());
    Metrics::entity_created(Account::KIND.as_str());
    info!(account = %account_id, "Created account");
    account
}

/// Load the position for `(market_id, account_id)` or build a blank one.
/// A new position is not saved here.
pub fn get_or_create_position<S: EntityStore>(
    store: &S,
    market_id: &str,
    symbol: &str,
    account_id: &str,
) -> AccountMarketPosition {
    let id = position_id(market_id, account_id);
    store.load(&id).unwrap_or_else(|| {
        Metrics::entity_created(AccountMarketPosition::KIND.as_str());
        let mut position: AccountMarketPosition = store.create(&id);
        position.market = market_id.to_string();
        position.account = account_id.to_string();
        position.symbol = symbol.to_string();
        position
    })
}

/// Load the stats for `(pool_id, admin_id)` or build a blank one.
/// A new record is not saved here.
pub fn get_or_create_pool_admin_stats<S: EntityStore>(
    store: &S,
    pool_id: &str,
    admin_id: &str,
) -> PoolAdminStats {
    let id = pool_admin_id(pool_id, admin_id);
    store.load(&id).unwrap_or_else(|| {
        Metrics::entity_created(PoolAdminStats::KIND.as_str());
        let mut stats: PoolAdminStats = store.create(&id);
        stats.pool = pool_id.to_string();
        stats.admin = admin_id.to_string();
        stats
    })
}

/// Log a position-affecting event and advance the position's accrual block.
pub fn record_position_change<S: EntityStore>(
    store: &mut S,
    market_id: &str,
    symbol: &str,
    account_id: &str,
    meta: &EventMeta,
) -> AccountMarketPosition {
    let mut position = get_or_create_position(store, market_id, symbol, account_id);

    let entry_id = log_entry_id(&position.id, &meta.tx_hash, meta.log_index);
    if store.contains::<PositionTransaction>(&entry_id) {
        debug!(entry = %entry_id, "Position log entry already recorded");
    } else {
        store.save(PositionTransaction {
            id: entry_id,
            position: position.id.clone(),
            tx_hash: tx_hash_id(&meta.tx_hash),
            timestamp: meta.block_timestamp,
            block: meta.block_number,
            log_index: meta.log_index,
        });
    }

    position.accrual_block_number = meta.block_number;
    position
}

/// Log a governance event and advance the pool-admin stats' accrual block.
pub fn record_pool_admin_change<S: EntityStore>(
    store: &mut S,
    pool_id: &str,
    admin_id: &str,
    meta: &EventMeta,
) -> PoolAdminStats {
    let mut stats = get_or_create_pool_admin_stats(store, pool_id, admin_id);

    let entry_id = log_entry_id(&stats.id, &meta.tx_hash, meta.log_index);
    if store.contains::<PoolAdminTransaction>(&entry_id) {
        debug!(entry = %entry_id, "Pool admin log entry already recorded");
    } else {
        store.save(PoolAdminTransaction {
            id: entry_id,
            pool_admin: stats.id.clone(),
            tx_hash: tx_hash_id(&meta.tx_hash),
            timestamp: meta.block_timestamp,
            block: meta.block_number,
            log_index: meta.log_index,
        });
    }

    stats.accrual_block_number = meta.block_number;
    stats
}

/// Copy `pool`'s governance parameters into `stats`.
pub(crate) fn mirror_pool(stats: &mut PoolAdminStats, pool: &Pool) {
    stats.price_oracle = pool.price_oracle.clone();
    stats.close_factor = pool.close_factor;
    stats.liquidation_incentive = pool.liquidation_incentive;
    stats.max_assets = pool.max_assets;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use alloy::primitives::{Address, B256};
    use fuse_core::EntityKind;
    use fuse_store::InMemoryStore;

    const MARKET: &str = "0x1111111111111111111111111111111111111111";
    const ACCOUNT: &str = "0x2222222222222222222222222222222222222222";
    const POOL: &str = "0x3333333333333333333333333333333333333333";

    fn meta(tx: u8, block: u64, log_index: u64) -> EventMeta {
        EventMeta {
            tx_hash: B256::repeat_byte(tx),
            log_index,
            ..fixtures::meta(Address::repeat_byte(0x33), block, 1_600_000_000 + block)
        }
    }

    #[test]
    fn test_account_created_once() {
        let mut store = InMemoryStore::new();
        let mut account = get_or_create_account(&mut store, ACCOUNT);
        account.has_borrowed = true;
        store.save(account);

        assert!(get_or_create_account(&mut store, ACCOUNT).has_borrowed);
        assert_eq!(store.count_of(EntityKind::Account), 1);
    }

    #[test]
    fn test_position_change_creates_entry_and_advances_block() {
        let mut store = InMemoryStore::new();
        let position = record_position_change(&mut store, MARKET, "fUSDT-7", ACCOUNT, &meta(0xab, 100, 3));

        assert_eq!(position.id, format!("{MARKET}-{ACCOUNT}"));
        assert_eq!(position.symbol, "fUSDT-7");
        assert_eq!(position.accrual_block_number, 100);

        let entry_id = format!("{MARKET}-{ACCOUNT}-0x{}-3", "ab".repeat(32));
        let entry = store.load::<PositionTransaction>(&entry_id).unwrap();
        assert_eq!(entry.position, position.id);
        assert_eq!(entry.block, 100);
        assert_eq!(entry.timestamp, 1_600_000_100);
        // position itself is left for the caller to save
        assert!(!store.contains::<AccountMarketPosition>(&position.id));
    }

    #[test]
    fn test_duplicate_position_entry_is_noop() {
        let mut store = InMemoryStore::new();
        let event = meta(0xab, 100, 3);
        let first = record_position_change(&mut store, MARKET, "fUSDT-7", ACCOUNT, &event);
        store.save(first);
        let second = record_position_change(&mut store, MARKET, "fUSDT-7", ACCOUNT, &event);
        store.save(second);

        assert_eq!(store.count_of(EntityKind::PositionTransaction), 1);
        assert_eq!(store.count_of(EntityKind::AccountMarketPosition), 1);
    }

    #[test]
    fn test_distinct_log_indexes_each_logged() {
        let mut store = InMemoryStore::new();
        for log_index in [1, 2] {
            let position = record_position_change(&mut store, MARKET, "fUSDT-7", ACCOUNT, &meta(0xab, 100, log_index));
            store.save(position);
        }
        assert_eq!(store.count_of(EntityKind::PositionTransaction), 2);
        assert_eq!(store.count_of(EntityKind::AccountMarketPosition), 1);
    }

    #[test]
    fn test_position_keeps_prior_mutations() {
        let mut store = InMemoryStore::new();
        let mut position = record_position_change(&mut store, MARKET, "fUSDT-7", ACCOUNT, &meta(0x01, 100, 0));
        position.entered_market = true;
        store.save(position);

        let position = record_position_change(&mut store, MARKET, "fUSDT-7", ACCOUNT, &meta(0x02, 105, 0));
        assert!(position.entered_market);
        assert_eq!(position.accrual_block_number, 105);
    }

    #[test]
    fn test_pool_admin_change() {
        let mut store = InMemoryStore::new();
        let stats = record_pool_admin_change(&mut store, POOL, POOL, &meta(0xcd, 200, 7));
        assert_eq!(stats.id, format!("{POOL}-{POOL}"));
        assert_eq!(stats.pool, POOL);
        assert_eq!(stats.accrual_block_number, 200);
        store.save(stats);

        record_pool_admin_change(&mut store, POOL, POOL, &meta(0xcd, 200, 7));
        assert_eq!(store.count_of(EntityKind::PoolAdminTransaction), 1);
        assert_eq!(store.count_of(EntityKind::PoolAdminStats), 1);
    }

    #[test]
    fn test_mirror_pool() {
        let mut pool = Pool::blank(POOL);
        pool.max_assets = 20;
        pool.price_oracle = "0xoracle".to_string();
        let mut stats = PoolAdminStats::blank("x");
        mirror_pool(&mut stats, &pool);
        assert_eq!(stats.max_assets, 20);
        assert_eq!(stats.price_oracle, "0xoracle");
    }
}
