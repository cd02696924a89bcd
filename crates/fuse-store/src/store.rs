//! Entity store interface and the in-memory implementation.

use fuse_core::{Entity, EntityKind, StoredEntity};
use std::collections::BTreeMap;

/// Load-by-id / create / save access to persisted entities.
///
/// All mutation is read-modify-write: callers `load` (or `create`) an owned
/// copy, change it, and `save` it back. A save replaces the whole record.
pub trait EntityStore {
    /// Raw lookup by kind and id.
    fn get(&self, kind: EntityKind, id: &str) -> Option<&StoredEntity>;

    /// Insert or replace a record.
    fn put(&mut self, entity: StoredEntity);

    fn load<E: Entity>(&self, id: &str) -> Option<E> {
        self.get(E::KIND, id).and_then(E::from_stored).cloned()
    }

    /// A fresh, zeroed record. Not persisted until `save`.
    fn create<E: Entity>(&self, id: &str) -> E {
        E::blank(id)
    }

    fn save<E: Entity>(&mut self, entity: E) {
        self.put(entity.into_stored());
    }

    fn contains<E: Entity>(&self, id: &str) -> bool {
        self.get(E::KIND, id).is_some()
    }
}

/// `EntityStore` over an ordered map keyed by `(kind, id)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InMemoryStore {
    entities: BTreeMap<(EntityKind, String), StoredEntity>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn count_of(&self, kind: EntityKind) -> usize {
        self.entities.keys().filter(|(k, _)| *k == kind).count()
    }

    /// Every record, ordered by kind then id.
    pub fn iter(&self) -> impl Iterator<Item = &StoredEntity> {
        self.entities.values()
    }

    /// Every record of type `E`, ordered by id.
    pub fn all<'a, E: Entity + 'a>(&'a self) -> impl Iterator<Item = &'a E> {
        self.entities
            .iter()
            .filter(|((kind, _), _)| *kind == E::KIND)
            .filter_map(|(_, stored)| E::from_stored(stored))
    }
}

impl EntityStore for InMemoryStore {
    fn get(&self, kind: EntityKind, id: &str) -> Option<&StoredEntity> {
        self.entities.get(&(kind, id.to_string()))
    }

    fn put(&mut self, entity: StoredEntity) {
        let key = (entity.kind(), entity.id().to_string());
        self.entities.insert(key, entity);
    }
}

impl FromIterator<StoredEntity> for InMemoryStore {
    fn from_iter<I: IntoIterator<Item = StoredEntity>>(iter: I) -> Self {
        let mut store = Self::new();
        for entity in iter {
            store.put(entity);
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuse_core::{Account, Market, Pool};

    #[test]
    fn test_load_missing_returns_none() {
        let store = InMemoryStore::new();
        assert!(store.load::<Market>("0xabc").is_none());
        assert!(!store.contains::<Market>("0xabc"));
    }

    #[test]
    fn test_create_does_not_persist() {
        let store = InMemoryStore::new();
        let market: Market = store.create("0xabc");
        assert_eq!(market.id, "0xabc");
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let mut store = InMemoryStore::new();
        let mut market: Market = store.create("0xabc");
        market.symbol = "fUSDC-1".to_string();
        store.save(market.clone());

        assert_eq!(store.load::<Market>("0xabc"), Some(market));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_same_id_different_kinds_do_not_collide() {
        let mut store = InMemoryStore::new();
        store.save(Market::blank("0xabc"));
        store.save(Pool::blank("0xabc"));

        assert_eq!(store.len(), 2);
        assert_eq!(store.count_of(EntityKind::Market), 1);
        assert_eq!(store.count_of(EntityKind::Pool), 1);
        assert!(store.load::<Account>("0xabc").is_none());
    }

    #[test]
    fn test_save_replaces_record() {
        let mut store = InMemoryStore::new();
        let mut account = Account::blank("0xacc");
        store.save(account.clone());
        account.has_borrowed = true;
        store.save(account);

        assert_eq!(store.len(), 1);
        assert!(store.load::<Account>("0xacc").unwrap().has_borrowed);
    }

    #[test]
    fn test_all_is_ordered_by_id() {
        let store: InMemoryStore = ["0xc", "0xa", "0xb"]
            .into_iter()
            .map(|id| Account::blank(id).into_stored())
            .chain(std::iter::once(Pool::blank("0x0").into_stored()))
            .collect();

        let ids: Vec<_> = store.all::<Account>().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["0xa", "0xb", "0xc"]);
    }
}
