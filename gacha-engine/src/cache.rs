//! Request-scoped memo over positional catalogue lookups.
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::catalog::Catalog;
use crate::model::{Item, TierId};

/// Memoizes [`Catalog::item_at_index`] for the lifetime of one simulation.
///
/// A new cache is built for every execution and dropped with it.
#[derive(Debug)]
pub struct LazyCatalogCache<'a, C: ?Sized> {
    catalog: &'a C,
    entries: HashMap<(TierId, u64), Item>,
    hits: u64,
    misses: u64,
}

impl<'a, C> LazyCatalogCache<'a, C>
where
    C: Catalog + ?Sized,
{
    pub fn new(catalog: &'a C) -> Self {
        Self {
            catalog,
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Item at `index` within `tier_id`, fetched at most once per key.
    ///
    /// Items the catalogue returns without an owning tier are linked to
    /// `tier_id`.
    ///
    /// # Errors
    ///
    /// Returns the catalogue error unchanged; nothing is cached on failure.
    pub fn item_at(&mut self, tier_id: TierId, index: u64) -> Result<&Item, C::Error> {
        match self.entries.entry((tier_id, index)) {
            Entry::Occupied(entry) => {
                self.hits += 1;
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                self.misses += 1;
                let mut item = self.catalog.item_at_index(tier_id, index)?;
                item.tier_id.get_or_insert(tier_id);
                Ok(entry.insert(item))
            }
        }
    }

    #[must_use]
    pub const fn hits(&self) -> u64 {
        self.hits
    }

    #[must_use]
    pub const fn misses(&self) -> u64 {
        self.misses
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemId;
    use std::cell::Cell;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("lookup offline")]
    struct Offline;

    /// Counts positional lookups and fails for tier 0.
    #[derive(Default)]
    struct CountingCatalog {
        lookups: Cell<u32>,
    }

    impl Catalog for CountingCatalog {
        type Error = Offline;

        fn item_count_in_tier(&self, _tier_id: TierId) -> Result<u64, Self::Error> {
            Ok(4)
        }

        fn item_at_index(&self, tier_id: TierId, index: u64) -> Result<Item, Self::Error> {
            self.lookups.set(self.lookups.get() + 1);
            if tier_id == 0 {
                return Err(Offline);
            }
            Ok(Item::new(tier_id * 100 + index, 1))
        }

        fn item_by_id(&self, _item_id: ItemId) -> Result<Option<Item>, Self::Error> {
            Ok(None)
        }

        fn count_items_by_ids(&self, _ids: &[ItemId]) -> Result<u64, Self::Error> {
            Ok(0)
        }

        fn count_tiers_by_ids(&self, _ids: &[TierId]) -> Result<u64, Self::Error> {
            Ok(0)
        }
    }

    #[test]
    fn repeated_keys_hit_the_memo() {
        let catalog = CountingCatalog::default();
        let mut cache = LazyCatalogCache::new(&catalog);

        assert_eq!(cache.item_at(2, 1).unwrap().id, 201);
        assert_eq!(cache.item_at(2, 1).unwrap().id, 201);
        assert_eq!(cache.item_at(3, 1).unwrap().id, 301);

        assert_eq!(catalog.lookups.get(), 2);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn resolved_items_are_linked_to_their_tier() {
        let catalog = CountingCatalog::default();
        let mut cache = LazyCatalogCache::new(&catalog);
        assert_eq!(cache.item_at(4, 0).unwrap().tier_id, Some(4));
    }

    #[test]
    fn failures_propagate_and_are_not_cached() {
        let catalog = CountingCatalog::default();
        let mut cache = LazyCatalogCache::new(&catalog);
        assert!(cache.item_at(0, 0).is_err());
        assert!(cache.item_at(0, 0).is_err());
        assert_eq!(catalog.lookups.get(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn separate_caches_share_nothing() {
        let catalog = CountingCatalog::default();
        {
            let mut first = LazyCatalogCache::new(&catalog);
            first.item_at(1, 1).unwrap();
        }
        let mut second = LazyCatalogCache::new(&catalog);
        second.item_at(1, 1).unwrap();
        assert_eq!(catalog.lookups.get(), 2);
        assert_eq!(second.hits(), 0);
    }
}
