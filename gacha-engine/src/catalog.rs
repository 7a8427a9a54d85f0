//! Read-only catalogue lookups supplied by the surrounding service.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::model::{Item, ItemId, Tier, TierId, len_u64};

/// Lookups the engine needs from whoever owns the catalogue.
/// Persistence-specific implementations should provide this.
pub trait Catalog {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Number of items stored under a tier.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn item_count_in_tier(&self, tier_id: TierId) -> Result<u64, Self::Error>;

    /// Item at a stable position within a tier, with its owning tier set.
    ///
    /// # Errors
    ///
    /// Returns an error if the tier or position does not exist or the lookup fails.
    fn item_at_index(&self, tier_id: TierId, index: u64) -> Result<Item, Self::Error>;

    /// Item by identity, or `None` when the catalogue has no such item.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn item_by_id(&self, item_id: ItemId) -> Result<Option<Item>, Self::Error>;

    /// How many of the given identities name existing items.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn count_items_by_ids(&self, ids: &[ItemId]) -> Result<u64, Self::Error>;

    /// How many of the given identities name existing tiers.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn count_tiers_by_ids(&self, ids: &[TierId]) -> Result<u64, Self::Error>;
}

impl<C: Catalog + ?Sized> Catalog for &C {
    type Error = C::Error;

    fn item_count_in_tier(&self, tier_id: TierId) -> Result<u64, Self::Error> {
        (**self).item_count_in_tier(tier_id)
    }

    fn item_at_index(&self, tier_id: TierId, index: u64) -> Result<Item, Self::Error> {
        (**self).item_at_index(tier_id, index)
    }

    fn item_by_id(&self, item_id: ItemId) -> Result<Option<Item>, Self::Error> {
        (**self).item_by_id(item_id)
    }

    fn count_items_by_ids(&self, ids: &[ItemId]) -> Result<u64, Self::Error> {
        (**self).count_items_by_ids(ids)
    }

    fn count_tiers_by_ids(&self, ids: &[TierId]) -> Result<u64, Self::Error> {
        (**self).count_tiers_by_ids(ids)
    }
}

/// Failures reported by [`MemoryCatalog`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("tier {0} not found")]
    UnknownTier(TierId),
    #[error("tier {tier_id} has {count} items, index {index} is out of range")]
    IndexOutOfRange {
        tier_id: TierId,
        index: u64,
        count: u64,
    },
}

/// On-disk shape of a catalogue fixture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub tiers: Vec<Tier>,
}

/// Catalogue held entirely in memory.
///
/// Items within a tier are ordered by identity, which fixes the meaning of a
/// position for [`Catalog::item_at_index`]. Existence counts ignore repeated
/// identities, the way a `WHERE id IN (...)` count would.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    tiers: BTreeMap<TierId, Vec<Item>>,
    items: BTreeMap<ItemId, Item>,
}

impl MemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from tiers with embedded items; items are linked to their tier.
    #[must_use]
    pub fn from_tiers(tiers: &[Tier]) -> Self {
        let mut catalog = Self::new();
        for tier in tiers {
            catalog.insert_tier(tier);
        }
        catalog
    }

    /// Decode a [`CatalogData`] fixture.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let data: CatalogData = serde_json::from_str(json)?;
        Ok(Self::from_tiers(&data.tiers))
    }

    /// Add or replace a tier and its items.
    pub fn insert_tier(&mut self, tier: &Tier) {
        let mut items: Vec<Item> = tier
            .items
            .iter()
            .map(|item| Item {
                tier_id: Some(tier.id),
                ..item.clone()
            })
            .collect();
        items.sort_by_key(|item| item.id);
        for item in &items {
            self.items.insert(item.id, item.clone());
        }
        self.tiers.insert(tier.id, items);
    }

    #[must_use]
    pub fn tier_count(&self) -> usize {
        self.tiers.len()
    }

    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

impl Catalog for MemoryCatalog {
    type Error = CatalogError;

    fn item_count_in_tier(&self, tier_id: TierId) -> Result<u64, Self::Error> {
        self.tiers
            .get(&tier_id)
            .map(|items| len_u64(items.len()))
            .ok_or(CatalogError::UnknownTier(tier_id))
    }

    fn item_at_index(&self, tier_id: TierId, index: u64) -> Result<Item, Self::Error> {
        let items = self
            .tiers
            .get(&tier_id)
            .ok_or(CatalogError::UnknownTier(tier_id))?;
        usize::try_from(index)
            .ok()
            .and_then(|idx| items.get(idx))
            .cloned()
            .ok_or(CatalogError::IndexOutOfRange {
                tier_id,
                index,
                count: len_u64(items.len()),
            })
    }

    fn item_by_id(&self, item_id: ItemId) -> Result<Option<Item>, Self::Error> {
        Ok(self.items.get(&item_id).cloned())
    }

    fn count_items_by_ids(&self, ids: &[ItemId]) -> Result<u64, Self::Error> {
        let found: BTreeSet<&ItemId> = ids
            .iter()
            .filter(|id| self.items.contains_key(*id))
            .collect();
        Ok(len_u64(found.len()))
    }

    fn count_tiers_by_ids(&self, ids: &[TierId]) -> Result<u64, Self::Error> {
        let found: BTreeSet<&TierId> = ids
            .iter()
            .filter(|id| self.tiers.contains_key(*id))
            .collect();
        Ok(len_u64(found.len()))
    }
}
