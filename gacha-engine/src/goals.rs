//! Goal maps and the running tally that decides early termination.
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

use crate::model::{Item, ItemId, Plan, TierId};

/// Raised when a goal map names the same identity twice.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("goal identity {id} is listed more than once")]
pub struct DuplicateGoal {
    pub id: u64,
}

/// Required counts keyed by item or tier identity, kept in identity order.
///
/// Decoding rejects repeated keys rather than letting the last one win.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct GoalMap(BTreeMap<u64, i64>);

impl GoalMap {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Build a map from `(identity, required)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateGoal`] for the first identity that appears twice.
    pub fn try_from_pairs<I>(pairs: I) -> Result<Self, DuplicateGoal>
    where
        I: IntoIterator<Item = (u64, i64)>,
    {
        let mut map = BTreeMap::new();
        for (id, required) in pairs {
            if map.insert(id, required).is_some() {
                return Err(DuplicateGoal { id });
            }
        }
        Ok(Self(map))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: u64) -> bool {
        self.0.contains_key(&id)
    }

    /// Identities in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<u64> {
        self.0.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, i64)> + '_ {
        self.0.iter().map(|(id, required)| (*id, *required))
    }
}

impl From<BTreeMap<u64, i64>> for GoalMap {
    fn from(map: BTreeMap<u64, i64>) -> Self {
        Self(map)
    }
}

impl<'de> Deserialize<'de> for GoalMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_option(GoalMapVisitor)
    }
}

struct GoalMapVisitor;

impl<'de> Visitor<'de> for GoalMapVisitor {
    type Value = GoalMap;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of identity to required count")
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(GoalMap::new())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(GoalMap::new())
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(self)
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut map = BTreeMap::new();
        while let Some((id, required)) = access.next_entry::<u64, i64>()? {
            if map.insert(id, required).is_some() {
                return Err(de::Error::custom(DuplicateGoal { id }));
            }
        }
        Ok(GoalMap(map))
    }
}

/// Running per-identity counts for the goals a plan switches on.
#[derive(Debug, Clone)]
pub struct GoalTracker<'a> {
    wanted_items: Option<&'a GoalMap>,
    wanted_tiers: Option<&'a GoalMap>,
    item_counts: HashMap<ItemId, i64>,
    tier_counts: HashMap<TierId, i64>,
}

impl<'a> GoalTracker<'a> {
    #[must_use]
    pub fn from_plan(plan: &'a Plan) -> Self {
        Self {
            wanted_items: plan.item_goals.then_some(&plan.wanted_items),
            wanted_tiers: plan.tier_goals.then_some(&plan.wanted_tiers),
            item_counts: HashMap::new(),
            tier_counts: HashMap::new(),
        }
    }

    /// Whether any goal kind is active; without one the plan never ends early.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.wanted_items.is_some() || self.wanted_tiers.is_some()
    }

    /// Count one drawn item toward the active goals.
    pub fn record(&mut self, item: &Item) {
        if let Some(wanted) = self.wanted_items
            && wanted.contains(item.id)
        {
            *self.item_counts.entry(item.id).or_default() += 1;
        }
        if let (Some(wanted), Some(tier_id)) = (self.wanted_tiers, item.tier_id)
            && wanted.contains(tier_id)
        {
            *self.tier_counts.entry(tier_id).or_default() += 1;
        }
    }

    /// True once every configured goal count has been reached.
    #[must_use]
    pub fn is_met(&self) -> bool {
        self.is_configured()
            && goals_met(self.wanted_items, &self.item_counts)
            && goals_met(self.wanted_tiers, &self.tier_counts)
    }
}

fn goals_met(wanted: Option<&GoalMap>, counts: &HashMap<u64, i64>) -> bool {
    wanted.is_none_or(|wanted| {
        wanted
            .iter()
            .all(|(id, required)| counts.get(&id).copied().unwrap_or(0) >= required)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goals(pairs: &[(u64, i64)]) -> GoalMap {
        GoalMap::try_from_pairs(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn duplicate_pairs_are_rejected() {
        let err = GoalMap::try_from_pairs([(4, 1), (5, 2), (4, 3)]).unwrap_err();
        assert_eq!(err, DuplicateGoal { id: 4 });
    }

    #[test]
    fn duplicate_json_keys_fail_to_decode() {
        let err = serde_json::from_str::<GoalMap>(r#"{ "7": 1, "7": 2 }"#).unwrap_err();
        assert!(err.to_string().contains("listed more than once"));
    }

    #[test]
    fn null_decodes_as_empty() {
        let map: GoalMap = serde_json::from_str("null").unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn serializes_as_object_keyed_by_identity() {
        let json = serde_json::to_string(&goals(&[(2, 1), (10, 3)])).unwrap();
        assert_eq!(json, r#"{"2":1,"10":3}"#);
    }

    #[test]
    fn tracker_without_goals_never_completes() {
        let plan = Plan::new(100.0, 10);
        let mut tracker = GoalTracker::from_plan(&plan);
        tracker.record(&Item::new(1, 1).in_tier(1));
        assert!(!tracker.is_configured());
        assert!(!tracker.is_met());
    }

    #[test]
    fn tracker_requires_item_and_tier_goals_together() {
        let plan = Plan::new(100.0, 10)
            .with_item_goals(goals(&[(1, 2)]))
            .with_tier_goals(goals(&[(9, 1)]));
        let mut tracker = GoalTracker::from_plan(&plan);

        tracker.record(&Item::new(1, 1).in_tier(3));
        tracker.record(&Item::new(1, 1).in_tier(3));
        assert!(!tracker.is_met(), "tier 9 still missing");

        tracker.record(&Item::new(5, 1).in_tier(9));
        assert!(tracker.is_met());
    }

    #[test]
    fn zero_required_count_is_met_immediately() {
        let plan = Plan::new(100.0, 10).with_tier_goals(goals(&[(2, 0)]));
        let tracker = GoalTracker::from_plan(&plan);
        assert!(tracker.is_met());
    }

    #[test]
    fn disabled_goal_kind_ignores_its_map() {
        let mut plan = Plan::new(100.0, 10).with_item_goals(goals(&[(1, 1)]));
        plan.wanted_tiers = goals(&[(8, 5)]);
        let mut tracker = GoalTracker::from_plan(&plan);
        tracker.record(&Item::new(1, 1).in_tier(2));
        assert!(tracker.is_met());
    }
}
