//! Request and result shapes exchanged with the surrounding service.
//!
//! Field names follow the JSON wire contract (`camelCase`). Weights, counts and
//! triggers stay signed so malformed input reaches the validator intact instead
//! of failing to decode.
use serde::{Deserialize, Deserializer, Serialize};

use crate::goals::GoalMap;

/// Catalogue identity of a drawable item.
pub type ItemId = u64;
/// Catalogue identity of a tier.
pub type TierId = u64;

/// A drawable unit with its selection weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    #[serde(default)]
    pub ratio: i64,
    /// Owning tier. Linked by the engine (or the catalogue) before drawing.
    #[serde(skip)]
    pub tier_id: Option<TierId>,
}

impl Item {
    #[must_use]
    pub const fn new(id: ItemId, ratio: i64) -> Self {
        Self {
            id,
            ratio,
            tier_id: None,
        }
    }

    /// Attach the owning tier.
    #[must_use]
    pub const fn in_tier(mut self, tier_id: TierId) -> Self {
        self.tier_id = Some(tier_id);
        self
    }
}

/// Weighted grouping of items; first stage of the two-stage draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    pub id: TierId,
    #[serde(default)]
    pub ratio: i64,
    /// Embedded items. Empty when items are resolved lazily from the catalogue.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<Item>,
    /// Known item count for lazily resolved tiers; zero means "ask the catalogue".
    #[serde(skip)]
    pub item_count: u64,
}

impl Tier {
    /// Tier with embedded items.
    #[must_use]
    pub const fn new(id: TierId, ratio: i64, items: Vec<Item>) -> Self {
        Self {
            id,
            ratio,
            items,
            item_count: 0,
        }
    }

    /// Tier whose items live only in the external catalogue.
    #[must_use]
    pub const fn lazy(id: TierId, ratio: i64) -> Self {
        Self::new(id, ratio, Vec::new())
    }
}

/// Per-draw cost with an optional bulk discount.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pricing {
    pub price_per_gacha: f64,
    pub discount: bool,
    /// Block size at which the discounted price applies.
    pub discount_trigger: i64,
    pub discounted_price_per_gacha: f64,
}

impl Pricing {
    /// Flat pricing with no discount.
    #[must_use]
    pub const fn flat(price_per_gacha: f64) -> Self {
        Self {
            price_per_gacha,
            discount: false,
            discount_trigger: 0,
            discounted_price_per_gacha: 0.0,
        }
    }

    /// Enable the bulk discount for every full block of `trigger` draws.
    #[must_use]
    pub const fn with_discount(mut self, trigger: i64, discounted_price: f64) -> Self {
        self.discount = true;
        self.discount_trigger = trigger;
        self.discounted_price_per_gacha = discounted_price;
        self
    }
}

/// Pity rule forcing a designated item once the trigger draw is reached.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Policies {
    pub pity: bool,
    pub pity_trigger: i64,
    pub pity_item: Option<Item>,
}

impl Policies {
    #[must_use]
    pub const fn pity(trigger: i64, item: Item) -> Self {
        Self {
            pity: true,
            pity_trigger: trigger,
            pity_item: Some(item),
        }
    }
}

/// Spending ceiling, draw ceiling and optional goals.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Plan {
    pub budget: f64,
    pub max_consecutive_gachas: i64,
    pub item_goals: bool,
    pub wanted_items: GoalMap,
    pub tier_goals: bool,
    pub wanted_tiers: GoalMap,
}

impl Plan {
    #[must_use]
    pub fn new(budget: f64, max_consecutive_gachas: i64) -> Self {
        Self {
            budget,
            max_consecutive_gachas,
            ..Self::default()
        }
    }

    /// Require the given item counts before stopping early.
    #[must_use]
    pub fn with_item_goals(mut self, wanted: GoalMap) -> Self {
        self.item_goals = true;
        self.wanted_items = wanted;
        self
    }

    /// Require the given tier counts before stopping early.
    #[must_use]
    pub fn with_tier_goals(mut self, wanted: GoalMap) -> Self {
        self.tier_goals = true;
        self.wanted_tiers = wanted;
        self
    }

    /// Whether either goal kind is switched on.
    #[must_use]
    pub const fn has_goals(&self) -> bool {
        self.item_goals || self.tier_goals
    }
}

/// Full draw request as received from the caller.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Request {
    pub tiers: Vec<Tier>,
    /// True when every tier carries its items inline.
    pub items_included: bool,
    pub pricing: Pricing,
    pub policies: Policies,
    pub plan: Plan,
}

impl Request {
    /// Decode a request from its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a goal map repeats an identity.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// All tier identities in request order.
    #[must_use]
    pub fn tier_ids(&self) -> Vec<TierId> {
        self.tiers.iter().map(|tier| tier.id).collect()
    }

    /// All embedded item identities in request order.
    #[must_use]
    pub fn item_ids(&self) -> Vec<ItemId> {
        self.tiers
            .iter()
            .flat_map(|tier| tier.items.iter().map(|item| item.id))
            .collect()
    }
}

/// Outcome of one simulation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawResult {
    pub items: Vec<Item>,
    pub goals_achieved: bool,
    pub money_spent: f64,
}

impl DrawResult {
    /// Number of draws performed.
    #[must_use]
    pub fn draws(&self) -> u64 {
        len_u64(self.items.len())
    }

    /// Drawn identities in draw order.
    #[must_use]
    pub fn item_ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|item| item.id).collect()
    }
}

/// Collection length as a `u64` count.
pub(crate) fn len_u64(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn decodes_wire_request() {
        let json = r#"{
            "tiers": [
                { "id": 1, "ratio": 9, "items": [{ "id": 1, "ratio": 2 }, { "id": 2, "ratio": 1 }] },
                { "id": 2, "ratio": 1, "items": null }
            ],
            "itemsIncluded": true,
            "pricing": { "pricePerGacha": 100, "discount": true, "discountTrigger": 3, "discountedPricePerGacha": 90 },
            "policies": { "pity": true, "pityTrigger": 3, "pityItem": { "id": 3 } },
            "plan": { "budget": 500, "maxConsecutiveGachas": 4, "itemGoals": true, "wantedItems": { "3": 2 } }
        }"#;
        let request = Request::from_json(json).unwrap();
        assert_eq!(request.tier_ids(), vec![1, 2]);
        assert_eq!(request.item_ids(), vec![1, 2]);
        assert!(request.tiers[1].items.is_empty());
        assert!(request.pricing.discount);
        assert_eq!(request.pricing.discount_trigger, 3);
        assert_eq!(request.policies.pity_item, Some(Item::new(3, 0)));
        assert!(request.plan.item_goals);
        assert!(!request.plan.tier_goals);
        assert_eq!(
            request.plan.wanted_items,
            GoalMap::from(BTreeMap::from([(3, 2)]))
        );
        assert!(request.plan.wanted_tiers.is_empty());
    }

    #[test]
    fn result_serializes_with_wire_names() {
        let result = DrawResult {
            items: vec![Item::new(7, 1).in_tier(2)],
            goals_achieved: true,
            money_spent: 270.0,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "items": [{ "id": 7, "ratio": 1 }],
                "goalsAchieved": true,
                "moneySpent": 270.0
            })
        );
    }

    #[test]
    fn draws_counts_every_item() {
        let result = DrawResult {
            items: vec![Item::new(1, 1), Item::new(1, 1), Item::new(2, 1)],
            ..DrawResult::default()
        };
        assert_eq!(result.draws(), 3);
        assert_eq!(DrawResult::default().draws(), 0);
        assert_eq!(len_u64(7), 7);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let request = Request::from_json(r#"{ "tiers": [{ "id": 4 }] }"#).unwrap();
        assert_eq!(request.tiers, vec![Tier::lazy(4, 0)]);
        assert!(!request.items_included);
        assert_eq!(request.pricing, Pricing::default());
        assert!(!request.policies.pity);
        assert!(!request.plan.has_goals());
    }
}
