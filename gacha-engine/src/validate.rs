//! Structural and referential checks run before any draw.
use thiserror::Error;

use crate::catalog::Catalog;
use crate::constants::MAX_CONSECUTIVE_GACHAS;
use crate::error::GachaError;
use crate::goals::GoalMap;
use crate::model::{ItemId, Plan, Policies, Pricing, Request, TierId, len_u64};

/// Errors raised when a draw request violates its invariants.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("tiers empty")]
    EmptyTiers,
    #[error("tier {tier_id} has negative ratio {ratio}")]
    NegativeTierRatio { tier_id: TierId, ratio: i64 },
    #[error("tier {tier_id} has no items")]
    EmptyTierItems { tier_id: TierId },
    #[error("item {item_id} has negative ratio {ratio}")]
    NegativeItemRatio { item_id: ItemId, ratio: i64 },
    #[error("some tier not found ({found} of {requested} exist)")]
    UnknownTiers { requested: u64, found: u64 },
    #[error("some item not found ({found} of {requested} exist)")]
    UnknownItems { requested: u64, found: u64 },
    #[error("tier ratios sum to zero")]
    ZeroTierRatio,
    #[error("item ratios sum to zero")]
    ZeroItemRatio,
    #[error("{field} must be non-negative (got {value})")]
    NegativeMoney { field: &'static str, value: f64 },
    #[error("discount trigger must be positive (got {trigger})")]
    NonPositiveDiscountTrigger { trigger: i64 },
    #[error("discounted price {discounted} exceeds price per gacha {price}")]
    DiscountAbovePrice { discounted: f64, price: f64 },
    #[error("pity trigger must be non-negative (got {trigger})")]
    NegativePityTrigger { trigger: i64 },
    #[error("pity item empty")]
    MissingPityItem,
    #[error("pity item {item_id} not found")]
    UnknownPityItem { item_id: ItemId },
    #[error("max consecutive gachas must be between 0 and {limit} (got {value})")]
    MaxConsecutiveGachasOutOfRange { value: i64, limit: i64 },
    #[error("{kind} goals enabled but no {kind} wanted")]
    EmptyGoals { kind: GoalKind },
    #[error("wanted {kind} {id} has negative count {count}")]
    NegativeGoalCount { kind: GoalKind, id: u64, count: i64 },
    #[error("some wanted {kind} not found ({found} of {requested} exist)")]
    UnknownGoalTargets {
        kind: GoalKind,
        requested: u64,
        found: u64,
    },
}

/// Which goal map a plan error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalKind {
    Item,
    Tier,
}

impl std::fmt::Display for GoalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Item => "item",
            Self::Tier => "tier",
        })
    }
}

/// Check a request against its structural rules and the catalogue.
///
/// Checks run in a fixed order and stop at the first failure. Nothing in the
/// request is modified.
///
/// # Errors
///
/// Returns [`GachaError::Validation`] naming the violated rule, or
/// [`GachaError::Catalog`] when an existence lookup fails.
pub fn validate<C>(request: &Request, catalog: &C) -> Result<(), GachaError<C::Error>>
where
    C: Catalog + ?Sized,
{
    validate_tiers_and_items(request, catalog)?;
    validate_pricing(&request.pricing)?;
    validate_policies(&request.policies, catalog)?;
    validate_plan(&request.plan, catalog)?;
    Ok(())
}

fn validate_tiers_and_items<C>(request: &Request, catalog: &C) -> Result<(), GachaError<C::Error>>
where
    C: Catalog + ?Sized,
{
    if request.tiers.is_empty() {
        return Err(ValidationError::EmptyTiers.into());
    }
    let mut tier_ratio_sum: i64 = 0;
    let mut item_ratio_sum: i64 = 0;
    for tier in &request.tiers {
        if tier.ratio < 0 {
            return Err(ValidationError::NegativeTierRatio {
                tier_id: tier.id,
                ratio: tier.ratio,
            }
            .into());
        }
        tier_ratio_sum = tier_ratio_sum.saturating_add(tier.ratio);
        if request.items_included {
            if tier.items.is_empty() {
                return Err(ValidationError::EmptyTierItems { tier_id: tier.id }.into());
            }
            for item in &tier.items {
                if item.ratio < 0 {
                    return Err(ValidationError::NegativeItemRatio {
                        item_id: item.id,
                        ratio: item.ratio,
                    }
                    .into());
                }
                item_ratio_sum = item_ratio_sum.saturating_add(item.ratio);
            }
        }
    }

    let tier_ids = request.tier_ids();
    let found = catalog
        .count_tiers_by_ids(&tier_ids)
        .map_err(GachaError::Catalog)?;
    if found != len_u64(tier_ids.len()) {
        return Err(ValidationError::UnknownTiers {
            requested: len_u64(tier_ids.len()),
            found,
        }
        .into());
    }
    if request.items_included {
        let item_ids = request.item_ids();
        let found = catalog
            .count_items_by_ids(&item_ids)
            .map_err(GachaError::Catalog)?;
        if found != len_u64(item_ids.len()) {
            return Err(ValidationError::UnknownItems {
                requested: len_u64(item_ids.len()),
                found,
            }
            .into());
        }
    }

    if tier_ratio_sum == 0 {
        return Err(ValidationError::ZeroTierRatio.into());
    }
    if request.items_included && item_ratio_sum == 0 {
        return Err(ValidationError::ZeroItemRatio.into());
    }
    Ok(())
}

fn validate_pricing(pricing: &Pricing) -> Result<(), ValidationError> {
    ensure_non_negative("price per gacha", pricing.price_per_gacha)?;
    if pricing.discount {
        if pricing.discount_trigger <= 0 {
            return Err(ValidationError::NonPositiveDiscountTrigger {
                trigger: pricing.discount_trigger,
            });
        }
        ensure_non_negative(
            "discounted price per gacha",
            pricing.discounted_price_per_gacha,
        )?;
        if pricing.discounted_price_per_gacha > pricing.price_per_gacha {
            return Err(ValidationError::DiscountAbovePrice {
                discounted: pricing.discounted_price_per_gacha,
                price: pricing.price_per_gacha,
            });
        }
    }
    Ok(())
}

fn validate_policies<C>(policies: &Policies, catalog: &C) -> Result<(), GachaError<C::Error>>
where
    C: Catalog + ?Sized,
{
    if !policies.pity {
        return Ok(());
    }
    if policies.pity_trigger < 0 {
        return Err(ValidationError::NegativePityTrigger {
            trigger: policies.pity_trigger,
        }
        .into());
    }
    let Some(pity_item) = &policies.pity_item else {
        return Err(ValidationError::MissingPityItem.into());
    };
    if catalog
        .item_by_id(pity_item.id)
        .map_err(GachaError::Catalog)?
        .is_none()
    {
        return Err(ValidationError::UnknownPityItem {
            item_id: pity_item.id,
        }
        .into());
    }
    Ok(())
}

fn validate_plan<C>(plan: &Plan, catalog: &C) -> Result<(), GachaError<C::Error>>
where
    C: Catalog + ?Sized,
{
    ensure_non_negative("budget", plan.budget)?;
    if !(0..=MAX_CONSECUTIVE_GACHAS).contains(&plan.max_consecutive_gachas) {
        return Err(ValidationError::MaxConsecutiveGachasOutOfRange {
            value: plan.max_consecutive_gachas,
            limit: MAX_CONSECUTIVE_GACHAS,
        }
        .into());
    }
    if plan.item_goals {
        validate_goals(GoalKind::Item, &plan.wanted_items, |ids| {
            catalog.count_items_by_ids(ids)
        })?;
    }
    if plan.tier_goals {
        validate_goals(GoalKind::Tier, &plan.wanted_tiers, |ids| {
            catalog.count_tiers_by_ids(ids)
        })?;
    }
    Ok(())
}

fn validate_goals<E, F>(kind: GoalKind, wanted: &GoalMap, count_existing: F) -> Result<(), GachaError<E>>
where
    E: std::error::Error + 'static,
    F: FnOnce(&[u64]) -> Result<u64, E>,
{
    if wanted.is_empty() {
        return Err(ValidationError::EmptyGoals { kind }.into());
    }
    if let Some((id, count)) = wanted.iter().find(|(_, count)| *count < 0) {
        return Err(ValidationError::NegativeGoalCount { kind, id, count }.into());
    }
    let ids = wanted.ids();
    let found = count_existing(&ids).map_err(GachaError::Catalog)?;
    if found != len_u64(ids.len()) {
        return Err(ValidationError::UnknownGoalTargets {
            kind,
            requested: len_u64(ids.len()),
            found,
        }
        .into());
    }
    Ok(())
}

// NaN fails the comparison and is rejected with the negatives.
fn ensure_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NegativeMoney { field, value })
    }
}
