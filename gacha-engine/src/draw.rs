//! The draw loop: preparation, pity, budget ceiling and goal stop.
use crate::cache::LazyCatalogCache;
use crate::catalog::Catalog;
use crate::error::{GachaError, SimulationError};
use crate::goals::GoalTracker;
use crate::model::{DrawResult, Item, Request, TierId, len_u64};
use crate::rng::RandomSource;
use crate::selector::WeightedTable;
use crate::validate::ValidationError;

/// Where a tier's items come from during the loop.
#[derive(Debug, Clone)]
enum TierPool {
    Embedded(WeightedTable<Item>),
    Lazy { item_count: u64 },
}

#[derive(Debug, Clone)]
struct PreparedTier {
    id: TierId,
    pool: TierPool,
}

#[derive(Debug, Clone)]
struct PityRule {
    trigger: u64,
    item: Item,
}

/// Selection tables and pity rule resolved once before drawing.
#[derive(Debug, Clone)]
struct PreparedDraw {
    tiers: WeightedTable<PreparedTier>,
    pity: Option<PityRule>,
}

/// Run one simulation without validating the request first.
///
/// Draws stop when the next draw would exceed the budget, when
/// `max_consecutive_gachas` draws have been made, or when every configured
/// goal is met. Money spent is always the price of the draws performed.
///
/// # Errors
///
/// Returns [`GachaError::Simulation`] when preparation finds an empty tier pool
/// or an unresolvable pity item, or when a drawn tier has no item with a
/// positive ratio. Returns [`GachaError::Catalog`] when a lookup fails.
/// No partial result is produced.
pub fn execute<C, R>(
    request: &Request,
    catalog: &C,
    rng: &mut R,
) -> Result<DrawResult, GachaError<C::Error>>
where
    C: Catalog + ?Sized,
    R: RandomSource + ?Sized,
{
    let prepared = prepare(request, catalog)?;
    let plan = &request.plan;
    let max_draws = u64::try_from(plan.max_consecutive_gachas).unwrap_or(0);
    log::debug!(
        "simulation start: {} tiers, max {max_draws} draws, budget {}",
        prepared.tiers.len(),
        plan.budget
    );

    let mut cache = LazyCatalogCache::new(catalog);
    let mut goals = GoalTracker::from_plan(plan);
    let mut items: Vec<Item> = Vec::new();
    let mut pity_drawn = false;
    let mut goals_achieved = false;

    for draw in 1..=max_draws {
        if request.pricing.exceeds_budget(draw, plan.budget) {
            log::debug!("draw {draw} would exceed budget {}", plan.budget);
            break;
        }

        let item = match &prepared.pity {
            Some(rule) if !pity_drawn && draw >= rule.trigger => {
                log::debug!("draw {draw}: pity forces item {}", rule.item.id);
                rule.item.clone()
            }
            _ => draw_weighted(&prepared.tiers, &mut cache, rng)?,
        };
        log::trace!("draw {draw}: item {} from tier {:?}", item.id, item.tier_id);

        if let Some(rule) = &prepared.pity
            && rule.item.id == item.id
        {
            pity_drawn = true;
        }
        goals.record(&item);
        items.push(item);

        if goals.is_met() {
            log::debug!("goals achieved after {draw} draws");
            goals_achieved = true;
            break;
        }
    }

    log::debug!(
        "simulation finished: {} draws, cache {} hits / {} misses",
        items.len(),
        cache.hits(),
        cache.misses()
    );
    let money_spent = request.pricing.price(len_u64(items.len()));
    Ok(DrawResult {
        items,
        goals_achieved,
        money_spent,
    })
}

fn draw_weighted<C, R>(
    tiers: &WeightedTable<PreparedTier>,
    cache: &mut LazyCatalogCache<'_, C>,
    rng: &mut R,
) -> Result<Item, GachaError<C::Error>>
where
    C: Catalog + ?Sized,
    R: RandomSource + ?Sized,
{
    let tier = tiers.pick(rng).ok_or(SimulationError::EmptyTierPool)?;
    match &tier.pool {
        TierPool::Embedded(table) => table
            .pick(rng)
            .cloned()
            .ok_or_else(|| SimulationError::EmptyItemPool { tier_id: tier.id }.into()),
        TierPool::Lazy { item_count } => {
            let index = rng.below(*item_count);
            cache
                .item_at(tier.id, index)
                .cloned()
                .map_err(GachaError::Catalog)
        }
    }
}

fn prepare<C>(request: &Request, catalog: &C) -> Result<PreparedDraw, GachaError<C::Error>>
where
    C: Catalog + ?Sized,
{
    let mut prepared_tiers = Vec::with_capacity(request.tiers.len());
    for tier in request.tiers.iter().filter(|tier| tier.ratio > 0) {
        let pool = if request.items_included {
            // An empty table only fails once the tier is actually drawn.
            TierPool::Embedded(WeightedTable::new(
                tier.items
                    .iter()
                    .map(|item| (item.ratio, item.clone().with_default_tier(tier.id))),
            ))
        } else {
            let item_count = if tier.item_count > 0 {
                tier.item_count
            } else {
                catalog
                    .item_count_in_tier(tier.id)
                    .map_err(GachaError::Catalog)?
            };
            if item_count == 0 {
                return Err(SimulationError::EmptyLazyTier { tier_id: tier.id }.into());
            }
            log::debug!("tier {} resolved lazily with {item_count} items", tier.id);
            TierPool::Lazy { item_count }
        };
        prepared_tiers.push((tier.ratio, PreparedTier { id: tier.id, pool }));
    }

    let tiers = WeightedTable::new(prepared_tiers);
    if tiers.is_empty() {
        return Err(SimulationError::EmptyTierPool.into());
    }
    let pity = resolve_pity(request, catalog)?;
    Ok(PreparedDraw { tiers, pity })
}

fn resolve_pity<C>(request: &Request, catalog: &C) -> Result<Option<PityRule>, GachaError<C::Error>>
where
    C: Catalog + ?Sized,
{
    let policies = &request.policies;
    if !policies.pity {
        return Ok(None);
    }
    let Some(designated) = &policies.pity_item else {
        return Err(ValidationError::MissingPityItem.into());
    };

    let embedded = request
        .items_included
        .then(|| {
            request.tiers.iter().find_map(|tier| {
                tier.items
                    .iter()
                    .find(|item| item.id == designated.id)
                    .map(|item| item.clone().with_default_tier(tier.id))
            })
        })
        .flatten();
    let item = match embedded {
        Some(item) => item,
        None => catalog
            .item_by_id(designated.id)
            .map_err(GachaError::Catalog)?
            .ok_or(SimulationError::UnknownPityItem {
                item_id: designated.id,
            })?,
    };
    if item.tier_id.is_none() {
        return Err(SimulationError::PityItemWithoutTier { item_id: item.id }.into());
    }

    Ok(Some(PityRule {
        trigger: u64::try_from(policies.pity_trigger).unwrap_or(0),
        item,
    }))
}

impl Item {
    // Keeps an owning tier the caller already set.
    fn with_default_tier(mut self, tier_id: TierId) -> Self {
        self.tier_id.get_or_insert(tier_id);
        self
    }
}
