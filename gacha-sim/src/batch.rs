//! Seeded batch runs and their aggregate statistics.
use anyhow::{Context, Result};
use gacha_engine::{Catalog, DrawResult, GachaEngine, ItemId, Request, SeededSource};
use serde::Serialize;
use std::collections::BTreeMap;

/// One simulation inside a batch.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub seed: u64,
    pub iteration: u64,
    pub result: DrawResult,
}

/// Aggregate view over every run of a batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub seeds: Vec<u64>,
    pub runs: usize,
    pub goals_achieved: usize,
    pub goal_rate: f64,
    pub mean_spent: f64,
    pub std_spent: f64,
    pub min_spent: f64,
    pub max_spent: f64,
    pub mean_draws: f64,
    pub total_draws: u64,
    pub item_frequency: BTreeMap<ItemId, u64>,
}

impl BatchSummary {
    /// Share of all drawn items that were `item_id`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn item_share(&self, item_id: ItemId) -> f64 {
        if self.total_draws == 0 {
            return 0.0;
        }
        let count = self.item_frequency.get(&item_id).copied().unwrap_or(0);
        count as f64 / self.total_draws as f64
    }
}

/// Outcome of [`run_batch`]: the summary, plus the per-run results when kept.
#[derive(Debug, Clone)]
pub struct BatchRun {
    pub summary: BatchSummary,
    pub outcomes: Vec<RunOutcome>,
}

/// Run the request `iterations` times for every seed.
///
/// The request is expected to be validated already; each run gets its own
/// stream derived from its seed and iteration index. Runs are folded into the
/// summary as they finish, and only retained when `keep_outcomes` is set.
pub fn run_batch<C>(
    engine: &GachaEngine<C>,
    request: &Request,
    seeds: &[u64],
    iterations: u64,
    keep_outcomes: bool,
) -> Result<BatchRun>
where
    C: Catalog,
{
    let mut builder = SummaryBuilder::new(seeds);
    let mut outcomes = Vec::new();
    for &seed in seeds {
        for iteration in 0..iterations {
            let mut rng = SeededSource::for_run(seed, iteration);
            let result = engine
                .execute(request, &mut rng)
                .with_context(|| format!("simulation failed for seed {seed} run {iteration}"))?;
            log::debug!(
                "seed {seed} run {iteration}: {} draws, {} spent, goals {}",
                result.draws(),
                result.money_spent,
                result.goals_achieved
            );
            builder.ingest(&result);
            if keep_outcomes {
                outcomes.push(RunOutcome {
                    seed,
                    iteration,
                    result,
                });
            }
        }
    }
    Ok(BatchRun {
        summary: builder.finish(),
        outcomes,
    })
}

/// Streaming accumulator behind [`BatchSummary`].
#[derive(Debug)]
pub struct SummaryBuilder {
    seeds: Vec<u64>,
    runs: usize,
    spent: RunningStats,
    draws: RunningStats,
    min_spent: f64,
    max_spent: f64,
    goals_achieved: usize,
    total_draws: u64,
    item_frequency: BTreeMap<ItemId, u64>,
}

impl SummaryBuilder {
    pub fn new(seeds: &[u64]) -> Self {
        Self {
            seeds: seeds.to_vec(),
            runs: 0,
            spent: RunningStats::default(),
            draws: RunningStats::default(),
            min_spent: f64::INFINITY,
            max_spent: f64::NEG_INFINITY,
            goals_achieved: 0,
            total_draws: 0,
            item_frequency: BTreeMap::new(),
        }
    }

    pub fn ingest(&mut self, result: &DrawResult) {
        self.runs += 1;
        self.spent.add(result.money_spent);
        #[allow(clippy::cast_precision_loss)]
        self.draws.add(result.draws() as f64);
        self.min_spent = self.min_spent.min(result.money_spent);
        self.max_spent = self.max_spent.max(result.money_spent);
        self.total_draws = self.total_draws.saturating_add(result.draws());
        if result.goals_achieved {
            self.goals_achieved += 1;
        }
        for item in &result.items {
            *self.item_frequency.entry(item.id).or_default() += 1;
        }
    }

    pub fn finish(self) -> BatchSummary {
        #[allow(clippy::cast_precision_loss)]
        let goal_rate = if self.runs == 0 {
            0.0
        } else {
            self.goals_achieved as f64 / self.runs as f64
        };
        BatchSummary {
            seeds: self.seeds,
            runs: self.runs,
            goals_achieved: self.goals_achieved,
            goal_rate,
            mean_spent: self.spent.mean(),
            std_spent: self.spent.std_dev(),
            min_spent: if self.min_spent.is_finite() { self.min_spent } else { 0.0 },
            max_spent: if self.max_spent.is_finite() { self.max_spent } else { 0.0 },
            mean_draws: self.draws.mean(),
            total_draws: self.total_draws,
            item_frequency: self.item_frequency,
        }
    }
}

#[derive(Debug, Default)]
struct RunningStats {
    count: u32,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    fn add(&mut self, value: f64) {
        self.count = self.count.saturating_add(1);
        let count = f64::from(self.count);
        let delta = value - self.mean;
        self.mean += delta / count;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    const fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.mean }
    }

    fn std_dev(&self) -> f64 {
        if self.count > 1 {
            (self.m2 / f64::from(self.count - 1)).sqrt()
        } else {
            0.0
        }
    }
}
