//! Weighted selection over a cumulative weight table.
use crate::rng::RandomSource;

/// Candidates with positive weight laid out as prefix sums in input order.
///
/// Candidates with a weight of zero (or below) never enter the table, so they
/// can never be selected.
#[derive(Debug, Clone)]
pub struct WeightedTable<T> {
    ceilings: Vec<u64>,
    payloads: Vec<T>,
}

impl<T> WeightedTable<T> {
    pub fn new<I>(candidates: I) -> Self
    where
        I: IntoIterator<Item = (i64, T)>,
    {
        let mut ceilings = Vec::new();
        let mut payloads = Vec::new();
        let mut total: u64 = 0;
        for (weight, payload) in candidates {
            let Ok(weight) = u64::try_from(weight) else {
                continue;
            };
            if weight == 0 {
                continue;
            }
            total = total.saturating_add(weight);
            ceilings.push(total);
            payloads.push(payload);
        }
        Self { ceilings, payloads }
    }

    #[must_use]
    pub fn total_weight(&self) -> u64 {
        self.ceilings.last().copied().unwrap_or(0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    /// Candidates that can be drawn, in input order.
    pub fn payloads(&self) -> impl Iterator<Item = &T> {
        self.payloads.iter()
    }

    /// Draw one payload with probability proportional to its weight.
    ///
    /// Consumes exactly one value from `rng`; returns `None` without drawing
    /// when the table is empty.
    pub fn pick<R>(&self, rng: &mut R) -> Option<&T>
    where
        R: RandomSource + ?Sized,
    {
        let total = self.total_weight();
        if total == 0 {
            return None;
        }
        let roll = rng.below(total);
        self.payload_for_roll(roll)
    }

    /// First payload whose cumulative ceiling exceeds `roll`.
    #[must_use]
    pub fn payload_for_roll(&self, roll: u64) -> Option<&T> {
        let idx = self.ceilings.partition_point(|ceiling| *ceiling <= roll);
        self.payloads.get(idx)
    }
}
