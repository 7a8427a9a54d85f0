//! Cumulative draw pricing with block discounts.
use crate::model::Pricing;

impl Pricing {
    /// Total cost of `draws` consecutive draws.
    ///
    /// With the discount active and at least one full block reached, every full
    /// block of `discount_trigger` draws is charged at the discounted price and
    /// the remainder at the base price.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn price(&self, draws: u64) -> f64 {
        match self.discount_block() {
            Some(block) if draws >= block => {
                let blocks = draws / block;
                let remainder = draws % block;
                self.discounted_price_per_gacha * block as f64 * blocks as f64
                    + self.price_per_gacha * remainder as f64
            }
            _ => self.price_per_gacha * draws as f64,
        }
    }

    /// Whether `draws` consecutive draws would cost more than `budget`.
    #[must_use]
    pub fn exceeds_budget(&self, draws: u64, budget: f64) -> bool {
        self.price(draws) > budget
    }

    // A non-positive trigger only survives when validation was skipped.
    fn discount_block(&self) -> Option<u64> {
        if !self.discount {
            return None;
        }
        u64::try_from(self.discount_trigger)
            .ok()
            .filter(|block| *block > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(clippy::cast_precision_loss)]
    fn closed_form(pricing: &Pricing, draws: u64) -> f64 {
        let trigger = pricing.discount_trigger as u64;
        if !pricing.discount || draws < trigger {
            return pricing.price_per_gacha * draws as f64;
        }
        pricing.discounted_price_per_gacha * trigger as f64 * (draws / trigger) as f64
            + pricing.price_per_gacha * (draws % trigger) as f64
    }

    #[test]
    fn flat_pricing_is_linear() {
        let pricing = Pricing::flat(160.0);
        assert!((pricing.price(0) - 0.0).abs() < f64::EPSILON);
        assert!((pricing.price(10) - 1_600.0).abs() < f64::EPSILON);
    }

    #[test]
    fn discount_applies_only_to_full_blocks() {
        let pricing = Pricing::flat(100.0).with_discount(3, 90.0);
        let expected = [0.0, 100.0, 200.0, 270.0, 370.0, 470.0, 540.0, 640.0];
        for (draws, want) in expected.iter().enumerate() {
            let got = pricing.price(draws as u64);
            assert!((got - want).abs() < 1e-9, "draws {draws}: {got} != {want}");
        }
    }

    #[test]
    fn matches_closed_form_across_configurations() {
        let configs = [
            Pricing::flat(3.5),
            Pricing::flat(300.0).with_discount(1, 280.0),
            Pricing::flat(160.0).with_discount(10, 150.0),
            Pricing::flat(50.0).with_discount(7, 0.0),
        ];
        for pricing in &configs {
            for draws in 0..=64 {
                let got = pricing.price(draws);
                let want = closed_form(pricing, draws);
                assert!((got - want).abs() < 1e-9, "{pricing:?} draws {draws}");
            }
        }
    }

    #[test]
    fn unvalidated_trigger_falls_back_to_flat_price() {
        let pricing = Pricing::flat(10.0).with_discount(0, 5.0);
        assert!((pricing.price(4) - 40.0).abs() < f64::EPSILON);
        let pricing = Pricing::flat(10.0).with_discount(-2, 5.0);
        assert!((pricing.price(4) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn budget_is_inclusive() {
        let pricing = Pricing::flat(100.0).with_discount(3, 90.0);
        assert!(!pricing.exceeds_budget(4, 370.0));
        assert!(pricing.exceeds_budget(5, 370.0));
    }
}
