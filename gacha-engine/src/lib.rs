//! Gacha Draw Engine
//!
//! Platform-agnostic simulation of weighted gacha draws: validation of a draw
//! request, tiered weighted selection, pity, volume-discount pricing, and goal
//! tracking. Catalogue access is abstracted behind [`Catalog`] so the crate has
//! no persistence or transport dependencies.

pub mod cache;
pub mod catalog;
pub mod constants;
pub mod draw;
pub mod error;
pub mod goals;
pub mod model;
pub mod pricing;
pub mod rng;
pub mod selector;
pub mod validate;

// Re-export commonly used types
pub use cache::LazyCatalogCache;
pub use catalog::{Catalog, CatalogData, CatalogError, MemoryCatalog};
pub use constants::MAX_CONSECUTIVE_GACHAS;
pub use draw::execute;
pub use error::{GachaError, SimulationError};
pub use goals::{DuplicateGoal, GoalMap, GoalTracker};
pub use model::{DrawResult, Item, ItemId, Plan, Policies, Pricing, Request, Tier, TierId};
pub use rng::{RandomSource, ScriptedSource, SeededSource, SharedSource, derive_stream_seed};
pub use selector::WeightedTable;
pub use validate::{GoalKind, ValidationError, validate};

/// Draw engine bound to one catalogue.
pub struct GachaEngine<C>
where
    C: Catalog,
{
    catalog: C,
}

impl<C> GachaEngine<C>
where
    C: Catalog,
{
    /// Create a new engine over the provided catalogue
    pub const fn new(catalog: C) -> Self {
        Self { catalog }
    }

    pub const fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Check a request without drawing.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule, or the catalogue error if a lookup fails.
    pub fn validate(&self, request: &Request) -> Result<(), GachaError<C::Error>> {
        validate::validate(request, &self.catalog)
    }

    /// Simulate a request that the caller has already validated.
    ///
    /// # Errors
    ///
    /// Returns an error if preparation fails, a drawn tier has no positive
    /// item, or a catalogue lookup fails.
    pub fn execute<R>(
        &self,
        request: &Request,
        rng: &mut R,
    ) -> Result<DrawResult, GachaError<C::Error>>
    where
        R: RandomSource + ?Sized,
    {
        draw::execute(request, &self.catalog, rng)
    }

    /// Validate the request, then simulate it.
    ///
    /// # Errors
    ///
    /// Returns the validation error without touching `rng`, or any error
    /// [`GachaEngine::execute`] reports.
    pub fn run<R>(&self, request: &Request, rng: &mut R) -> Result<DrawResult, GachaError<C::Error>>
    where
        R: RandomSource + ?Sized,
    {
        self.validate(request)?;
        self.execute(request, rng)
    }
}
