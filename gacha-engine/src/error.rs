//! Error types surfaced by validation and execution.
use thiserror::Error;

use crate::model::{ItemId, TierId};
use crate::validate::ValidationError;

/// Preconditions that can only be checked once execution starts.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SimulationError {
    #[error("tier {tier_id} reports zero items")]
    EmptyLazyTier { tier_id: TierId },
    #[error("no tier has a positive ratio")]
    EmptyTierPool,
    #[error("tier {tier_id} has no item with a positive ratio")]
    EmptyItemPool { tier_id: TierId },
    #[error("pity item {item_id} not found")]
    UnknownPityItem { item_id: ItemId },
    #[error("pity item {item_id} has no owning tier")]
    PityItemWithoutTier { item_id: ItemId },
}

/// Any failure of a validate or execute call.
///
/// Catalogue errors are passed through untouched so callers can tell a broken
/// backend from a bad request.
#[derive(Debug, Error)]
pub enum GachaError<E>
where
    E: std::error::Error + 'static,
{
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),
    #[error("simulation aborted: {0}")]
    Simulation(#[from] SimulationError),
    #[error("catalog lookup failed: {0}")]
    Catalog(#[source] E),
}

impl<E> GachaError<E>
where
    E: std::error::Error + 'static,
{
    /// The validation failure, if this is one.
    #[must_use]
    pub const fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }

    /// True when the caller can fix the request and retry.
    #[must_use]
    pub const fn is_request_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Simulation(_))
    }
}
