//! Limits shared by validation and execution.

/// Upper bound on `Plan::max_consecutive_gachas`.
pub const MAX_CONSECUTIVE_GACHAS: i64 = 1000;

// Domain tag for per-run stream seeds.
pub(crate) const DRAW_STREAM_TAG: &[u8] = b"gacha.draw";
