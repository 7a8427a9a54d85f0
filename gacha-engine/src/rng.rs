//! Random sources feeding weighted selection.
//!
//! Every random decision in a simulation goes through [`RandomSource::below`],
//! so a seeded or scripted source reproduces a run exactly.
use hmac::{Hmac, Mac};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::Sha256;
use std::sync::{Mutex, PoisonError};

use crate::constants::DRAW_STREAM_TAG;

/// Uniform integer source.
pub trait RandomSource {
    /// Return a value uniformly distributed in `[0, bound)`.
    ///
    /// The engine only calls this with a positive `bound`.
    fn below(&mut self, bound: u64) -> u64;
}

impl<T: RandomSource + ?Sized> RandomSource for &mut T {
    fn below(&mut self, bound: u64) -> u64 {
        (**self).below(bound)
    }
}

/// Seedable generator that counts how many values it has produced.
#[derive(Debug, Clone)]
pub struct SeededSource<R = ChaCha8Rng> {
    rng: R,
    draws: u64,
}

impl SeededSource<ChaCha8Rng> {
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self::from_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Independent stream for one run of a seeded batch.
    #[must_use]
    pub fn for_run(user_seed: u64, run: u64) -> Self {
        let mut tag = DRAW_STREAM_TAG.to_vec();
        tag.extend_from_slice(&run.to_le_bytes());
        Self::from_seed(derive_stream_seed(user_seed, &tag))
    }
}

impl<R: RngCore> SeededSource<R> {
    pub const fn from_rng(rng: R) -> Self {
        Self { rng, draws: 0 }
    }

    /// Number of values drawn so far.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: RngCore> RandomSource for SeededSource<R> {
    fn below(&mut self, bound: u64) -> u64 {
        self.draws = self.draws.saturating_add(1);
        if bound == 0 {
            return 0;
        }
        self.rng.gen_range(0..bound)
    }
}

/// Process-wide source that concurrent simulations can sample safely.
///
/// Each draw takes the lock, so a `&SharedSource` can be handed to any number
/// of threads at once.
#[derive(Debug)]
pub struct SharedSource<S> {
    inner: Mutex<S>,
}

impl<S: RandomSource> SharedSource<S> {
    pub const fn new(source: S) -> Self {
        Self {
            inner: Mutex::new(source),
        }
    }

    /// Recover the wrapped source.
    pub fn into_inner(self) -> S {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: RandomSource> RandomSource for &SharedSource<S> {
    fn below(&mut self, bound: u64) -> u64 {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .below(bound)
    }
}

/// Replays a fixed sequence of values, cycling once exhausted.
///
/// Values at or above the requested bound wrap with `%` so the contract of
/// [`RandomSource::below`] always holds.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    values: Vec<u64>,
    cursor: usize,
}

impl ScriptedSource {
    #[must_use]
    pub fn new(values: impl IntoIterator<Item = u64>) -> Self {
        Self {
            values: values.into_iter().collect(),
            cursor: 0,
        }
    }

    /// Number of values handed out so far.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedSource {
    fn below(&mut self, bound: u64) -> u64 {
        if self.values.is_empty() || bound == 0 {
            self.cursor += 1;
            return 0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value % bound
    }
}

/// Derive a per-stream seed from the user-visible seed and a domain tag.
#[must_use]
pub fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
