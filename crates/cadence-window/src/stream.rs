//! Caller-owned pseudo-random stream for window width draws.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Seeded pseudo-random stream consumed by [`WindowSampler`](crate::WindowSampler).
///
/// The stream keeps its position between partitions. Callers that need the
/// same windows on every call pass an explicit seed to
/// [`WindowSampler::partition`](crate::WindowSampler::partition), which
/// re-seeds the stream first; callers that omit it continue drawing from
/// wherever the stream currently is.
#[derive(Debug, Clone)]
pub struct SampleStream {
    rng: ChaCha8Rng,
    seed: u64,
}

impl SampleStream {
    /// Create a stream seeded with `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Reset the stream to the start of the sequence for `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.seed = seed;
    }

    /// The seed the stream was last (re-)seeded with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Draw an index uniformly from `0..n`. `n` must be non-zero.
    pub(crate) fn draw_index(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }
}
