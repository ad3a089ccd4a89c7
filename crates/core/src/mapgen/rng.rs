//! Seeded deterministic random stream shared by every pipeline stage.
//! No stage may use any other randomness source; the stream is consumed
//! in a single well-defined order so results are reproducible.

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::{Rng, SeedableRng};

pub(crate) struct RandomStream {
    rng: ChaCha8Rng,
}

impl RandomStream {
    pub(crate) fn new(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed) }
    }

    /// Uniform draw in `[0, 1)`.
    pub(crate) fn next_f64(&mut self) -> f64 {
        // 53 mantissa bits of a u64 draw.
        (self.rng.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Uniform integer in `[min, max]`. Modulo bias is acceptable here;
    /// determinism matters, statistical perfection does not.
    pub(crate) fn next_range(&mut self, min: i64, max: i64) -> i64 {
        debug_assert!(min <= max);
        let span = (max - min) as u64 + 1;
        min + (self.rng.next_u64() % span) as i64
    }

    pub(crate) fn next_usize(&mut self, min: usize, max: usize) -> usize {
        self.next_range(min as i64, max as i64) as usize
    }

    /// Deterministic Fisher-Yates shuffle.
    pub(crate) fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = (self.rng.next_u64() % (i as u64 + 1)) as usize;
            slice.swap(i, j);
        }
    }
}
