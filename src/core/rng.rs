//! Deterministic random number generation for self-play.
//!
//! ## Key Features
//!
//! - **Deterministic**: Same seed produces identical sequence
//! - **Per-game streams**: Each game draws from its own stream derived from
//!   the run seed and the game's global index, so results do not depend on
//!   which worker plays the game
//!
//! ```
//! use othello_selfplay::core::GameRng;
//!
//! let mut a = GameRng::for_game(42, 7);
//! let mut b = GameRng::for_game(42, 7);
//! assert_eq!(a.gen_range_usize(0..100), b.gen_range_usize(0..100));
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Golden-ratio increment used to spread game indices across seeds.
const GAME_STREAM_STEP: u64 = 0x9E37_79B9_7F4A_7C15;

/// Deterministic RNG owned by a single game.
///
/// Uses ChaCha8 for speed while keeping streams statistically independent.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Stream for game number `game` of a run seeded with `run_seed`.
    #[must_use]
    pub fn for_game(run_seed: u64, game: u64) -> Self {
        let mixed = run_seed ^ game.wrapping_add(1).wrapping_mul(GAME_STREAM_STEP);
        Self::new(splitmix(mixed))
    }

    /// The seed this stream was created from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generate a random usize in the given range.
    pub fn gen_range_usize(&mut self, range: std::ops::Range<usize>) -> usize {
        self.inner.gen_range(range)
    }

    /// Uniform float in `[0, 1)`.
    pub fn gen_unit(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Choose a random element from a slice.
    #[must_use]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.inner)
    }

    /// Choose an index with probability proportional to its weight.
    ///
    /// Weights do not need to sum to 1.0. Returns `None` if weights are empty,
    /// all zero, or contain a non-finite total.
    pub fn choose_weighted(&mut self, weights: &[f64]) -> Option<usize> {
        let total: f64 = weights.iter().sum();
        if weights.is_empty() || !total.is_finite() || total <= 0.0 {
            return None;
        }

        let mut threshold = self.gen_unit() * total;

        for (i, &weight) in weights.iter().enumerate() {
            threshold -= weight;
            if threshold < 0.0 {
                return Some(i);
            }
        }

        // Rounding can leave a sliver of mass; fall back to the last positive weight.
        weights.iter().rposition(|&w| w > 0.0)
    }
}

/// SplitMix64 finalizer.
fn splitmix(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
