//! Seeded variation used by the generator.
//!
//! Every random-looking value in a dataset comes from a [`Variation`]
//! stream seeded from the area name, so identical inputs always produce
//! identical output. The PRNG is `ChaCha8`, whose output is stable across
//! platforms and crate releases.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Return a value in `0.0..1.0` determined entirely by `seed`.
///
/// # Examples
/// ```
/// use saferoute_data::generator::deterministic_variation;
///
/// let v = deterministic_variation(42);
/// assert!((0.0..1.0).contains(&v));
/// assert_eq!(v, deterministic_variation(42));
/// ```
#[must_use]
pub fn deterministic_variation(seed: u64) -> f64 {
    Variation::new(seed).unit()
}

/// Stable seed for an area: the sum of each character's code point
/// multiplied by its one-based position.
///
/// # Examples
/// ```
/// use saferoute_data::generator::area_seed;
///
/// // 'a' (97) * 1 + 'b' (98) * 2
/// assert_eq!(area_seed("ab"), 293);
/// ```
#[must_use]
pub fn area_seed(name: &str) -> u64 {
    name.chars()
        .zip(1_u64..)
        .map(|(c, position)| u64::from(c).wrapping_mul(position))
        .fold(0_u64, u64::wrapping_add)
}

/// A deterministic stream of unit variations.
#[derive(Debug, Clone)]
pub struct Variation {
    rng: ChaCha8Rng,
}

impl Variation {
    /// Start a stream from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Next value in `0.0..1.0`.
    pub fn unit(&mut self) -> f64 {
        self.rng.gen_range(0.0..1.0)
    }

    /// Next value in `min..max`.
    #[expect(clippy::float_arithmetic, reason = "affine map of a unit sample")]
    pub fn between(&mut self, min: f64, max: f64) -> f64 {
        min + (max - min) * self.unit()
    }

    /// Next value in `-amplitude..amplitude`.
    pub fn signed(&mut self, amplitude: f64) -> f64 {
        self.between(-amplitude, amplitude)
    }

    /// Next whole number in `0..=max`.
    pub fn up_to(&mut self, max: u32) -> u32 {
        self.rng.gen_range(0..=max)
    }
}
