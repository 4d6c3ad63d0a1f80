//! Deterministic seed derivation for biome sequencing and per-instance layout.
//!
//! Every random draw in the biome pipeline comes from a [`ChaCha8Rng`] seeded
//! by hashing the world seed with the coordinates of the draw, so results never
//! depend on the order in which the window is queried.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Direction of a biome sequence away from `z = 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    /// Instances ending at or below `z = 0`, ordered outward.
    Negative,
    /// Instances starting at or above `z = 0`, ordered outward.
    Positive,
}

impl Direction {
    /// `-1.0` or `1.0`.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Negative => -1.0,
            Direction::Positive => 1.0,
        }
    }
}

/// Derive the seed of the instance at `ordinal` in `direction`.
///
/// Uses SipHash (via std's `DefaultHasher`).
pub fn derive_instance_seed(world_seed: u64, direction: Direction, ordinal: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    world_seed.hash(&mut hasher);
    direction.hash(&mut hasher);
    ordinal.hash(&mut hasher);
    hasher.finish()
}

/// Deterministic RNG for one instance's length draw.
pub fn instance_rng(world_seed: u64, direction: Direction, ordinal: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_instance_seed(world_seed, direction, ordinal))
}

/// Derive the seed of one deck cycle (one permutation of the non-filler types).
pub fn derive_cycle_seed(world_seed: u64, direction: Direction, cycle: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    "deck".hash(&mut hasher);
    world_seed.hash(&mut hasher);
    direction.hash(&mut hasher);
    cycle.hash(&mut hasher);
    hasher.finish()
}

/// Derive an independent seed for one purpose (layout, decorations, ...) from
/// an instance seed.
pub fn derive_sub_seed(seed: u64, purpose: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    purpose.hash(&mut hasher);
    hasher.finish()
}
