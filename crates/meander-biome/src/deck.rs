//! Shuffle-and-draw biome sequencing.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::registry::BiomeId;
use crate::seed::{Direction, derive_cycle_seed};

/// Biome type sequence for one direction.
///
/// Even draws are the filler type. Odd draws walk a shuffled permutation of
/// the remaining types; each exhausted permutation is replaced by a fresh
/// shuffle. Draw `n` is a pure function of the seed, direction and `n`.
#[derive(Clone, Debug)]
pub struct BiomeDeck {
    filler: BiomeId,
    others: Vec<BiomeId>,
    world_seed: u64,
    direction: Direction,
}

impl BiomeDeck {
    /// `others` should not contain `filler`; it is removed if present.
    pub fn new(
        filler: BiomeId,
        others: impl IntoIterator<Item = BiomeId>,
        world_seed: u64,
        direction: Direction,
    ) -> Self {
        let mut others: Vec<BiomeId> = others.into_iter().filter(|&id| id != filler).collect();
        others.sort_unstable();
        others.dedup();
        Self {
            filler,
            others,
            world_seed,
            direction,
        }
    }

    pub fn filler(&self) -> BiomeId {
        self.filler
    }

    /// The biome type of draw number `n`.
    pub fn draw(&self, n: u64) -> BiomeId {
        if n % 2 == 0 || self.others.is_empty() {
            return self.filler;
        }
        let k = n / 2;
        let len = self.others.len() as u64;
        let permutation = self.permutation(k / len);
        permutation[(k % len) as usize]
    }

    fn permutation(&self, cycle: u64) -> Vec<BiomeId> {
        let mut rng =
            ChaCha8Rng::seed_from_u64(derive_cycle_seed(self.world_seed, self.direction, cycle));
        let mut order = self.others.clone();
        order.shuffle(&mut rng);
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn deck(others: usize) -> BiomeDeck {
        BiomeDeck::new(
            BiomeId(0),
            (1..=others).map(|i| BiomeId(i as u16)),
            42,
            Direction::Positive,
        )
    }

    #[test]
    fn test_filler_alternates() {
        let deck = deck(4);
        for n in 0..40 {
            let id = deck.draw(n);
            if n % 2 == 0 {
                assert_eq!(id, BiomeId(0), "draw {n} must be the filler");
            } else {
                assert_ne!(id, BiomeId(0), "draw {n} must not be the filler");
            }
        }
    }

    #[test]
    fn test_each_cycle_is_a_permutation() {
        let deck = deck(5);
        for cycle in 0..6u64 {
            let drawn: BTreeSet<BiomeId> = (0..5u64)
                .map(|i| deck.draw(2 * (cycle * 5 + i) + 1))
                .collect();
            assert_eq!(drawn.len(), 5, "cycle {cycle} repeated a type before exhausting");
        }
    }

    #[test]
    fn test_draws_are_reproducible() {
        let a = deck(3);
        let b = deck(3);
        for n in 0..30 {
            assert_eq!(a.draw(n), b.draw(n));
        }
    }

    #[test]
    fn test_directions_shuffle_independently() {
        let pos = deck(6);
        let neg = BiomeDeck::new(BiomeId(0), (1..=6).map(BiomeId), 42, Direction::Negative);
        let a: Vec<_> = (0..60).map(|n| pos.draw(n)).collect();
        let b: Vec<_> = (0..60).map(|n| neg.draw(n)).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn test_filler_only_deck() {
        let deck = BiomeDeck::new(BiomeId(3), [BiomeId(3)], 1, Direction::Negative);
        assert!((0..10).all(|n| deck.draw(n) == BiomeId(3)));
    }
}
