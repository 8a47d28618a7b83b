//! Value-weighted tile generation for the refill step.
//!
//! The wall cell freed by a shift gets its content from a `TileSource`. The
//! shipped source favors small powers of two exponentially: value `v` appears
//! in the candidate pool `ceiling / v` times, where the ceiling is the
//! highest value ever reached at the center cell.

use rand::Rng;

/// Produces content for freshly spawned tiles.
pub trait TileSource<K> {
    /// Produce the key for one spawned tile.
    fn next_key<R: Rng + ?Sized>(&mut self, rng: &mut R) -> K;
    /// Note a new center-cell milestone; may widen the output domain.
    fn observe_highest(&mut self, key: &K);
    /// Return to the fresh-board domain.
    fn reset(&mut self);
}

/// Weighted power-of-two spawner.
///
/// The candidate pool is cached and rebuilt only when the ceiling rises:
/// starting at `max = ceiling, val = 1`, push `val` exactly `max` times,
/// halve `max` and double `val` until `max` reaches 1, then push the final
/// `val` once. Selection is uniform over all but that last slot, so the
/// ceiling itself stays out of the domain until it is overtaken.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedPowerSpawner {
    ceiling: u32,
    candidates: Vec<u32>,
}

impl WeightedPowerSpawner {
    pub fn new(ceiling: u32) -> Self {
        assert!(ceiling >= 1, "spawn ceiling must be at least 1");
        let mut spawner = WeightedPowerSpawner {
            ceiling,
            candidates: Vec::new(),
        };
        spawner.rebuild();
        spawner
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    fn rebuild(&mut self) {
        let mut candidates = Vec::new();
        let mut max = self.ceiling;
        let mut val = 1u32;
        while max > 1 {
            for _ in 0..max {
                candidates.push(val);
            }
            max /= 2;
            val *= 2;
        }
        candidates.push(val);
        self.candidates = candidates;
    }
}

impl TileSource<u32> for WeightedPowerSpawner {
    fn next_key<R: Rng + ?Sized>(&mut self, rng: &mut R) -> u32 {
        // The final slot is excluded from selection; a one-entry pool (fresh
        // board, ceiling 1) returns its single value.
        let upper = (self.candidates.len() - 1).max(1);
        self.candidates[rng.gen_range(0..upper)]
    }

    fn observe_highest(&mut self, key: &u32) {
        if *key > self.ceiling {
            self.ceiling = *key;
            self.rebuild();
        }
    }

    fn reset(&mut self) {
        self.ceiling = 1;
        self.rebuild();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    #[test]
    fn test_fresh_domain_is_one() {
        let mut spawner = WeightedPowerSpawner::new(1);
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(spawner.next_key(&mut rng), 1);
        }
    }

    #[test]
    fn test_pool_structure_for_ceiling_eight() {
        let spawner = WeightedPowerSpawner::new(8);
        // 1 x8, 2 x4, 4 x2, then the ceiling once.
        assert_eq!(spawner.candidates.len(), 15);
        assert_eq!(spawner.candidates.iter().filter(|&&v| v == 1).count(), 8);
        assert_eq!(spawner.candidates.iter().filter(|&&v| v == 2).count(), 4);
        assert_eq!(spawner.candidates.iter().filter(|&&v| v == 4).count(), 2);
        assert_eq!(spawner.candidates[14], 8);
    }

    #[test]
    fn test_output_domain_and_decay() {
        let mut spawner = WeightedPowerSpawner::new(8);
        let mut rng = SmallRng::seed_from_u64(99);
        let mut counts: HashMap<u32, u32> = HashMap::new();
        let n = 50_000;
        for _ in 0..n {
            let v = spawner.next_key(&mut rng);
            assert!(v.is_power_of_two());
            assert!(v >= 1 && v <= 8);
            *counts.entry(v).or_insert(0) += 1;
        }
        // The ceiling slot is excluded from selection.
        assert_eq!(counts.get(&8), None);
        // Halving decay: each value roughly twice as frequent as the next.
        let c1 = counts[&1] as f64;
        let c2 = counts[&2] as f64;
        let c4 = counts[&4] as f64;
        assert!((c1 / c2 - 2.0).abs() < 0.2, "1:2 ratio was {}", c1 / c2);
        assert!((c2 / c4 - 2.0).abs() < 0.2, "2:4 ratio was {}", c2 / c4);
    }

    #[test]
    fn test_observe_higher_widens_domain() {
        let mut spawner = WeightedPowerSpawner::new(1);
        let mut rng = SmallRng::seed_from_u64(7);

        spawner.observe_highest(&2);
        assert_eq!(spawner.ceiling(), 2);
        // Pool [1, 1, 2], selection over the first two slots.
        for _ in 0..100 {
            assert_eq!(spawner.next_key(&mut rng), 1);
        }

        spawner.observe_highest(&4);
        assert_eq!(spawner.ceiling(), 4);
        let saw_two = (0..1000).any(|_| spawner.next_key(&mut rng) == 2);
        assert!(saw_two);
    }

    #[test]
    fn test_observe_lower_is_noop() {
        let mut spawner = WeightedPowerSpawner::new(8);
        let pool = spawner.candidates.clone();
        spawner.observe_highest(&4);
        assert_eq!(spawner.ceiling(), 8);
        assert_eq!(spawner.candidates, pool);
    }

    #[test]
    fn test_reset_returns_to_fresh_domain() {
        let mut spawner = WeightedPowerSpawner::new(16);
        spawner.reset();
        assert_eq!(spawner.ceiling(), 1);
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..50 {
            assert_eq!(spawner.next_key(&mut rng), 1);
        }
    }
}
