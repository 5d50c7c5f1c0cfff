//! Canonical-rounding fitness cache (spec section 4.6 / 9).
//!
//! Read-shared, write-rare: a `parking_lot::RwLock` over a plain
//! `HashMap`, matching the guidance in section 5 ("the fitness cache is
//! read-shared, write-rare; guarded by a lock").

use std::collections::HashMap;

use parking_lot::RwLock;

/// Number of decimal digits the cache key rounds to. Fine enough to avoid
/// false misses from floating-point noise in repeated evaluations, coarse
/// enough that bit-exact equality is never required.
const CANONICAL_DIGITS: f64 = 1e12;

#[derive(Default)]
pub struct FitnessCache {
    map: RwLock<HashMap<Vec<i64>, f64>>,
}

impl FitnessCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn canonical_key(genes: &[f64]) -> Vec<i64> {
        genes.iter().map(|x| (x * CANONICAL_DIGITS).round() as i64).collect()
    }

    pub fn get(&self, genes: &[f64]) -> Option<f64> {
        let key = Self::canonical_key(genes);
        self.map.read().get(&key).copied()
    }

    pub fn insert(&self, genes: &[f64], fitness: f64) {
        let key = Self::canonical_key(genes);
        self.map.write().insert(key, fitness);
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_rounded_vectors_hit() {
        let cache = FitnessCache::new();
        cache.insert(&[1.000000000001, 2.0], 42.0);
        assert_eq!(cache.get(&[1.000000000001, 2.0]), Some(42.0));
    }

    #[test]
    fn distinguishable_vectors_miss() {
        let cache = FitnessCache::new();
        cache.insert(&[1.0, 2.0], 42.0);
        assert_eq!(cache.get(&[1.0, 2.1]), None);
    }
}
