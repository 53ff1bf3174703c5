//! Random sources and uniform sampling without replacement.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform random indices.
pub trait RandomSource {
    /// A uniformly distributed index in `0..upper`. `upper` is never zero.
    fn below(&mut self, upper: usize) -> usize;
}

/// Deterministic source seeded from a fixed value.
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seed from the browser's `Math.random`.
    #[cfg(target_arch = "wasm32")]
    pub fn from_browser() -> Self {
        let high = (js_sys::Math::random() * u32::MAX as f64) as u64;
        let low = (js_sys::Math::random() * u32::MAX as f64) as u64;
        Self::new((high << 32) | low)
    }
}

impl RandomSource for SeededRandom {
    fn below(&mut self, upper: usize) -> usize {
        self.rng.random_range(0..upper)
    }
}

/// The thread-local generator seeded from OS entropy.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

#[cfg(not(target_arch = "wasm32"))]
impl RandomSource for ThreadRandom {
    fn below(&mut self, upper: usize) -> usize {
        rand::rng().random_range(0..upper)
    }
}

/// Create the platform's default random source.
#[cfg(not(target_arch = "wasm32"))]
pub fn default_random() -> Box<dyn RandomSource> {
    Box::new(ThreadRandom)
}

#[cfg(target_arch = "wasm32")]
pub fn default_random() -> Box<dyn RandomSource> {
    Box::new(SeededRandom::from_browser())
}

/// Pick `count` distinct positions from `0..len` uniformly at random.
///
/// Partial Fisher-Yates: only the first `count` slots are shuffled, and the
/// result is in selection order.
pub fn sample_indices(rng: &mut dyn RandomSource, len: usize, count: usize) -> Vec<usize> {
    let count = count.min(len);
    let mut indices: Vec<usize> = (0..len).collect();
    for i in 0..count {
        let j = i + rng.below(len - i);
        indices.swap(i, j);
    }
    indices.truncate(count);
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Always picks the last remaining slot.
    struct LastSlot;

    impl RandomSource for LastSlot {
        fn below(&mut self, upper: usize) -> usize {
            upper - 1
        }
    }

    #[test]
    fn test_sample_distinct_and_in_bounds() {
        let mut rng = SeededRandom::new(7);
        for count in 0..=10 {
            let picked = sample_indices(&mut rng, 10, count);
            assert_eq!(picked.len(), count);
            let unique: HashSet<_> = picked.iter().collect();
            assert_eq!(unique.len(), count);
            assert!(picked.iter().all(|&i| i < 10));
        }
    }

    #[test]
    fn test_sample_clamps_to_len() {
        let mut rng = SeededRandom::new(1);
        assert_eq!(sample_indices(&mut rng, 3, 5).len(), 3);
        assert!(sample_indices(&mut rng, 0, 2).is_empty());
    }

    #[test]
    fn test_sample_follows_source() {
        let picked = sample_indices(&mut LastSlot, 5, 2);
        // First pick swaps slot 0 with slot 4, second swaps slot 1 with slot 4.
        assert_eq!(picked, vec![4, 0]);
    }

    #[test]
    fn test_seeded_is_deterministic() {
        let a = sample_indices(&mut SeededRandom::new(42), 50, 10);
        let b = sample_indices(&mut SeededRandom::new(42), 50, 10);
        assert_eq!(a, b);
    }

    #[test]
    fn test_sample_is_roughly_uniform() {
        // Each of 4 positions should be picked first about a quarter of the time.
        let mut rng = SeededRandom::new(2024);
        let mut counts = [0usize; 4];
        for _ in 0..8000 {
            counts[sample_indices(&mut rng, 4, 1)[0]] += 1;
        }
        for count in counts {
            assert!((1700..2300).contains(&count), "skewed counts: {counts:?}");
        }
    }
}
