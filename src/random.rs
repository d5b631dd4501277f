//! Seeded random number helpers shared by every runner.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Creates a reproducible RNG from a seed.
pub fn create_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Creates an RNG from an optional seed, drawing a fresh one when `None`.
pub fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => create_rng(seed),
        None => create_rng(rand::random()),
    }
}

/// Derives an independent seed for the `index`-th parallel unit of work.
///
/// SplitMix64 finalizer over `base + index`, so neighbouring units do not
/// share correlated streams.
pub fn derive_seed(base: u64, index: u64) -> u64 {
    let mut z = base.wrapping_add(index.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Shuffles a slice in place.
pub fn shuffle<T, R: Rng>(items: &mut [T], rng: &mut R) {
    items.shuffle(rng);
}

/// Picks an index with probability proportional to `weights`.
///
/// Non-positive and non-finite weights are treated as zero. Returns `None`
/// when no weight is positive.
pub fn weighted_index<R: Rng>(weights: &[f64], rng: &mut R) -> Option<usize> {
    let total: f64 = weights
        .iter()
        .filter(|w| w.is_finite() && **w > 0.0)
        .sum();
    if total <= 0.0 {
        return None;
    }

    let mut roll = rng.random_range(0.0..total);
    let mut last_positive = None;
    for (i, &w) in weights.iter().enumerate() {
        if !w.is_finite() || w <= 0.0 {
            continue;
        }
        last_positive = Some(i);
        roll -= w;
        if roll < 0.0 {
            return Some(i);
        }
    }
    last_positive // floating-point fallback
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = create_rng(7);
        let mut b = create_rng(7);
        for _ in 0..10 {
            assert_eq!(a.random::<u64>(), b.random::<u64>());
        }
    }

    #[test]
    fn test_derive_seed_distinct() {
        let seeds: Vec<u64> = (0..10).map(|i| derive_seed(42, i)).collect();
        for i in 0..seeds.len() {
            for j in (i + 1)..seeds.len() {
                assert_ne!(seeds[i], seeds[j]);
            }
        }
    }

    #[test]
    fn test_weighted_index_skips_zero() {
        let mut rng = create_rng(1);
        for _ in 0..1000 {
            let idx = weighted_index(&[0.0, 1.0, 0.0], &mut rng);
            assert_eq!(idx, Some(1));
        }
    }

    #[test]
    fn test_weighted_index_all_zero() {
        let mut rng = create_rng(1);
        assert_eq!(weighted_index(&[0.0, -1.0, f64::NAN], &mut rng), None);
    }

    #[test]
    fn test_weighted_index_favors_heavy() {
        let mut rng = create_rng(3);
        let mut counts = [0u32; 2];
        for _ in 0..10_000 {
            let idx = weighted_index(&[1.0, 9.0], &mut rng).unwrap();
            counts[idx] += 1;
        }
        assert!(counts[1] > 8000, "got {counts:?}");
    }
}
