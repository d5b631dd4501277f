//! Parent selection over a generation's fitness slice.
//!
//! `fitness[i]` is the exposure-adjusted NexusScore of member `i` (see
//! [`fitness`](super::fitness)); higher is better and values may be negative
//! once exposure penalties apply.

use crate::random::weighted_index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How breeding lineups are picked from a generation.
///
/// # Examples
///
/// ```
/// use nexus_lineup::evolution::Selection;
///
/// assert_eq!(Selection::default(), Selection::Roulette);
/// let pressured = Selection::Tournament(3);
/// assert_ne!(pressured, Selection::Rank);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// Best of `k` random members.
    Tournament(usize),

    /// Chance proportional to fitness. Penalized (non-positive) scores are
    /// shifted up so the worst lineup keeps a sliver of a chance.
    #[default]
    Roulette,

    /// Weight `n` for the best of `n` lineups down to 1 for the worst;
    /// insensitive to how far apart the scores are.
    Rank,
}

impl Selection {
    /// Index of the chosen parent. `fitness` must be non-empty.
    pub fn select<R: Rng>(&self, fitness: &[f64], rng: &mut R) -> usize {
        assert!(!fitness.is_empty(), "cannot select a parent from an empty generation");

        match self {
            Selection::Tournament(k) => tournament(fitness, *k, rng),
            Selection::Roulette => roulette(fitness, rng),
            Selection::Rank => rank(fitness, rng),
        }
    }
}

fn tournament<R: Rng>(fitness: &[f64], k: usize, rng: &mut R) -> usize {
    let n = fitness.len();
    let mut best = rng.random_range(0..n);
    for _ in 1..k.max(1) {
        let idx = rng.random_range(0..n);
        if fitness[idx] > fitness[best] {
            best = idx;
        }
    }
    best
}

fn roulette<R: Rng>(fitness: &[f64], rng: &mut R) -> usize {
    const FLOOR: f64 = 1e-10;
    let worst = fitness.iter().copied().fold(f64::INFINITY, f64::min);
    let shift = if worst > 0.0 { 0.0 } else { FLOOR - worst };
    let weights: Vec<f64> = fitness
        .iter()
        .map(|&f| if f.is_finite() { f + shift } else { FLOOR })
        .collect();
    weighted_index(&weights, rng).unwrap_or_else(|| rng.random_range(0..fitness.len()))
}

fn rank<R: Rng>(fitness: &[f64], rng: &mut R) -> usize {
    let n = fitness.len();
    let mut by_score: Vec<usize> = (0..n).collect();
    by_score.sort_by(|&a, &b| fitness[a].partial_cmp(&fitness[b]).unwrap_or(Ordering::Equal));
    // Ascending order, so position + 1 is the linear rank weight.
    let weights: Vec<f64> = (1..=n).map(|r| r as f64).collect();
    weighted_index(&weights, rng).map_or(by_score[n - 1], |k| by_score[k])
}
