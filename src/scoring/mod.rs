//! NexusScore: composite lineup quality.
//!
//! ```text
//! total = base_projection × leverage_factor + stack_bonus + salary_efficiency_bonus
//! ```
//!
//! - `base_projection`: captain projection × captain multiplier plus every
//!   other rostered player's projection
//! - `leverage_factor`: `clamp(1 / max(avg_ownership / 100, 0.1), 0.6, 1.5)`,
//!   rewarding low-owned rosters
//! - `stack_bonus`: for each team with at least three rostered players,
//!   `(count − 2)^1.8 × 25`
//! - `salary_efficiency_bonus`: rewards spending the cap, based on
//!   `usage = total_salary / salary_cap`
//!
//! Scoring is a pure function of its inputs.

use crate::model::{Lineup, Player, RosterRules};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const LEVERAGE_MIN: f64 = 0.6;
const LEVERAGE_MAX: f64 = 1.5;
const OWNERSHIP_FLOOR: f64 = 0.1;
const STACK_MIN_PLAYERS: usize = 3;
const STACK_EXPONENT: f64 = 1.8;
const STACK_SCALE: f64 = 25.0;

/// Score breakdown. Components are always reported alongside the total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NexusScore {
    pub total: f64,
    pub base_projection: f64,
    pub leverage_factor: f64,
    pub stack_bonus: f64,
    pub salary_efficiency_bonus: f64,
    /// Mean ownership of all rostered players, in percent.
    pub avg_ownership: f64,
    pub salary_usage: f64,
    pub total_salary: u32,
}

/// Scores a roster given its captain and every other rostered player.
pub fn nexus_score(captain: &Player, others: &[&Player], rules: &RosterRules) -> NexusScore {
    let base_projection = captain.projected_points * rules.captain_multiplier
        + others.iter().map(|p| p.projected_points).sum::<f64>();

    let n = 1 + others.len();
    let avg_ownership =
        (captain.ownership + others.iter().map(|p| p.ownership).sum::<f64>()) / n as f64;
    let leverage_factor = leverage_factor(avg_ownership);

    let mut team_counts: HashMap<&str, usize> = HashMap::new();
    for p in std::iter::once(captain).chain(others.iter().copied()) {
        *team_counts.entry(p.team.as_str()).or_insert(0) += 1;
    }
    let stack_bonus: f64 = team_counts.values().map(|&c| stack_bonus(c)).sum();

    let total_salary = others
        .iter()
        .fold(rules.captain_salary(captain.salary), |acc, p| acc.saturating_add(p.salary));
    let salary_usage = total_salary as f64 / rules.salary_cap.max(1) as f64;
    let salary_efficiency_bonus = salary_efficiency_bonus(salary_usage);

    NexusScore {
        total: base_projection * leverage_factor + stack_bonus + salary_efficiency_bonus,
        base_projection,
        leverage_factor,
        stack_bonus,
        salary_efficiency_bonus,
        avg_ownership,
        salary_usage,
        total_salary,
    }
}

/// Rescores a frozen lineup.
pub fn score_lineup(lineup: &Lineup, rules: &RosterRules) -> NexusScore {
    let others: Vec<&Player> = lineup.flex.iter().chain(lineup.team.iter()).collect();
    nexus_score(&lineup.captain, &others, rules)
}

pub fn leverage_factor(avg_ownership: f64) -> f64 {
    (1.0 / (avg_ownership / 100.0).max(OWNERSHIP_FLOOR)).clamp(LEVERAGE_MIN, LEVERAGE_MAX)
}

/// Bonus contributed by one team with `count` rostered players.
pub fn stack_bonus(count: usize) -> f64 {
    if count < STACK_MIN_PLAYERS {
        0.0
    } else {
        ((count - 2) as f64).powf(STACK_EXPONENT) * STACK_SCALE
    }
}

pub fn salary_efficiency_bonus(usage: f64) -> f64 {
    if usage >= 0.95 {
        200.0 * (usage - 0.95)
    } else if usage >= 0.90 {
        100.0 * (usage - 0.90)
    } else {
        -50.0 * (0.90 - usage)
    }
}
