//! Risk and stack-shape classification.

use super::config::PortfolioConfig;
use crate::model::Lineup;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Barbell category, by average ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    /// Chalky, safe lineups.
    HighFloor,
    /// Contrarian, low-ownership lineups.
    HighCeiling,
    Balanced,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 3] = [
        RiskCategory::HighFloor,
        RiskCategory::HighCeiling,
        RiskCategory::Balanced,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RiskCategory::HighFloor => "high_floor",
            RiskCategory::HighCeiling => "high_ceiling",
            RiskCategory::Balanced => "balanced",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of the per-team player counts, largest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StackShape {
    #[serde(rename = "4-3")]
    FourThree,
    #[serde(rename = "4-2-1")]
    FourTwoOne,
    #[serde(rename = "other")]
    Other,
}

impl StackShape {
    pub fn as_str(self) -> &'static str {
        match self {
            StackShape::FourThree => "4-3",
            StackShape::FourTwoOne => "4-2-1",
            StackShape::Other => "other",
        }
    }
}

impl fmt::Display for StackShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn classify_risk(avg_ownership: f64, config: &PortfolioConfig) -> RiskCategory {
    if avg_ownership >= config.high_floor_ownership {
        RiskCategory::HighFloor
    } else if avg_ownership <= config.high_ceiling_ownership {
        RiskCategory::HighCeiling
    } else {
        RiskCategory::Balanced
    }
}

/// Classifies the sorted per-team counts over every rostered slot,
/// captain and TEAM included.
pub fn classify_stack_shape(lineup: &Lineup) -> StackShape {
    let mut counts: Vec<usize> = lineup.team_counts().into_values().collect();
    counts.sort_unstable_by(|a, b| b.cmp(a));
    match counts.as_slice() {
        [4, 3] => StackShape::FourThree,
        [4, 2, 1] => StackShape::FourTwoOne,
        _ => StackShape::Other,
    }
}

/// Per-category lineup targets for one portfolio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTargets {
    pub high_floor: usize,
    pub high_ceiling: usize,
    pub balanced: usize,
}

impl CategoryTargets {
    pub fn get(&self, category: RiskCategory) -> usize {
        match category {
            RiskCategory::HighFloor => self.high_floor,
            RiskCategory::HighCeiling => self.high_ceiling,
            RiskCategory::Balanced => self.balanced,
        }
    }

    pub fn total(&self) -> usize {
        self.high_floor + self.high_ceiling + self.balanced
    }
}

/// Rounds each barbell share of `size`; the remainder goes to balanced.
pub fn category_targets(size: usize, config: &PortfolioConfig) -> CategoryTargets {
    let share = |pct: f64| (size as f64 * pct / 100.0).round() as usize;
    let high_floor = share(config.high_floor_pct).min(size);
    let high_ceiling = share(config.high_ceiling_pct).min(size - high_floor);
    CategoryTargets {
        high_floor,
        high_ceiling,
        balanced: size - high_floor - high_ceiling,
    }
}
