//! Constraint analysis and resolution of the recommended preset.

use super::presets::{BALANCED, CASH_GAME, CONSTRAINT_FOCUSED, CONTRARIAN, TOURNAMENT};
use crate::model::{ContestInfo, ContestType, ExposureSettings};
use serde::{Deserialize, Serialize};

/// Constraint count above which the constraint-focused preset is chosen.
pub const CONSTRAINT_COUNT_LIMIT: usize = 5;

/// Complexity score above which the constraint-focused preset is chosen.
pub const COMPLEXITY_LIMIT: f64 = 15.0;

/// Immutable summary of a run's exposure settings and contest metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintAnalysis {
    pub complexity_score: f64,
    /// Active player + active team + position constraints.
    pub constraint_count: usize,
    pub player_constraints: usize,
    pub team_constraints: usize,
    /// Team constraints that ask for a stack size.
    pub stack_constraints: usize,
    pub position_constraints: usize,
    pub contest_type: Option<ContestType>,
    pub field_size: Option<u32>,
}

impl ConstraintAnalysis {
    /// Scores the settings:
    ///
    /// `1.5 * players + 2 * teams + 3 * stack targets + positions
    ///  + contest base + field-size bonus`
    pub fn analyze(settings: &ExposureSettings, contest: &ContestInfo) -> Self {
        let player_constraints = settings.players.values().filter(|b| b.is_active()).count();
        let team_constraints = settings.teams.iter().filter(|t| t.is_active()).count();
        let stack_constraints = settings
            .teams
            .iter()
            .filter(|t| t.stack_size.is_some_and(|s| s > 0))
            .count();
        let position_constraints = settings.positions.values().filter(|b| b.is_active()).count();

        let complexity_score = 1.5 * player_constraints as f64
            + 2.0 * team_constraints as f64
            + 3.0 * stack_constraints as f64
            + position_constraints as f64
            + contest_base(contest.contest_type)
            + field_size_bonus(contest.field_size);

        Self {
            complexity_score,
            constraint_count: player_constraints + team_constraints + position_constraints,
            player_constraints,
            team_constraints,
            stack_constraints,
            position_constraints,
            contest_type: contest.contest_type,
            field_size: contest.field_size,
        }
    }

    /// Whether the settings restrict anything at all.
    pub fn is_unconstrained(&self) -> bool {
        self.constraint_count == 0
    }
}

fn contest_base(contest_type: Option<ContestType>) -> f64 {
    match contest_type {
        Some(ContestType::Cash | ContestType::DoubleUp) => 1.0,
        Some(ContestType::Gpp | ContestType::Tournament) => 3.0,
        Some(ContestType::SingleEntry) => 5.0,
        None => 0.0,
    }
}

fn field_size_bonus(field_size: Option<u32>) -> f64 {
    match field_size {
        Some(n) if n > 10_000 => 2.0,
        Some(n) if n > 1_000 => 1.0,
        _ => 0.0,
    }
}

/// Name of the preset the "recommended" pseudo-strategy resolves to.
///
/// Heavy constraints win first, then the contest type, then the field size;
/// anything else runs the balanced hybrid.
pub fn resolve_recommended(analysis: &ConstraintAnalysis) -> &'static str {
    if analysis.constraint_count > CONSTRAINT_COUNT_LIMIT || analysis.complexity_score > COMPLEXITY_LIMIT {
        return CONSTRAINT_FOCUSED;
    }
    match analysis.contest_type {
        Some(t) if t.is_cash() => return CASH_GAME,
        Some(t) if t.is_tournament() => {
            return if analysis.field_size.is_some_and(|n| n > 5_000) {
                CONTRARIAN
            } else {
                TOURNAMENT
            };
        }
        _ => {}
    }
    match analysis.field_size {
        Some(n) if n < 100 => CASH_GAME,
        Some(n) if n > 10_000 => CONTRARIAN,
        _ => BALANCED,
    }
}
