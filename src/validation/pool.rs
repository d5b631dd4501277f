//! A validated, typed player pool.

use super::checks::{validate, validate_players};
use super::report::ValidationReport;
use crate::error::{OptimizerError, Result};
use crate::model::{Player, PlayerRecord, RosterRules};

/// Players that passed validation, together with the rules they were
/// validated against.
#[derive(Debug, Clone)]
pub struct PlayerPool {
    players: Vec<Player>,
    rules: RosterRules,
    report: ValidationReport,
}

impl PlayerPool {
    /// Validates raw records and converts them.
    ///
    /// Returns [`OptimizerError::Validation`] when any hard check fails.
    pub fn from_records(records: &[PlayerRecord], rules: RosterRules) -> Result<Self> {
        let report = validate(records, &rules);
        if !report.is_valid {
            return Err(OptimizerError::Validation {
                errors: report.errors,
            });
        }
        let players = records.iter().filter_map(PlayerRecord::to_player).collect();
        Ok(Self {
            players,
            rules,
            report,
        })
    }

    /// Validates already typed players.
    pub fn from_players(players: Vec<Player>, rules: RosterRules) -> Result<Self> {
        let report = validate_players(&players, &rules);
        if !report.is_valid {
            return Err(OptimizerError::Validation {
                errors: report.errors,
            });
        }
        Ok(Self {
            players,
            rules,
            report,
        })
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn rules(&self) -> &RosterRules {
        &self.rules
    }

    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    /// Whether lineups carry a TEAM slot.
    pub fn team_slot(&self) -> bool {
        self.report.stats.team_slot
    }

    pub fn into_parts(self) -> (Vec<Player>, RosterRules, ValidationReport) {
        (self.players, self.rules, self.report)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
