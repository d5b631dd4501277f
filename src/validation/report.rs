//! Validation output.

use crate::model::Position;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary statistics over the parsed part of a pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolStats {
    pub player_count: usize,
    pub team_count: usize,
    pub position_counts: BTreeMap<Position, usize>,
    pub min_salary: u32,
    pub max_salary: u32,
    pub avg_salary: f64,
    pub avg_projection: f64,
    pub avg_ownership: f64,
    /// Cheapest possible lineup, when every required position is covered.
    pub min_lineup_salary: Option<u64>,
    pub salary_cap: u32,
    /// Whether lineups built from this pool carry a TEAM slot.
    pub team_slot: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub stats: PoolStats,
}

impl ValidationReport {
    pub(crate) fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub(crate) fn finish(mut self) -> Self {
        self.is_valid = self.errors.is_empty();
        self
    }
}
