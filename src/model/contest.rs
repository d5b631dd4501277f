//! Contest metadata and team-stack ratings.

use super::player::Position;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContestType {
    Cash,
    DoubleUp,
    Gpp,
    Tournament,
    SingleEntry,
}

impl ContestType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContestType::Cash => "cash",
            ContestType::DoubleUp => "double_up",
            ContestType::Gpp => "gpp",
            ContestType::Tournament => "tournament",
            ContestType::SingleEntry => "single_entry",
        }
    }

    /// Cash-style contests pay a large share of the field.
    pub fn is_cash(self) -> bool {
        matches!(self, ContestType::Cash | ContestType::DoubleUp)
    }

    /// Top-heavy payout contests.
    pub fn is_tournament(self) -> bool {
        matches!(self, ContestType::Gpp | ContestType::Tournament)
    }
}

impl fmt::Display for ContestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "cash" => Ok(ContestType::Cash),
            "double_up" | "doubleup" => Ok(ContestType::DoubleUp),
            "gpp" => Ok(ContestType::Gpp),
            "tournament" => Ok(ContestType::Tournament),
            "single_entry" | "singleentry" => Ok(ContestType::SingleEntry),
            other => Err(format!("unknown contest type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContestInfo {
    pub contest_type: Option<ContestType>,
    pub field_size: Option<u32>,
}

impl ContestInfo {
    pub fn new(contest_type: ContestType, field_size: u32) -> Self {
        Self {
            contest_type: Some(contest_type),
            field_size: Some(field_size),
        }
    }
}

/// Externally rated same-team position grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStack {
    pub team: String,
    pub positions: Vec<Position>,
    /// Historical correlation rating; higher means the grouping tends to
    /// score together.
    #[serde(default)]
    pub stack_plus: f64,
}
