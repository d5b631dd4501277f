//! Players, positions and roster rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roster position.
///
/// `Team` is the optional team-defense style slot; the other five are the
/// required flex positions and are the only ones eligible for captain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Position {
    Top,
    Jng,
    Mid,
    Adc,
    Sup,
    Team,
}

impl Position {
    /// Required flex positions, in slot order.
    pub const REQUIRED: [Position; 5] = [
        Position::Top,
        Position::Jng,
        Position::Mid,
        Position::Adc,
        Position::Sup,
    ];

    /// Slot index within [`Position::REQUIRED`], `None` for `Team`.
    pub fn slot_index(self) -> Option<usize> {
        Self::REQUIRED.iter().position(|&p| p == self)
    }

    pub fn is_required(self) -> bool {
        self != Position::Team
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Position::Top => "TOP",
            Position::Jng => "JNG",
            Position::Mid => "MID",
            Position::Adc => "ADC",
            Position::Sup => "SUP",
            Position::Team => "TEAM",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TOP" => Ok(Position::Top),
            "JNG" | "JUNGLE" => Ok(Position::Jng),
            "MID" => Ok(Position::Mid),
            "ADC" | "BOT" => Ok(Position::Adc),
            "SUP" | "SUPPORT" => Ok(Position::Sup),
            "TEAM" => Ok(Position::Team),
            other => Err(format!("unknown position '{other}'")),
        }
    }
}

/// Raw player record as handed over by the upload/parsing layer.
///
/// Nothing about it is trusted; [`crate::validation::validate`] checks it
/// before it becomes a [`Player`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: String,
    pub name: String,
    pub team: String,
    pub position: String,
    pub salary: f64,
    pub projected_points: f64,
    #[serde(default)]
    pub ownership: f64,
}

impl PlayerRecord {
    /// Converts into a typed player, or `None` if the record is malformed.
    pub fn to_player(&self) -> Option<Player> {
        let position = self.position.parse().ok()?;
        if self.name.trim().is_empty() || self.team.trim().is_empty() {
            return None;
        }
        if !self.salary.is_finite() || self.salary < 0.0 || self.salary > u32::MAX as f64 {
            return None;
        }
        if !self.projected_points.is_finite() || self.projected_points < 0.0 {
            return None;
        }
        Some(Player {
            id: self.id.clone(),
            name: self.name.trim().to_string(),
            team: self.team.trim().to_string(),
            position,
            salary: self.salary.round() as u32,
            projected_points: self.projected_points,
            ownership: if self.ownership.is_finite() {
                self.ownership.clamp(0.0, 100.0)
            } else {
                0.0
            },
        })
    }
}

/// A validated pool member. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub team: String,
    pub position: Position,
    pub salary: u32,
    pub projected_points: f64,
    /// Projected ownership percentage, 0–100.
    pub ownership: f64,
}

impl Player {
    /// Projected points per $1,000 of salary.
    pub fn value(&self) -> f64 {
        self.projected_points / (self.salary.max(1) as f64 / 1000.0)
    }
}

/// Salary cap and slot layout of a captain-mode roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterRules {
    pub salary_cap: u32,

    /// Salary and scoring multiplier applied to the captain slot.
    pub captain_multiplier: f64,

    /// Whether the roster carries a TEAM slot (only honored if the pool
    /// contains TEAM players).
    pub team_slot: bool,

    /// Pool-level balance threshold used by the validator.
    pub max_players_per_team: usize,
}

impl Default for RosterRules {
    fn default() -> Self {
        Self {
            salary_cap: 50_000,
            captain_multiplier: 1.5,
            team_slot: true,
            max_players_per_team: 5,
        }
    }
}

impl RosterRules {
    pub fn with_salary_cap(mut self, cap: u32) -> Self {
        self.salary_cap = cap;
        self
    }

    pub fn with_team_slot(mut self, team_slot: bool) -> Self {
        self.team_slot = team_slot;
        self
    }

    pub fn with_max_players_per_team(mut self, n: usize) -> Self {
        self.max_players_per_team = n;
        self
    }

    /// Effective salary of a player placed in the captain slot.
    pub fn captain_salary(&self, salary: u32) -> u32 {
        (salary as f64 * self.captain_multiplier).round() as u32
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.salary_cap == 0 {
            return Err("salary_cap must be positive".into());
        }
        if !(self.captain_multiplier >= 1.0) {
            return Err(format!(
                "captain_multiplier must be at least 1.0, got {}",
                self.captain_multiplier
            ));
        }
        Ok(())
    }
}
