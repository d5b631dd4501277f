//! Exposure targets and batch-level appearance tracking.
//!
//! Exposure constraints are advisory: a roster that would push a player,
//! team or captain position outside its band is penalized in scoring, never
//! rejected outright.

use super::lineup::Lineup;
use super::player::{Player, Position};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Minimum and maximum share of a batch, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExposureBand {
    pub min: f64,
    pub max: f64,
}

impl Default for ExposureBand {
    fn default() -> Self {
        Self { min: 0.0, max: 100.0 }
    }
}

impl ExposureBand {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// A band that actually restricts something.
    pub fn is_active(&self) -> bool {
        self.min > 0.0 || self.max < 100.0
    }

    pub fn contains(&self, pct: f64) -> bool {
        pct >= self.min && pct <= self.max
    }
}

/// Team-level exposure target, optionally asking for a stack of a given size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamExposure {
    pub team: String,
    #[serde(default)]
    pub band: ExposureBand,
    /// Desired number of same-team players whenever the team is used.
    #[serde(default)]
    pub stack_size: Option<usize>,
}

impl TeamExposure {
    pub fn is_active(&self) -> bool {
        self.band.is_active() || self.stack_size.is_some_and(|s| s > 0)
    }
}

/// Exposure settings for a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExposureSettings {
    /// Keyed by player id.
    pub players: BTreeMap<String, ExposureBand>,
    pub teams: Vec<TeamExposure>,
    /// Bands on the captain's position.
    pub positions: BTreeMap<Position, ExposureBand>,
}

impl ExposureSettings {
    pub fn with_player(mut self, id: impl Into<String>, band: ExposureBand) -> Self {
        self.players.insert(id.into(), band);
        self
    }

    pub fn with_team(mut self, team: TeamExposure) -> Self {
        self.teams.push(team);
        self
    }

    pub fn with_position(mut self, position: Position, band: ExposureBand) -> Self {
        self.positions.insert(position, band);
        self
    }

    pub fn team(&self, name: &str) -> Option<&TeamExposure> {
        self.teams.iter().find(|t| t.team == name)
    }

    pub fn is_empty(&self) -> bool {
        !self.players.values().any(ExposureBand::is_active)
            && !self.teams.iter().any(TeamExposure::is_active)
            && !self.positions.values().any(ExposureBand::is_active)
    }
}

/// Appearance counts across a batch of lineups.
#[derive(Debug, Clone, Default)]
pub struct ExposureTracker {
    total: usize,
    players: HashMap<String, usize>,
    teams: HashMap<String, usize>,
    captain_positions: HashMap<Position, usize>,
}

/// Penalty per missing player when a team is used below its stack target.
const STACK_SHORTFALL_PENALTY: f64 = 5.0;

impl ExposureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lineups(lineups: &[Lineup]) -> Self {
        let mut tracker = Self::new();
        for lineup in lineups {
            tracker.record(lineup);
        }
        tracker
    }

    /// Number of lineups recorded.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn record(&mut self, lineup: &Lineup) {
        let others: Vec<&Player> = lineup.flex.iter().chain(lineup.team.iter()).collect();
        self.record_players(&lineup.captain, &others);
    }

    /// Records one lineup given its captain and remaining players.
    pub fn record_players(&mut self, captain: &Player, others: &[&Player]) {
        self.total += 1;
        let mut teams = BTreeSet::new();
        for p in std::iter::once(captain).chain(others.iter().copied()) {
            *self.players.entry(p.id.clone()).or_insert(0) += 1;
            teams.insert(p.team.as_str());
        }
        for team in teams {
            *self.teams.entry(team.to_string()).or_insert(0) += 1;
        }
        *self.captain_positions.entry(captain.position).or_insert(0) += 1;
    }

    fn pct(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64 * 100.0
        }
    }

    pub fn player_exposure(&self, id: &str) -> f64 {
        self.pct(self.players.get(id).copied().unwrap_or(0))
    }

    pub fn team_exposure(&self, team: &str) -> f64 {
        self.pct(self.teams.get(team).copied().unwrap_or(0))
    }

    pub fn captain_position_exposure(&self, position: Position) -> f64 {
        self.pct(self.captain_positions.get(&position).copied().unwrap_or(0))
    }

    /// True when the player's current exposure lies outside its band.
    pub fn is_outside_band(&self, settings: &ExposureSettings, id: &str) -> bool {
        match settings.players.get(id) {
            Some(band) if band.is_active() => {
                let current = self.player_exposure(id);
                if self.total == 0 {
                    band.max <= 0.0
                } else {
                    !band.contains(current)
                }
            }
            _ => false,
        }
    }

    /// Exposure after hypothetically adding one more lineup containing
    /// `count` appearances.
    fn projected(&self, count: usize, included: bool) -> f64 {
        let count = count + usize::from(included);
        count as f64 / (self.total + 1) as f64 * 100.0
    }

    /// True when adding the roster would push any player above their maximum.
    pub fn would_exceed(&self, settings: &ExposureSettings, captain: &Player, others: &[&Player]) -> bool {
        std::iter::once(captain)
            .chain(others.iter().copied())
            .any(|p| match settings.players.get(&p.id) {
                Some(band) if band.is_active() => {
                    let count = self.players.get(&p.id).copied().unwrap_or(0);
                    self.projected(count, true) > band.max
                }
                _ => false,
            })
    }

    /// Soft penalty, in percentage points, for adding a roster to the batch.
    ///
    /// Positive when the roster pushes something above its maximum (or uses
    /// a team below its stack target); negative when it lifts something that
    /// is still below its minimum.
    pub fn penalty(&self, settings: &ExposureSettings, captain: &Player, others: &[&Player]) -> f64 {
        if settings.is_empty() {
            return 0.0;
        }

        let mut penalty = 0.0;
        let mut team_counts: BTreeMap<&str, usize> = BTreeMap::new();

        for p in std::iter::once(captain).chain(others.iter().copied()) {
            *team_counts.entry(p.team.as_str()).or_insert(0) += 1;
            if let Some(band) = settings.players.get(&p.id) {
                let count = self.players.get(&p.id).copied().unwrap_or(0);
                penalty += band_penalty(band, self.pct(count), self.projected(count, true));
            }
        }

        for (team, &rostered) in &team_counts {
            if let Some(rule) = settings.team(team) {
                let count = self.teams.get(*team).copied().unwrap_or(0);
                penalty += band_penalty(&rule.band, self.pct(count), self.projected(count, true));
                if let Some(target) = rule.stack_size {
                    if rostered < target {
                        penalty += (target - rostered) as f64 * STACK_SHORTFALL_PENALTY;
                    }
                }
            }
        }

        if let Some(band) = settings.positions.get(&captain.position) {
            let count = self.captain_positions.get(&captain.position).copied().unwrap_or(0);
            penalty += band_penalty(band, self.pct(count), self.projected(count, true));
        }

        penalty
    }
}

fn band_penalty(band: &ExposureBand, current: f64, projected: f64) -> f64 {
    if !band.is_active() {
        return 0.0;
    }
    let mut penalty = 0.0;
    if projected > band.max {
        penalty += projected - band.max;
    }
    if current < band.min {
        penalty -= band.min - current;
    }
    penalty
}
