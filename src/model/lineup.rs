//! Rosters (search state) and lineups (frozen results).

use super::player::Player;
use crate::scoring::NexusScore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Number of flex slots (one per required position).
pub const FLEX_SLOTS: usize = 5;

/// Candidate-generation algorithm that produced a lineup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Stochastic,
    Evolutionary,
    Annealing,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [
        Algorithm::Stochastic,
        Algorithm::Evolutionary,
        Algorithm::Annealing,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::Stochastic => "stochastic",
            Algorithm::Evolutionary => "evolutionary",
            Algorithm::Annealing => "annealing",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stochastic" | "monte_carlo" | "montecarlo" => Ok(Algorithm::Stochastic),
            "evolutionary" | "genetic" => Ok(Algorithm::Evolutionary),
            "annealing" | "simulated_annealing" => Ok(Algorithm::Annealing),
            other => Err(format!("unknown algorithm '{other}'")),
        }
    }
}

/// A slot within a roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Captain,
    /// Flex slot, indexed by [`Position::REQUIRED`](super::Position::REQUIRED) order.
    Flex(usize),
    Team,
}

/// Index-based roster used during search.
///
/// Indices point into the prepared player list of a
/// [`LineupContext`](crate::generator::LineupContext). Validity (distinct
/// players, position coverage, salary cap) is checked by the context, not
/// by the roster itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Roster {
    pub captain: usize,
    pub flex: [usize; FLEX_SLOTS],
    pub team: Option<usize>,
}

impl Roster {
    /// Captain plus flex players.
    pub fn core(&self) -> [usize; FLEX_SLOTS + 1] {
        let mut out = [self.captain; FLEX_SLOTS + 1];
        out[1..].copy_from_slice(&self.flex);
        out
    }

    /// Order-independent identity of the six core players.
    ///
    /// Captain reassignment among the same six players yields the same key.
    pub fn signature(&self) -> [usize; FLEX_SLOTS + 1] {
        let mut core = self.core();
        core.sort_unstable();
        core
    }

    /// Every occupied slot index, TEAM last.
    pub fn players(&self) -> impl Iterator<Item = usize> + '_ {
        self.core().into_iter().chain(self.team)
    }

    pub fn contains(&self, idx: usize) -> bool {
        self.captain == idx || self.flex.contains(&idx) || self.team == Some(idx)
    }

    pub fn get(&self, slot: Slot) -> Option<usize> {
        match slot {
            Slot::Captain => Some(self.captain),
            Slot::Flex(i) => self.flex.get(i).copied(),
            Slot::Team => self.team,
        }
    }

    pub fn set(&mut self, slot: Slot, idx: usize) {
        match slot {
            Slot::Captain => self.captain = idx,
            Slot::Flex(i) => self.flex[i] = idx,
            Slot::Team => self.team = Some(idx),
        }
    }

    /// All occupied slots.
    pub fn slots(&self) -> Vec<Slot> {
        let mut slots = Vec::with_capacity(FLEX_SLOTS + 2);
        slots.push(Slot::Captain);
        slots.extend((0..FLEX_SLOTS).map(Slot::Flex));
        if self.team.is_some() {
            slots.push(Slot::Team);
        }
        slots
    }
}

/// Per-algorithm scores attached to a lineup.
///
/// A zero means "not produced by this measure". Ranking across algorithms
/// uses the first non-zero value in field order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreCard {
    pub nexus: f64,
    pub roi: f64,
    pub fitness: f64,
    pub annealing: f64,
}

impl ScoreCard {
    /// First non-zero score among nexus, roi, fitness, annealing.
    pub fn ranking_score(&self) -> f64 {
        [self.nexus, self.roi, self.fitness, self.annealing]
            .into_iter()
            .find(|s| *s != 0.0 && s.is_finite())
            .unwrap_or(0.0)
    }
}

/// Sorted captain+flex player ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineupSignature(pub Vec<String>);

/// A frozen, fully resolved lineup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lineup {
    pub captain: Player,
    /// Flex players in [`Position::REQUIRED`](super::Position::REQUIRED) order.
    pub flex: Vec<Player>,
    pub team: Option<Player>,
    /// Effective salary, captain multiplier included.
    pub total_salary: u32,
    pub score: NexusScore,
    pub scores: ScoreCard,
    /// Generator that produced the lineup.
    pub source: Option<Algorithm>,
}

impl Lineup {
    pub fn signature(&self) -> LineupSignature {
        let mut ids: Vec<String> = std::iter::once(&self.captain)
            .chain(self.flex.iter())
            .map(|p| p.id.clone())
            .collect();
        ids.sort();
        LineupSignature(ids)
    }

    pub fn ranking_score(&self) -> f64 {
        self.scores.ranking_score()
    }

    /// Every rostered player, captain first, TEAM last.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        std::iter::once(&self.captain)
            .chain(self.flex.iter())
            .chain(self.team.iter())
    }

    /// Number of rostered players per team across all slots.
    pub fn team_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for p in self.players() {
            *counts.entry(p.team.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Mean ownership of the rostered players.
    pub fn average_ownership(&self) -> f64 {
        self.score.avg_ownership
    }

    pub fn with_source(mut self, source: Algorithm) -> Self {
        self.source = Some(source);
        self
    }
}
