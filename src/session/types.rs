//! Inputs and outputs of an optimization run.

use crate::config::EngineConfig;
use crate::hybrid::AlgorithmReport;
use crate::model::{
    ContestInfo, ExposureSettings, Lineup, PlayerRecord, RosterRules, TeamStack,
};
use crate::portfolio::{RiskCategory, StackShape};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything a run is initialized from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunInput {
    pub records: Vec<PlayerRecord>,
    pub rules: RosterRules,
    pub exposure: ExposureSettings,
    /// Previously generated lineups; seed the exposure counts.
    pub existing_lineups: Vec<Lineup>,
    pub contest: ContestInfo,
    pub team_stacks: Vec<TeamStack>,
    pub engine: EngineConfig,
}

impl RunInput {
    pub fn new(records: Vec<PlayerRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    pub fn with_rules(mut self, rules: RosterRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_exposure(mut self, exposure: ExposureSettings) -> Self {
        self.exposure = exposure;
        self
    }

    pub fn with_existing_lineups(mut self, lineups: Vec<Lineup>) -> Self {
        self.existing_lineups = lineups;
        self
    }

    pub fn with_contest(mut self, contest: ContestInfo) -> Self {
        self.contest = contest;
        self
    }

    pub fn with_team_stacks(mut self, stacks: Vec<TeamStack>) -> Self {
        self.team_stacks = stacks;
        self
    }

    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }
}

/// Returned by [`OptimizationRun::init_summary`](super::OptimizationRun::init_summary).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitSummary {
    pub recommended_strategy: String,
    pub complexity_score: f64,
    pub available_presets: Vec<String>,
    /// Validation warnings; never blocking.
    pub warnings: Vec<String>,
    pub player_count: usize,
}

/// Aggregate statistics of one `optimize` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSummary {
    pub requested: usize,
    pub produced: usize,
    pub best_score: f64,
    pub average_score: f64,
    pub average_salary: f64,
    pub average_ownership: f64,
    /// Mean pairwise Jaccard distance of the batch.
    pub diversity: f64,
    pub elapsed_ms: u64,
    pub per_algorithm: Vec<AlgorithmReport>,
    /// Portfolio runs only.
    pub category_counts: Option<BTreeMap<RiskCategory, usize>>,
    /// Portfolio runs only.
    pub stack_counts: Option<BTreeMap<StackShape, usize>>,
}

impl OptimizationSummary {
    pub(crate) fn from_lineups(requested: usize, lineups: &[Lineup], elapsed_ms: u64) -> Self {
        let n = lineups.len().max(1) as f64;
        Self {
            requested,
            produced: lineups.len(),
            best_score: lineups.iter().map(|l| l.score.total).fold(0.0, f64::max),
            average_score: lineups.iter().map(|l| l.score.total).sum::<f64>() / n,
            average_salary: lineups.iter().map(|l| l.total_salary as f64).sum::<f64>() / n,
            average_ownership: lineups.iter().map(Lineup::average_ownership).sum::<f64>() / n,
            diversity: crate::learning::diversity_score(lineups),
            elapsed_ms,
            ..Self::default()
        }
    }
}

/// Result of [`OptimizationRun::optimize`](super::OptimizationRun::optimize).
#[derive(Debug, Clone)]
pub struct OptimizationOutcome {
    /// Distinct lineups, best first.
    pub lineups: Vec<Lineup>,
    pub summary: OptimizationSummary,
    /// Concrete preset that ran (`recommended` is resolved).
    pub strategy_used: String,
}

/// A preset as shown to the caller of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyInfo {
    pub name: String,
    pub description: String,
    /// `auto`, `hybrid`, `portfolio` or an algorithm name.
    pub engine: String,
    /// Whether the preset suits the run's contest type.
    pub suitable: bool,
    /// Whether `recommended` resolves to this preset for the run.
    pub recommended: bool,
    /// Learned weight, for single-algorithm presets with a tracker attached.
    pub learned_weight: Option<f64>,
}
