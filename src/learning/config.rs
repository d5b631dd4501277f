//! Learning configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the performance learning system.
///
/// Weights adapt by exponential smoothing: after each qualifying record,
/// `w = (1 - reaction_factor) * w + reaction_factor * target`, with the
/// target clamped to `[min_weight, max_weight]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Records kept; the oldest are evicted beyond this.
    pub history_cap: usize,

    /// Records an algorithm needs before its weight moves.
    pub min_records: usize,

    /// Smoothing factor in (0, 1].
    pub reaction_factor: f64,

    /// Composite score that maps to a target weight of 1.0.
    pub reference_score: f64,

    pub min_weight: f64,
    pub max_weight: f64,

    pub history_key: String,
    pub weights_key: String,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            history_cap: 100,
            min_records: 10,
            reaction_factor: 0.1,
            reference_score: 100.0,
            min_weight: 0.5,
            max_weight: 2.0,
            history_key: "nexus.performance_history".into(),
            weights_key: "nexus.algorithm_weights".into(),
        }
    }
}

impl LearningConfig {
    pub fn with_history_cap(mut self, n: usize) -> Self {
        self.history_cap = n;
        self
    }

    pub fn with_min_records(mut self, n: usize) -> Self {
        self.min_records = n;
        self
    }

    pub fn with_reaction_factor(mut self, rho: f64) -> Self {
        self.reaction_factor = rho;
        self
    }

    pub fn with_reference_score(mut self, score: f64) -> Self {
        self.reference_score = score;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.history_cap == 0 {
            return Err("history_cap must be at least 1".into());
        }
        if self.min_records == 0 {
            return Err("min_records must be at least 1".into());
        }
        if self.reaction_factor <= 0.0 || self.reaction_factor > 1.0 {
            return Err(format!(
                "reaction_factor must be in (0, 1], got {}",
                self.reaction_factor
            ));
        }
        if self.reference_score <= 0.0 {
            return Err("reference_score must be positive".into());
        }
        if self.min_weight <= 0.0 || self.min_weight > self.max_weight {
            return Err("weight bounds must satisfy 0 < min_weight <= max_weight".into());
        }
        if self.history_key.is_empty() || self.weights_key.is_empty() {
            return Err("storage keys must not be empty".into());
        }
        Ok(())
    }
}
