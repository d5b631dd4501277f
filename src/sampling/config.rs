//! Stochastic sampler configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the stochastic sampler.
///
/// # Examples
///
/// ```
/// use nexus_lineup::sampling::SamplerConfig;
///
/// let config = SamplerConfig::default()
///     .with_randomness(0.1)
///     .with_trials_per_lineup(60)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Sampling temperature in `[0, 1]`.
    ///
    /// 0 always takes the best points-per-salary candidate; 1 samples close
    /// to uniformly.
    pub randomness: f64,

    /// Trials attempted per requested lineup.
    pub trials_per_lineup: usize,

    /// Lower bound on the total number of trials.
    pub min_trials: usize,

    /// Trials between cancellation checks and progress reports.
    pub batch_size: usize,

    /// Weight of the exposure penalty when ranking candidates.
    pub exposure_weight: f64,

    /// Probability that a trial is seeded from a team stack.
    ///
    /// Stacks are chosen in proportion to their Stack+ rating.
    pub stack_probability: f64,

    /// Random seed for reproducibility. `None` draws a fresh seed.
    pub seed: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            randomness: 0.35,
            trials_per_lineup: 40,
            min_trials: 500,
            batch_size: 100,
            exposure_weight: 1.0,
            stack_probability: 0.3,
            seed: None,
        }
    }
}

impl SamplerConfig {
    pub fn with_randomness(mut self, randomness: f64) -> Self {
        self.randomness = randomness.clamp(0.0, 1.0);
        self
    }

    pub fn with_trials_per_lineup(mut self, n: usize) -> Self {
        self.trials_per_lineup = n;
        self
    }

    pub fn with_min_trials(mut self, n: usize) -> Self {
        self.min_trials = n;
        self
    }

    pub fn with_batch_size(mut self, n: usize) -> Self {
        self.batch_size = n;
        self
    }

    pub fn with_exposure_weight(mut self, weight: f64) -> Self {
        self.exposure_weight = weight;
        self
    }

    pub fn with_stack_probability(mut self, p: f64) -> Self {
        self.stack_probability = p.clamp(0.0, 1.0);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Total trials for a request of `count` lineups.
    pub fn total_trials(&self, count: usize) -> usize {
        count.saturating_mul(self.trials_per_lineup).max(self.min_trials)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.randomness) {
            return Err(format!("randomness must be in [0, 1], got {}", self.randomness));
        }
        if self.trials_per_lineup == 0 {
            return Err("trials_per_lineup must be at least 1".into());
        }
        if self.batch_size == 0 {
            return Err("batch_size must be at least 1".into());
        }
        if !self.exposure_weight.is_finite() || self.exposure_weight < 0.0 {
            return Err("exposure_weight must be non-negative".into());
        }
        if !(0.0..=1.0).contains(&self.stack_probability) {
            return Err("stack_probability must be in [0, 1]".into());
        }
        Ok(())
    }
}
