//! Evolution configuration.
//!
//! [`EvolutionConfig`] holds all parameters that control the generational loop.

use super::selection::Selection;
use serde::{Deserialize, Serialize};

/// Configuration for population evolution.
///
/// # Defaults
///
/// ```
/// use nexus_lineup::evolution::EvolutionConfig;
///
/// let config = EvolutionConfig::default();
/// assert_eq!(config.population_size, 100);
/// assert_eq!(config.generations, 60);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use nexus_lineup::evolution::{EvolutionConfig, Selection};
///
/// let config = EvolutionConfig::default()
///     .with_population_size(200)
///     .with_selection(Selection::Tournament(3))
///     .with_diversity_weight(0.3)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Number of rosters in the population.
    ///
    /// Raised to the requested lineup count when that is larger.
    pub population_size: usize,

    /// Number of generations to run.
    pub generations: usize,

    /// Parent selection strategy.
    pub selection: Selection,

    /// Probability of position-wise crossover for an offspring (0.0–1.0).
    ///
    /// Otherwise the offspring starts as a copy of its first parent.
    pub crossover_rate: f64,

    /// Probability of replacing one slot of an offspring (0.0–1.0).
    pub mutation_rate: f64,

    /// Fraction of the population copied unchanged into the next generation.
    pub elite_ratio: f64,

    /// Penalty share (0.0–1.0) applied during final selection for each
    /// already-selected roster with the same team composition.
    pub diversity_weight: f64,

    /// Weight of the exposure penalty in fitness.
    pub exposure_weight: f64,

    /// Generations without a new best before stopping early. 0 disables.
    pub stagnation_limit: usize,

    /// Whether to evaluate offspring in parallel using rayon.
    pub parallel: bool,

    /// Random seed for reproducibility. `None` draws a fresh seed.
    pub seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            generations: 60,
            selection: Selection::default(),
            crossover_rate: 0.8,
            mutation_rate: 0.2,
            elite_ratio: 0.1,
            diversity_weight: 0.15,
            exposure_weight: 1.0,
            stagnation_limit: 25,
            parallel: true,
            seed: None,
        }
    }
}

impl EvolutionConfig {
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_generations(mut self, n: usize) -> Self {
        self.generations = n;
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_elite_ratio(mut self, ratio: f64) -> Self {
        self.elite_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    pub fn with_diversity_weight(mut self, weight: f64) -> Self {
        self.diversity_weight = weight.clamp(0.0, 1.0);
        self
    }

    pub fn with_exposure_weight(mut self, weight: f64) -> Self {
        self.exposure_weight = weight;
        self
    }

    pub fn with_stagnation_limit(mut self, limit: usize) -> Self {
        self.stagnation_limit = limit;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Population size used for a request of `count` lineups.
    pub fn population_for(&self, count: usize) -> usize {
        self.population_size.max(count)
    }

    /// Number of elites for a population of `size`.
    pub fn elite_count(&self, size: usize) -> usize {
        (size as f64 * self.elite_ratio) as usize
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.population_size < 2 {
            return Err("population_size must be at least 2".into());
        }
        if self.generations == 0 {
            return Err("generations must be at least 1".into());
        }
        if self.elite_count(self.population_size) >= self.population_size {
            return Err("elite_ratio too high: elites fill entire population".into());
        }
        for (name, rate) in [
            ("crossover_rate", self.crossover_rate),
            ("mutation_rate", self.mutation_rate),
            ("diversity_weight", self.diversity_weight),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(format!("{name} must be in [0, 1], got {rate}"));
            }
        }
        if !self.exposure_weight.is_finite() || self.exposure_weight < 0.0 {
            return Err("exposure_weight must be non-negative".into());
        }
        Ok(())
    }
}
