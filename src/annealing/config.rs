//! Annealing configuration.

use serde::{Deserialize, Serialize};

/// Upper bound on independent annealing runs.
pub const MAX_RUNS: usize = 10;

/// Configuration for simulated annealing.
///
/// Temperature decays geometrically every iteration
/// (`T_{k+1} = cooling_rate * T_k`) and is multiplied by `reheat_factor`
/// after `stagnation_threshold` iterations without a new best.
///
/// # Examples
///
/// ```
/// use nexus_lineup::annealing::AnnealingConfig;
///
/// let config = AnnealingConfig::default()
///     .with_initial_temperature(50.0)
///     .with_cooling_rate(0.99)
///     .with_runs(2)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealingConfig {
    /// Starting temperature. Higher values accept more degrading moves.
    pub initial_temperature: f64,

    /// Geometric cooling factor in (0, 1). Higher = slower cooling.
    pub cooling_rate: f64,

    /// The run stops once the temperature drops below this.
    pub min_temperature: f64,

    /// Hard iteration budget per run.
    pub max_iterations: usize,

    /// Neighbors sampled per iteration; the best one is proposed.
    pub neighbors_per_iteration: usize,

    /// Degrading moves whose acceptance probability falls below this are
    /// always rejected.
    pub min_acceptance_probability: f64,

    /// Iterations without a new best before reheating.
    pub stagnation_threshold: usize,

    /// Temperature multiplier on reheat (capped at the initial temperature).
    pub reheat_factor: f64,

    /// Independent runs, at most [`MAX_RUNS`].
    pub runs: usize,

    /// Weight of the exposure penalty in the annealing score.
    pub exposure_weight: f64,

    /// Attempts per requested lineup when deriving variants of the best
    /// solution.
    pub mutation_variants: usize,

    /// Whether independent runs execute on a bounded thread pool.
    pub parallel: bool,

    /// Random seed for reproducibility. `None` draws a fresh seed.
    pub seed: Option<u64>,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 100.0,
            cooling_rate: 0.995,
            min_temperature: 0.1,
            max_iterations: 2000,
            neighbors_per_iteration: 8,
            min_acceptance_probability: 0.01,
            stagnation_threshold: 150,
            reheat_factor: 1.5,
            runs: 4,
            exposure_weight: 2.0,
            mutation_variants: 20,
            parallel: true,
            seed: None,
        }
    }
}

impl AnnealingConfig {
    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = t;
        self
    }

    pub fn with_cooling_rate(mut self, rate: f64) -> Self {
        self.cooling_rate = rate;
        self
    }

    pub fn with_min_temperature(mut self, t: f64) -> Self {
        self.min_temperature = t;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_neighbors_per_iteration(mut self, n: usize) -> Self {
        self.neighbors_per_iteration = n;
        self
    }

    pub fn with_min_acceptance_probability(mut self, p: f64) -> Self {
        self.min_acceptance_probability = p.clamp(0.0, 1.0);
        self
    }

    pub fn with_stagnation_threshold(mut self, n: usize) -> Self {
        self.stagnation_threshold = n;
        self
    }

    pub fn with_reheat_factor(mut self, factor: f64) -> Self {
        self.reheat_factor = factor;
        self
    }

    pub fn with_runs(mut self, runs: usize) -> Self {
        self.runs = runs;
        self
    }

    pub fn with_exposure_weight(mut self, weight: f64) -> Self {
        self.exposure_weight = weight;
        self
    }

    pub fn with_mutation_variants(mut self, n: usize) -> Self {
        self.mutation_variants = n;
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

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.initial_temperature <= 0.0 {
            return Err("initial_temperature must be positive".into());
        }
        if self.min_temperature <= 0.0 {
            return Err("min_temperature must be positive".into());
        }
        if self.min_temperature >= self.initial_temperature {
            return Err("min_temperature must be less than initial_temperature".into());
        }
        if self.cooling_rate <= 0.0 || self.cooling_rate >= 1.0 {
            return Err(format!("cooling_rate must be in (0, 1), got {}", self.cooling_rate));
        }
        if self.max_iterations == 0 {
            return Err("max_iterations must be at least 1".into());
        }
        if self.neighbors_per_iteration == 0 {
            return Err("neighbors_per_iteration must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&self.min_acceptance_probability) {
            return Err("min_acceptance_probability must be in [0, 1]".into());
        }
        if self.reheat_factor < 1.0 {
            return Err(format!("reheat_factor must be at least 1, got {}", self.reheat_factor));
        }
        if self.runs == 0 || self.runs > MAX_RUNS {
            return Err(format!("runs must be in 1..={MAX_RUNS}, got {}", self.runs));
        }
        if !self.exposure_weight.is_finite() || self.exposure_weight < 0.0 {
            return Err("exposure_weight must be non-negative".into());
        }
        if self.mutation_variants == 0 {
            return Err("mutation_variants must be at least 1".into());
        }
        Ok(())
    }
}
