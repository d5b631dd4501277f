//! Static preset catalogue and parameter overrides.

use crate::config::EngineConfig;
use crate::error::{OptimizerError, Result};
use crate::hybrid::{default_distribution, Distribution};
use crate::model::{Algorithm, ContestType};
use serde::{Deserialize, Serialize};

pub const RECOMMENDED: &str = "recommended";
pub const BALANCED: &str = "balanced";
pub const CASH_GAME: &str = "cash-game";
pub const TOURNAMENT: &str = "tournament";
pub const CONTRARIAN: &str = "contrarian";
pub const CONSTRAINT_FOCUSED: &str = "constraint-focused";
pub const PORTFOLIO: &str = "portfolio";

/// What a preset runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum StrategyEngine {
    /// Resolved from the constraint analysis at run time.
    Auto,
    Single(Algorithm),
    Hybrid(Distribution),
    /// Barbell portfolio over the engine's hybrid distribution.
    Portfolio,
}

impl StrategyEngine {
    pub fn label(&self) -> &'static str {
        match self {
            StrategyEngine::Auto => "auto",
            StrategyEngine::Single(a) => a.as_str(),
            StrategyEngine::Hybrid(_) => "hybrid",
            StrategyEngine::Portfolio => "portfolio",
        }
    }
}

/// Caller-supplied parameter changes, applied on top of a preset's own.
///
/// Every field is optional; unset fields leave the engine untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyOverrides {
    pub randomness: Option<f64>,
    pub trials_per_lineup: Option<usize>,
    pub population_size: Option<usize>,
    pub generations: Option<usize>,
    pub mutation_rate: Option<f64>,
    pub crossover_rate: Option<f64>,
    pub diversity_weight: Option<f64>,
    pub initial_temperature: Option<f64>,
    pub cooling_rate: Option<f64>,
    pub max_iterations: Option<usize>,
    pub runs: Option<usize>,
    /// Applied to all three generators.
    pub exposure_weight: Option<f64>,
    pub distribution: Option<Distribution>,
    pub candidate_multiplier: Option<usize>,
    pub parallel: Option<bool>,
    pub seed: Option<u64>,
}

impl StrategyOverrides {
    /// Fields of `other` win over fields of `self`.
    pub fn merged(&self, other: &StrategyOverrides) -> StrategyOverrides {
        macro_rules! pick {
            ($($field:ident),*) => {
                StrategyOverrides { $($field: other.$field.clone().or_else(|| self.$field.clone()),)* }
            };
        }
        pick!(
            randomness,
            trials_per_lineup,
            population_size,
            generations,
            mutation_rate,
            crossover_rate,
            diversity_weight,
            initial_temperature,
            cooling_rate,
            max_iterations,
            runs,
            exposure_weight,
            distribution,
            candidate_multiplier,
            parallel,
            seed
        )
    }

    /// Writes the set fields into `engine`.
    pub fn apply(&self, engine: &mut EngineConfig) {
        if let Some(v) = self.randomness {
            engine.sampler.randomness = v.clamp(0.0, 1.0);
        }
        if let Some(v) = self.trials_per_lineup {
            engine.sampler.trials_per_lineup = v;
        }
        if let Some(v) = self.population_size {
            engine.evolution.population_size = v;
        }
        if let Some(v) = self.generations {
            engine.evolution.generations = v;
        }
        if let Some(v) = self.mutation_rate {
            engine.evolution.mutation_rate = v.clamp(0.0, 1.0);
        }
        if let Some(v) = self.crossover_rate {
            engine.evolution.crossover_rate = v.clamp(0.0, 1.0);
        }
        if let Some(v) = self.diversity_weight {
            engine.evolution.diversity_weight = v;
        }
        if let Some(v) = self.initial_temperature {
            engine.annealing.initial_temperature = v;
        }
        if let Some(v) = self.cooling_rate {
            engine.annealing.cooling_rate = v;
        }
        if let Some(v) = self.max_iterations {
            engine.annealing.max_iterations = v;
        }
        if let Some(v) = self.runs {
            engine.annealing.runs = v;
        }
        if let Some(v) = self.exposure_weight {
            engine.sampler.exposure_weight = v;
            engine.evolution.exposure_weight = v;
            engine.annealing.exposure_weight = v;
        }
        if let Some(d) = &self.distribution {
            engine.hybrid.distribution = d.clone();
        }
        if let Some(v) = self.candidate_multiplier {
            engine.portfolio.candidate_multiplier = v;
        }
        if let Some(v) = self.parallel {
            engine.evolution.parallel = v;
            engine.annealing.parallel = v;
            engine.hybrid.parallel = v;
        }
        if let Some(seed) = self.seed {
            *engine = std::mem::take(engine).with_seed(seed);
        }
    }
}

/// A named, static strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyPreset {
    pub name: String,
    pub description: String,
    pub engine: StrategyEngine,
    /// Contest types the preset is built for; empty means any.
    pub suitable_for: Vec<ContestType>,
    pub overrides: StrategyOverrides,
}

impl StrategyPreset {
    fn new(name: &str, description: &str, engine: StrategyEngine) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            engine,
            suitable_for: Vec::new(),
            overrides: StrategyOverrides::default(),
        }
    }

    fn for_contests(mut self, contests: &[ContestType]) -> Self {
        self.suitable_for = contests.to_vec();
        self
    }

    fn with_overrides(mut self, overrides: StrategyOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Whether the preset suits a contest of this type.
    pub fn is_suitable(&self, contest_type: Option<ContestType>) -> bool {
        match contest_type {
            Some(t) => self.suitable_for.is_empty() || self.suitable_for.contains(&t),
            None => true,
        }
    }

    /// Engine configuration with the preset's overrides, then `custom`, applied.
    pub fn configure(&self, base: &EngineConfig, custom: Option<&StrategyOverrides>) -> EngineConfig {
        let mut engine = base.clone();
        let overrides = match custom {
            Some(c) => self.overrides.merged(c),
            None => self.overrides.clone(),
        };
        overrides.apply(&mut engine);
        engine
    }
}

/// The preset catalogue, in display order.
pub fn presets() -> Vec<StrategyPreset> {
    use ContestType::*;
    vec![
        StrategyPreset::new(
            RECOMMENDED,
            "Chosen from the exposure settings and contest metadata",
            StrategyEngine::Auto,
        ),
        StrategyPreset::new(
            BALANCED,
            "Blend of sampling, evolution and annealing (40/30/30)",
            StrategyEngine::Hybrid(default_distribution()),
        ),
        StrategyPreset::new(
            CASH_GAME,
            "Low-variance sampling around the highest projections",
            StrategyEngine::Single(Algorithm::Stochastic),
        )
        .for_contests(&[Cash, DoubleUp])
        .with_overrides(StrategyOverrides {
            randomness: Some(0.15),
            trials_per_lineup: Some(60),
            ..StrategyOverrides::default()
        }),
        StrategyPreset::new(
            TOURNAMENT,
            "Evolution with moderate diversity for top-heavy payouts",
            StrategyEngine::Single(Algorithm::Evolutionary),
        )
        .for_contests(&[Gpp, Tournament])
        .with_overrides(StrategyOverrides {
            diversity_weight: Some(0.25),
            mutation_rate: Some(0.25),
            ..StrategyOverrides::default()
        }),
        StrategyPreset::new(
            CONTRARIAN,
            "High-diversity evolution that leans away from chalk",
            StrategyEngine::Single(Algorithm::Evolutionary),
        )
        .for_contests(&[Gpp, Tournament, SingleEntry])
        .with_overrides(StrategyOverrides {
            diversity_weight: Some(0.4),
            mutation_rate: Some(0.3),
            ..StrategyOverrides::default()
        }),
        StrategyPreset::new(
            CONSTRAINT_FOCUSED,
            "Annealing that weighs exposure targets heavily",
            StrategyEngine::Single(Algorithm::Annealing),
        )
        .with_overrides(StrategyOverrides {
            exposure_weight: Some(5.0),
            ..StrategyOverrides::default()
        }),
        StrategyPreset::new(
            PORTFOLIO,
            "Barbell portfolio of high-floor, high-ceiling and balanced lineups",
            StrategyEngine::Portfolio,
        )
        .for_contests(&[Gpp, Tournament]),
    ]
}

/// Looks a preset up by name, ignoring case.
pub fn find_preset(name: &str) -> Result<StrategyPreset> {
    let wanted = name.trim();
    presets()
        .into_iter()
        .find(|p| p.name.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| OptimizerError::UnknownStrategy {
            name: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_names_unique() {
        let all = presets();
        assert_eq!(all.len(), 7);
        let mut names: Vec<_> = all.iter().map(|p| p.name.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 7);
    }

    #[test]
    fn test_find_preset() {
        assert_eq!(find_preset("Cash-Game").unwrap().name, CASH_GAME);
        assert_eq!(
            find_preset(CONSTRAINT_FOCUSED).unwrap().engine,
            StrategyEngine::Single(Algorithm::Annealing)
        );
        let err = find_preset("moonshot").unwrap_err();
        assert!(matches!(err, OptimizerError::UnknownStrategy { ref name } if name == "moonshot"));
    }

    #[test]
    fn test_preset_overrides_apply() {
        let preset = find_preset(CONSTRAINT_FOCUSED).unwrap();
        let engine = preset.configure(&EngineConfig::default(), None);
        assert_eq!(engine.annealing.exposure_weight, 5.0);
        assert_eq!(engine.sampler.exposure_weight, 5.0);
        assert!(engine.validate().is_ok());
    }

    #[test]
    fn test_custom_overrides_win() {
        let preset = find_preset(CASH_GAME).unwrap();
        let custom = StrategyOverrides {
            randomness: Some(0.5),
            seed: Some(7),
            ..StrategyOverrides::default()
        };
        let engine = preset.configure(&EngineConfig::default(), Some(&custom));
        assert_eq!(engine.sampler.randomness, 0.5);
        assert_eq!(engine.sampler.trials_per_lineup, 60);
        assert_eq!(engine.annealing.seed, Some(7));
    }

    #[test]
    fn test_suitability() {
        let cash = find_preset(CASH_GAME).unwrap();
        assert!(cash.is_suitable(Some(ContestType::DoubleUp)));
        assert!(!cash.is_suitable(Some(ContestType::Gpp)));
        assert!(cash.is_suitable(None));
        assert!(find_preset(BALANCED).unwrap().is_suitable(Some(ContestType::Gpp)));
    }

    #[test]
    fn test_overrides_deserialize_partial() {
        let o: StrategyOverrides =
            serde_json::from_str(r#"{"randomness": 0.2, "distribution": {"annealing": 100}}"#).unwrap();
        assert_eq!(o.randomness, Some(0.2));
        assert_eq!(o.distribution.unwrap().len(), 1);
        assert!(o.runs.is_none());
    }
}
