//! Aggregated engine configuration.

use crate::annealing::AnnealingConfig;
use crate::error::{OptimizerError, Result};
use crate::evolution::EvolutionConfig;
use crate::hybrid::HybridConfig;
use crate::portfolio::PortfolioConfig;
use crate::sampling::SamplerConfig;
use serde::{Deserialize, Serialize};

/// Parameters for every engine, handed in as one document.
///
/// Missing sections and fields fall back to their defaults, so an outer
/// surface can send only what it wants to change:
///
/// ```
/// use nexus_lineup::config::EngineConfig;
///
/// let engine = EngineConfig::from_json_str(r#"{"annealing": {"runs": 2}}"#).unwrap();
/// assert_eq!(engine.annealing.runs, 2);
/// assert_eq!(engine.evolution.population_size, 100);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sampler: SamplerConfig,
    pub evolution: EvolutionConfig,
    pub annealing: AnnealingConfig,
    pub hybrid: HybridConfig,
    pub portfolio: PortfolioConfig,
}

impl EngineConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Forces one seed on every engine, for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.sampler.seed = Some(seed);
        self.evolution.seed = Some(seed);
        self.annealing.seed = Some(seed);
        self
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<()> {
        let lift = |component: &'static str| move |message: String| OptimizerError::invalid_config(component, message);
        self.sampler.validate().map_err(lift("sampler"))?;
        self.evolution.validate().map_err(lift("evolution"))?;
        self.annealing.validate().map_err(lift("annealing"))?;
        self.hybrid.validate().map_err(lift("hybrid"))?;
        self.portfolio.validate().map_err(lift("portfolio"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_validates() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let engine = EngineConfig::from_json_str(
            r#"{"sampler": {"randomness": 0.1}, "portfolio": {"candidate_multiplier": 10}}"#,
        )
        .unwrap();
        assert!((engine.sampler.randomness - 0.1).abs() < 1e-12);
        assert_eq!(engine.portfolio.candidate_multiplier, 10);
        assert_eq!(engine.annealing, AnnealingConfig::default());
    }

    #[test]
    fn test_invalid_section_names_component() {
        let err = EngineConfig::from_json_str(r#"{"annealing": {"runs": 0}}"#).unwrap_err();
        match err {
            OptimizerError::InvalidConfig { component, .. } => assert_eq!(component, "annealing"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_malformed_json() {
        let err = EngineConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, OptimizerError::Serialization(_)));
    }

    #[test]
    fn test_with_seed() {
        let engine = EngineConfig::default().with_seed(11);
        assert_eq!(engine.sampler.seed, Some(11));
        assert_eq!(engine.evolution.seed, Some(11));
        assert_eq!(engine.annealing.seed, Some(11));
    }
}
