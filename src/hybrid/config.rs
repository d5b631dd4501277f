//! Hybrid orchestration configuration.

use crate::model::Algorithm;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Share of a batch, in percent, assigned to each algorithm.
pub type Distribution = BTreeMap<Algorithm, f64>;

/// The balanced 40/30/30 split.
pub fn default_distribution() -> Distribution {
    BTreeMap::from([
        (Algorithm::Stochastic, 40.0),
        (Algorithm::Evolutionary, 30.0),
        (Algorithm::Annealing, 30.0),
    ])
}

/// Distribution that gives the whole batch to one algorithm.
pub fn single(algorithm: Algorithm) -> Distribution {
    BTreeMap::from([(algorithm, 100.0)])
}

/// Checks that every share is a finite non-negative percentage and that the
/// shares sum to a positive total of at most 100.
pub fn validate_distribution(distribution: &Distribution) -> Result<(), String> {
    let mut total = 0.0;
    for (algorithm, pct) in distribution {
        if !pct.is_finite() || *pct < 0.0 {
            return Err(format!("share for {algorithm} must be a non-negative percentage, got {pct}"));
        }
        total += pct;
    }
    if total <= 0.0 {
        return Err("distribution must assign a positive share".into());
    }
    if total > 100.0 + 1e-6 {
        return Err(format!("distribution shares sum to {total}, more than 100"));
    }
    Ok(())
}

/// Configuration for the hybrid orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridConfig {
    /// Run the algorithms of a distribution concurrently on a bounded pool.
    pub parallel: bool,

    /// Split used by the balanced preset and by portfolio candidate
    /// generation.
    pub distribution: Distribution,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            distribution: default_distribution(),
        }
    }
}

impl HybridConfig {
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_distribution(mut self, distribution: Distribution) -> Self {
        self.distribution = distribution;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_distribution(&self.distribution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_distribution_sums_to_100() {
        let d = default_distribution();
        assert_eq!(d.values().sum::<f64>(), 100.0);
        assert!(HybridConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_shares() {
        let negative = BTreeMap::from([(Algorithm::Stochastic, -5.0)]);
        assert!(validate_distribution(&negative).is_err());
        let empty = Distribution::new();
        assert!(validate_distribution(&empty).is_err());
        let over = BTreeMap::from([(Algorithm::Stochastic, 80.0), (Algorithm::Annealing, 40.0)]);
        assert!(validate_distribution(&over).is_err());
    }

    #[test]
    fn test_serde_uses_algorithm_names() {
        let json = serde_json::to_string(&HybridConfig::default()).unwrap();
        assert!(json.contains("\"stochastic\":40.0"));
        let back: HybridConfig = serde_json::from_str(r#"{"distribution": {"annealing": 100}}"#).unwrap();
        assert_eq!(back.distribution, single(Algorithm::Annealing));
        assert!(back.parallel);
    }
}
