//! Portfolio configuration.

use serde::{Deserialize, Serialize};

/// Configuration for barbell portfolio construction.
///
/// Category shares are percentages of the requested size; the balanced
/// category absorbs rounding leftovers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    /// Candidates generated per requested lineup.
    pub candidate_multiplier: usize,

    pub high_floor_pct: f64,
    pub high_ceiling_pct: f64,
    pub balanced_pct: f64,

    /// Average ownership (percent) at or above which a lineup is high-floor.
    pub high_floor_ownership: f64,

    /// Average ownership (percent) at or below which a lineup is
    /// high-ceiling.
    pub high_ceiling_ownership: f64,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            candidate_multiplier: 25,
            high_floor_pct: 35.0,
            high_ceiling_pct: 35.0,
            balanced_pct: 30.0,
            high_floor_ownership: 15.0,
            high_ceiling_ownership: 8.0,
        }
    }
}

impl PortfolioConfig {
    pub fn with_candidate_multiplier(mut self, n: usize) -> Self {
        self.candidate_multiplier = n;
        self
    }

    pub fn with_shares(mut self, high_floor: f64, high_ceiling: f64, balanced: f64) -> Self {
        self.high_floor_pct = high_floor;
        self.high_ceiling_pct = high_ceiling;
        self.balanced_pct = balanced;
        self
    }

    pub fn with_ownership_thresholds(mut self, high_floor: f64, high_ceiling: f64) -> Self {
        self.high_floor_ownership = high_floor;
        self.high_ceiling_ownership = high_ceiling;
        self
    }

    /// Candidates generated for a portfolio of `size`; saturates.
    pub fn candidate_count(&self, size: usize) -> usize {
        size.saturating_mul(self.candidate_multiplier)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.candidate_multiplier == 0 {
            return Err("candidate_multiplier must be at least 1".into());
        }
        let shares = [self.high_floor_pct, self.high_ceiling_pct, self.balanced_pct];
        if shares.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err("category shares must be non-negative".into());
        }
        let total: f64 = shares.iter().sum();
        if (total - 100.0).abs() > 1e-6 {
            return Err(format!("category shares must sum to 100, got {total}"));
        }
        if self.high_ceiling_ownership >= self.high_floor_ownership {
            return Err(format!(
                "high_ceiling_ownership ({}) must be below high_floor_ownership ({})",
                self.high_ceiling_ownership, self.high_floor_ownership
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PortfolioConfig::default();
        assert_eq!(config.candidate_multiplier, 25);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_shares() {
        assert!(PortfolioConfig::default().with_shares(50.0, 50.0, 10.0).validate().is_err());
        assert!(PortfolioConfig::default().with_shares(50.0, 50.0, 0.0).validate().is_ok());
        assert!(PortfolioConfig::default().with_shares(-10.0, 80.0, 30.0).validate().is_err());
    }

    #[test]
    fn test_validate_thresholds() {
        assert!(PortfolioConfig::default().with_ownership_thresholds(8.0, 15.0).validate().is_err());
        assert!(PortfolioConfig::default().with_candidate_multiplier(0).validate().is_err());
    }

    #[test]
    fn test_candidate_count_saturates() {
        let config = PortfolioConfig::default();
        assert_eq!(config.candidate_count(4), 100);
        assert_eq!(config.candidate_count(usize::MAX), usize::MAX);
    }
}
