//! Constraint analysis and strategy selection.
//!
//! [`ConstraintAnalysis::analyze`] condenses exposure settings and contest
//! metadata into a complexity score; [`resolve_recommended`] maps that
//! analysis to one of the static [`presets`]. Both are pure: the same
//! inputs always give the same preset.
//!
//! # Presets
//!
//! | Name | Engine |
//! |------|--------|
//! | `recommended` | resolved at run time |
//! | `balanced` | hybrid 40/30/30 |
//! | `cash-game` | stochastic, low randomness |
//! | `tournament` | evolutionary |
//! | `contrarian` | evolutionary, high diversity |
//! | `constraint-focused` | annealing, heavy exposure weight |
//! | `portfolio` | barbell portfolio over the balanced hybrid |

mod analysis;
mod presets;

pub use analysis::{resolve_recommended, ConstraintAnalysis, COMPLEXITY_LIMIT, CONSTRAINT_COUNT_LIMIT};
pub use presets::{
    find_preset, presets, StrategyEngine, StrategyOverrides, StrategyPreset, BALANCED, CASH_GAME,
    CONSTRAINT_FOCUSED, CONTRARIAN, PORTFOLIO, RECOMMENDED, TOURNAMENT,
};

use crate::error::Result;

/// Resolves a strategy name, following `recommended` to a concrete preset.
pub fn resolve(name: &str, analysis: &ConstraintAnalysis) -> Result<StrategyPreset> {
    let preset = find_preset(name)?;
    if preset.engine == StrategyEngine::Auto {
        find_preset(resolve_recommended(analysis))
    } else {
        Ok(preset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContestInfo, ContestType, ExposureSettings};

    #[test]
    fn test_resolve_follows_recommended() {
        let analysis = ConstraintAnalysis::analyze(
            &ExposureSettings::default(),
            &ContestInfo::new(ContestType::Cash, 200),
        );
        assert_eq!(resolve(RECOMMENDED, &analysis).unwrap().name, CASH_GAME);
        assert_eq!(resolve(PORTFOLIO, &analysis).unwrap().engine, StrategyEngine::Portfolio);
        assert!(resolve("nope", &analysis).is_err());
    }

    #[test]
    fn test_resolution_is_pure() {
        let analysis = ConstraintAnalysis::analyze(
            &ExposureSettings::default(),
            &ContestInfo::new(ContestType::Gpp, 8_000),
        );
        let first = resolve(RECOMMENDED, &analysis).unwrap();
        for _ in 0..5 {
            assert_eq!(resolve(RECOMMENDED, &analysis).unwrap(), first);
        }
        assert_eq!(first.name, CONTRARIAN);
    }
}
