//! Portfolio selection and construction.

use super::config::PortfolioConfig;
use super::types::{category_targets, classify_risk, classify_stack_shape, CategoryTargets, RiskCategory, StackShape};
use crate::config::EngineConfig;
use crate::error::{OptimizerError, Result};
use crate::generator::{CancelToken, LineupContext, ProgressSink, ScopedProgress};
use crate::hybrid::{merge_candidates, AlgorithmReport, HybridOrchestrator};
use crate::model::Lineup;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// A selected lineup with its classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioEntry {
    pub lineup: Lineup,
    pub category: RiskCategory,
    pub stack_shape: StackShape,
}

/// A finished portfolio.
#[derive(Debug, Clone, Default)]
pub struct Portfolio {
    /// Selected lineups, best first.
    pub entries: Vec<PortfolioEntry>,
    pub targets: CategoryTargets,
    pub category_counts: BTreeMap<RiskCategory, usize>,
    pub stack_counts: BTreeMap<StackShape, usize>,
    /// Lineups taken regardless of category to cover a shortfall.
    pub backfilled: usize,
    /// Distinct candidates the selection drew from.
    pub candidates: usize,
    pub reports: Vec<AlgorithmReport>,
}

impl Portfolio {
    pub fn lineups(&self) -> Vec<Lineup> {
        self.entries.iter().map(|e| e.lineup.clone()).collect()
    }

    pub fn into_lineups(self) -> Vec<Lineup> {
        self.entries.into_iter().map(|e| e.lineup).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Selects a barbell portfolio of `size` lineups from `candidates`.
///
/// Candidates are deduplicated and ranked; each category takes its best
/// members up to its target, any shortfall is filled from the best
/// remaining candidates, and the result is re-sorted by score.
pub fn select_portfolio(candidates: Vec<Lineup>, size: usize, config: &PortfolioConfig) -> Portfolio {
    let ranked = merge_candidates(candidates, usize::MAX);
    let distinct = ranked.len();
    let targets = category_targets(size, config);
    let categories: Vec<RiskCategory> = ranked
        .iter()
        .map(|l| classify_risk(l.average_ownership(), config))
        .collect();

    let mut taken = vec![false; ranked.len()];
    let mut filled: BTreeMap<RiskCategory, usize> = BTreeMap::new();
    for (i, category) in categories.iter().enumerate() {
        let count = filled.entry(*category).or_insert(0);
        if *count < targets.get(*category) {
            *count += 1;
            taken[i] = true;
        }
    }

    let mut selected = taken.iter().filter(|t| **t).count();
    let mut backfilled = 0;
    for flag in taken.iter_mut() {
        if selected >= size {
            break;
        }
        if !*flag {
            *flag = true;
            selected += 1;
            backfilled += 1;
        }
    }

    // ranked order is already best first
    let entries: Vec<PortfolioEntry> = ranked
        .into_iter()
        .zip(categories)
        .zip(taken)
        .filter(|(_, t)| *t)
        .map(|((lineup, category), _)| PortfolioEntry {
            stack_shape: classify_stack_shape(&lineup),
            lineup,
            category,
        })
        .take(size)
        .collect();

    let mut category_counts = BTreeMap::new();
    let mut stack_counts = BTreeMap::new();
    for entry in &entries {
        *category_counts.entry(entry.category).or_insert(0) += 1;
        *stack_counts.entry(entry.stack_shape).or_insert(0) += 1;
    }

    Portfolio {
        entries,
        targets,
        category_counts,
        stack_counts,
        backfilled,
        candidates: distinct,
        reports: Vec::new(),
    }
}

/// Builds barbell portfolios on top of the hybrid orchestrator.
pub struct PortfolioConstructor;

impl PortfolioConstructor {
    /// Generates `size * candidate_multiplier` candidates with the engine's
    /// hybrid distribution, then selects the portfolio.
    pub fn build(
        ctx: &Arc<LineupContext>,
        size: usize,
        engine: &EngineConfig,
        cancel: &CancelToken,
        sink: &dyn ProgressSink,
    ) -> Result<Portfolio> {
        let config = &engine.portfolio;
        config
            .validate()
            .map_err(|m| OptimizerError::invalid_config("portfolio", m))?;
        cancel.check("portfolio")?;
        let started = Instant::now();

        let bulk = config.candidate_count(size);
        info!(size, candidates = bulk, "portfolio construction started");

        let scoped = ScopedProgress::new(sink, 0.0, 90.0);
        let generated = HybridOrchestrator::run(ctx, bulk, &engine.hybrid.distribution, engine, cancel, &scoped)?;
        cancel.check("portfolio selection")?;
        debug!(candidates = generated.lineups.len(), "classifying candidates");

        let mut portfolio = select_portfolio(generated.lineups, size, config);
        portfolio.reports = generated.reports;
        sink.on_progress(100.0, "portfolio");

        info!(
            produced = portfolio.len(),
            backfilled = portfolio.backfilled,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "portfolio construction finished"
        );
        Ok(portfolio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::generator::NoProgress;
    use crate::model::{Algorithm, ScoreCard};

    /// `n` distinct lineups with the given ownership and descending scores.
    fn synthetic(n: usize, ownership: f64, tag: &str, top: f64) -> Vec<Lineup> {
        let ctx = fixtures::sample_context();
        let base = ctx.to_lineup(&ctx.greedy_roster().unwrap(), Algorithm::Stochastic, ScoreCard::default());
        (0..n)
            .map(|i| {
                let mut l = base.clone();
                l.captain.id = format!("{tag}-{i}");
                l.score.avg_ownership = ownership;
                l.scores.nexus = top - i as f64;
                l
            })
            .collect()
    }

    #[test]
    fn test_targets_met_with_enough_candidates() {
        let mut candidates = synthetic(30, 20.0, "chalk", 200.0);
        candidates.extend(synthetic(30, 5.0, "contra", 150.0));
        candidates.extend(synthetic(30, 11.0, "mid", 100.0));
        let config = PortfolioConfig::default();
        let portfolio = select_portfolio(candidates, 20, &config);

        assert_eq!(portfolio.len(), 20);
        assert_eq!(portfolio.backfilled, 0);
        assert_eq!(portfolio.candidates, 90);
        assert_eq!(portfolio.category_counts[&RiskCategory::HighFloor], 7);
        assert_eq!(portfolio.category_counts[&RiskCategory::HighCeiling], 7);
        assert_eq!(portfolio.category_counts[&RiskCategory::Balanced], 6);
        for w in portfolio.entries.windows(2) {
            assert!(w[0].lineup.ranking_score() >= w[1].lineup.ranking_score());
        }
        // each category keeps its best members
        assert!(portfolio
            .entries
            .iter()
            .any(|e| e.lineup.captain.id == "contra-0"));
        assert!(!portfolio.entries.iter().any(|e| e.lineup.captain.id == "contra-7"));
    }

    #[test]
    fn test_shortfall_backfilled_from_best_remaining() {
        // no contrarian candidates at all
        let mut candidates = synthetic(20, 20.0, "chalk", 200.0);
        candidates.extend(synthetic(20, 11.0, "mid", 100.0));
        let portfolio = select_portfolio(candidates, 10, &PortfolioConfig::default());
        assert_eq!(portfolio.len(), 10);
        assert_eq!(portfolio.backfilled, 4);
        // backfill prefers the higher-scoring chalk lineups
        assert_eq!(portfolio.category_counts[&RiskCategory::HighFloor], 8);
        assert_eq!(portfolio.category_counts[&RiskCategory::Balanced], 2);
    }

    #[test]
    fn test_too_few_candidates() {
        let candidates = synthetic(3, 11.0, "mid", 100.0);
        let portfolio = select_portfolio(candidates, 10, &PortfolioConfig::default());
        assert_eq!(portfolio.len(), 3);
    }

    #[test]
    fn test_duplicates_collapse() {
        let one = synthetic(1, 11.0, "mid", 100.0);
        let candidates = vec![one[0].clone(), one[0].clone(), one[0].clone()];
        let portfolio = select_portfolio(candidates, 3, &PortfolioConfig::default());
        assert_eq!(portfolio.len(), 1);
        assert_eq!(portfolio.candidates, 1);
    }

    #[test]
    fn test_build_from_hybrid() {
        let ctx = fixtures::sample_context();
        let mut engine = EngineConfig::default().with_seed(5);
        engine.sampler = engine.sampler.with_min_trials(300);
        engine.evolution = engine.evolution.with_population_size(30).with_generations(8).with_parallel(false);
        engine.annealing = engine.annealing.with_max_iterations(150).with_runs(2).with_parallel(false);
        engine.hybrid = engine.hybrid.with_parallel(false);
        engine.portfolio = engine.portfolio.with_candidate_multiplier(5);

        let portfolio = PortfolioConstructor::build(&ctx, 6, &engine, &CancelToken::new(), &NoProgress).unwrap();
        assert!(portfolio.len() <= 6);
        assert!(!portfolio.is_empty());
        assert_eq!(portfolio.reports.len(), 3);
        let shapes: usize = portfolio.stack_counts.values().sum();
        assert_eq!(shapes, portfolio.len());
        for entry in &portfolio.entries {
            assert!(ctx.is_valid(&ctx.roster_of(&entry.lineup).unwrap()));
        }
    }

    #[test]
    fn test_invalid_config() {
        let ctx = fixtures::sample_context();
        let mut engine = EngineConfig::default();
        engine.portfolio.balanced_pct = 50.0;
        let err = PortfolioConstructor::build(&ctx, 5, &engine, &CancelToken::new(), &NoProgress).unwrap_err();
        assert!(matches!(err, OptimizerError::InvalidConfig { ref component, .. } if component == "portfolio"));
    }
}
