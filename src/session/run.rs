//! One isolated optimization run.

use super::types::{
    InitSummary, OptimizationOutcome, OptimizationSummary, RunInput, StrategyInfo,
};
use crate::config::EngineConfig;
use crate::error::{OptimizerError, Result};
use crate::generator::{
    CancelToken, Generator, LineupContext, LineupGenerator, NoProgress, ProgressSink,
};
use crate::hybrid::{AlgorithmReport, HybridOrchestrator};
use crate::learning::{PerformanceRecord, PerformanceTracker};
use crate::model::{Algorithm, ContestInfo, Lineup};
use crate::portfolio::PortfolioConstructor;
use crate::strategy::{
    presets, resolve, resolve_recommended, ConstraintAnalysis, StrategyEngine, StrategyOverrides,
    StrategyPreset,
};
use crate::validation::PlayerPool;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// A scoped optimization session.
///
/// Owns its prepared pool, exposure state, contest metadata, engine
/// configuration, cancellation token and progress sink. Nothing is shared
/// with other runs except an optionally attached [`PerformanceTracker`].
pub struct OptimizationRun {
    context: Arc<LineupContext>,
    contest: ContestInfo,
    analysis: ConstraintAnalysis,
    engine: EngineConfig,
    cancel: CancelToken,
    sink: Arc<dyn ProgressSink>,
    learning: Option<Arc<PerformanceTracker>>,
}

impl std::fmt::Debug for OptimizationRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimizationRun")
            .field("players", &self.context.players().len())
            .field("contest", &self.contest)
            .field("analysis", &self.analysis)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl OptimizationRun {
    /// Validates the pool and analyzes the constraints.
    ///
    /// Fails with [`OptimizerError::Validation`] when the pool cannot
    /// support a lineup, or [`OptimizerError::InvalidConfig`] for a bad
    /// engine configuration.
    pub fn initialize(input: RunInput) -> Result<Self> {
        input.engine.validate()?;
        input
            .rules
            .validate()
            .map_err(|m| OptimizerError::invalid_config("roster", m))?;

        let pool = PlayerPool::from_records(&input.records, input.rules)?;
        let context = Arc::new(LineupContext::from_pool(
            pool,
            input.exposure,
            &input.existing_lineups,
            input.team_stacks,
        ));
        let analysis = ConstraintAnalysis::analyze(context.exposure(), &input.contest);
        info!(
            players = context.players().len(),
            warnings = context.report().warnings.len(),
            complexity = analysis.complexity_score,
            recommended = resolve_recommended(&analysis),
            "optimization run initialized"
        );

        Ok(Self {
            context,
            contest: input.contest,
            analysis,
            engine: input.engine,
            cancel: CancelToken::new(),
            sink: Arc::new(NoProgress),
            learning: None,
        })
    }

    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Attaches a tracker: every successful `optimize` records its outcome
    /// and hybrid distributions are reweighted by the learned weights.
    pub fn with_learning(mut self, tracker: Arc<PerformanceTracker>) -> Self {
        self.learning = Some(tracker);
        self
    }

    pub fn init_summary(&self) -> InitSummary {
        InitSummary {
            recommended_strategy: resolve_recommended(&self.analysis).to_string(),
            complexity_score: self.analysis.complexity_score,
            available_presets: presets().into_iter().map(|p| p.name).collect(),
            warnings: self.context.report().warnings.clone(),
            player_count: self.context.players().len(),
        }
    }

    pub fn context(&self) -> &Arc<LineupContext> {
        &self.context
    }

    pub fn analysis(&self) -> &ConstraintAnalysis {
        &self.analysis
    }

    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    /// Requests cooperative cancellation of the in-flight `optimize`.
    ///
    /// The flag stays set until [`CancelToken::reset`] is called on
    /// [`cancel_token`](Self::cancel_token).
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Generates up to `count` lineups with the named strategy.
    ///
    /// `recommended` resolves through the constraint analysis; `custom`
    /// overrides are applied after the preset's own parameters.
    pub fn optimize(
        &self,
        count: usize,
        strategy_name: &str,
        custom: Option<&StrategyOverrides>,
    ) -> Result<OptimizationOutcome> {
        let started = Instant::now();
        let preset = resolve(strategy_name, &self.analysis)?;
        let engine = preset.configure(&self.engine, custom);
        engine.validate()?;
        self.cancel.check("optimization start")?;
        info!(count, strategy = %preset.name, engine = preset.engine.label(), "optimization started");
        self.sink.on_status(&format!("running {} strategy", preset.name));

        let (lineups, per_algorithm, portfolio) = match &preset.engine {
            StrategyEngine::Single(algorithm) => {
                let (lineups, report) = self.run_single(*algorithm, count, &engine)?;
                (lineups, vec![report], None)
            }
            StrategyEngine::Hybrid(preset_distribution) => {
                let base = custom
                    .and_then(|c| c.distribution.clone())
                    .unwrap_or_else(|| preset_distribution.clone());
                let distribution = match &self.learning {
                    Some(tracker) => tracker.reweight(&base),
                    None => base,
                };
                let result = HybridOrchestrator::run(
                    &self.context,
                    count,
                    &distribution,
                    &engine,
                    &self.cancel,
                    self.sink.as_ref(),
                )?;
                (result.lineups, result.reports, None)
            }
            StrategyEngine::Portfolio => {
                let mut engine = engine;
                if let Some(tracker) = &self.learning {
                    engine.hybrid.distribution = tracker.reweight(&engine.hybrid.distribution);
                }
                let portfolio =
                    PortfolioConstructor::build(&self.context, count, &engine, &self.cancel, self.sink.as_ref())?;
                let reports = portfolio.reports.clone();
                let counts = (portfolio.category_counts.clone(), portfolio.stack_counts.clone());
                (portfolio.into_lineups(), reports, Some(counts))
            }
            StrategyEngine::Auto => {
                return Err(OptimizerError::UnknownStrategy {
                    name: strategy_name.to_string(),
                })
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let mut summary = OptimizationSummary::from_lineups(count, &lineups, elapsed_ms);
        summary.per_algorithm = per_algorithm;
        if let Some((categories, stacks)) = portfolio {
            summary.category_counts = Some(categories);
            summary.stack_counts = Some(stacks);
        }
        self.record_outcome(&preset, &lineups);

        info!(
            strategy = %preset.name,
            produced = summary.produced,
            best_score = summary.best_score,
            elapsed_ms,
            "optimization finished"
        );
        Ok(OptimizationOutcome {
            lineups,
            summary,
            strategy_used: preset.name,
        })
    }

    /// A single named algorithm: any failure is fatal.
    fn run_single(
        &self,
        algorithm: Algorithm,
        count: usize,
        engine: &EngineConfig,
    ) -> Result<(Vec<Lineup>, AlgorithmReport)> {
        let mut generator = Generator::new(algorithm, engine);
        generator.set_cancel_token(self.cancel.clone());
        generator.bind(Arc::clone(&self.context));
        let output = generator.run(count, self.sink.as_ref())?;
        let lineups: Vec<Lineup> = output
            .lineups
            .into_iter()
            .map(|l| l.with_source(algorithm))
            .collect();
        let report = AlgorithmReport {
            algorithm,
            requested: count,
            produced: lineups.len(),
            kept: lineups.len(),
            summary: Some(output.summary),
            error: None,
        };
        Ok((lineups, report))
    }

    /// One record per contributing algorithm; storage failures are logged.
    fn record_outcome(&self, preset: &StrategyPreset, lineups: &[Lineup]) {
        let Some(tracker) = &self.learning else {
            return;
        };
        for algorithm in Algorithm::ALL {
            let produced: Vec<Lineup> = lineups
                .iter()
                .filter(|l| l.source == Some(algorithm))
                .cloned()
                .collect();
            if produced.is_empty() {
                continue;
            }
            let record = PerformanceRecord::from_lineups(
                &preset.name,
                algorithm,
                &produced,
                self.contest.contest_type,
                self.analysis.complexity_score,
            );
            if let Err(err) = tracker.record(record) {
                warn!(%algorithm, error = %err, "failed to persist performance record");
            }
        }
    }

    /// The preset catalogue, annotated for this run.
    pub fn strategies(&self) -> Vec<StrategyInfo> {
        let recommended = resolve_recommended(&self.analysis);
        presets()
            .into_iter()
            .map(|preset| {
                let learned_weight = match (&preset.engine, &self.learning) {
                    (StrategyEngine::Single(a), Some(tracker)) => Some(tracker.weight(*a)),
                    _ => None,
                };
                StrategyInfo {
                    suitable: preset.is_suitable(self.contest.contest_type),
                    recommended: preset.name == recommended,
                    engine: preset.engine.label().to_string(),
                    name: preset.name,
                    description: preset.description,
                    learned_weight,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, RecordingSink};
    use crate::learning::{LearningConfig, MemoryStore};
    use crate::model::{ContestType, ExposureBand, ExposureSettings};
    use crate::strategy::{BALANCED, CASH_GAME, CONSTRAINT_FOCUSED, PORTFOLIO, RECOMMENDED};
    use std::collections::HashSet;

    fn fast_engine() -> EngineConfig {
        let mut engine = EngineConfig::default().with_seed(21);
        engine.sampler = engine.sampler.with_min_trials(300);
        engine.evolution = engine.evolution.with_population_size(30).with_generations(10).with_parallel(false);
        engine.annealing = engine.annealing.with_max_iterations(200).with_runs(2).with_parallel(false);
        engine.hybrid = engine.hybrid.with_parallel(false);
        engine.portfolio = engine.portfolio.with_candidate_multiplier(4);
        engine
    }

    fn input() -> RunInput {
        RunInput::new(fixtures::sample_records())
            .with_team_stacks(fixtures::sample_stacks())
            .with_engine(fast_engine())
    }

    #[test]
    fn test_initialize_rejects_empty_pool() {
        let err = OptimizationRun::initialize(RunInput::new(Vec::new())).unwrap_err();
        match err {
            OptimizerError::Validation { errors } => assert!(errors.iter().any(|e| e.contains("non-empty"))),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_init_summary() {
        let run = OptimizationRun::initialize(input().with_contest(ContestInfo::new(ContestType::Cash, 500))).unwrap();
        let summary = run.init_summary();
        assert_eq!(summary.recommended_strategy, CASH_GAME);
        assert_eq!(summary.available_presets.len(), 7);
        assert_eq!(summary.player_count, 24);
        assert!((summary.complexity_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_optimize_recommended_resolves() {
        let run = OptimizationRun::initialize(input().with_contest(ContestInfo::new(ContestType::Cash, 500))).unwrap();
        let outcome = run.optimize(5, RECOMMENDED, None).unwrap();
        assert_eq!(outcome.strategy_used, CASH_GAME);
        assert!(!outcome.lineups.is_empty() && outcome.lineups.len() <= 5);
        assert!(outcome
            .lineups
            .iter()
            .all(|l| l.source == Some(Algorithm::Stochastic)));
        assert_eq!(outcome.summary.per_algorithm.len(), 1);
    }

    #[test]
    fn test_optimize_balanced_is_valid_and_distinct() {
        let run = OptimizationRun::initialize(input()).unwrap();
        let outcome = run.optimize(10, BALANCED, None).unwrap();
        assert!(!outcome.lineups.is_empty());
        assert!(outcome.lineups.len() <= 10);
        let sigs: HashSet<_> = outcome.lineups.iter().map(Lineup::signature).collect();
        assert_eq!(sigs.len(), outcome.lineups.len());
        for lineup in &outcome.lineups {
            assert!(lineup.total_salary <= 50_000);
            assert!(lineup.source.is_some());
        }
        assert_eq!(outcome.summary.produced, outcome.lineups.len());
    }

    #[test]
    fn test_optimize_portfolio_reports_categories() {
        let run = OptimizationRun::initialize(input()).unwrap();
        let outcome = run.optimize(4, PORTFOLIO, None).unwrap();
        assert_eq!(outcome.strategy_used, PORTFOLIO);
        let counts = outcome.summary.category_counts.unwrap();
        assert_eq!(counts.values().sum::<usize>(), outcome.lineups.len());
        assert!(outcome.summary.stack_counts.is_some());
    }

    #[test]
    fn test_unknown_strategy() {
        let run = OptimizationRun::initialize(input()).unwrap();
        let err = run.optimize(3, "yolo", None).unwrap_err();
        assert!(matches!(err, OptimizerError::UnknownStrategy { .. }));
    }

    #[test]
    fn test_custom_overrides_validated() {
        let run = OptimizationRun::initialize(input()).unwrap();
        let bad = StrategyOverrides {
            runs: Some(0),
            ..StrategyOverrides::default()
        };
        let err = run.optimize(3, CONSTRAINT_FOCUSED, Some(&bad)).unwrap_err();
        assert!(matches!(err, OptimizerError::InvalidConfig { .. }));
    }

    #[test]
    fn test_cancel_is_observed() {
        let run = OptimizationRun::initialize(input()).unwrap();
        run.cancel();
        let err = run.optimize(3, BALANCED, None).unwrap_err();
        assert!(err.is_cancelled());
        run.cancel_token().reset();
        assert!(run.optimize(3, CASH_GAME, None).is_ok());
    }

    #[test]
    fn test_progress_and_status_reported() {
        let sink = Arc::new(RecordingSink::default());
        let run = OptimizationRun::initialize(input()).unwrap().with_progress(sink.clone());
        run.optimize(4, CASH_GAME, None).unwrap();
        assert!(!sink.progress.lock().unwrap().is_empty());
        assert!(sink.status.lock().unwrap().iter().any(|s| s.contains("cash-game")));
    }

    #[test]
    fn test_learning_records_each_source() {
        let tracker = Arc::new(PerformanceTracker::new(Arc::new(MemoryStore::new()), LearningConfig::default()).unwrap());
        let run = OptimizationRun::initialize(input()).unwrap().with_learning(Arc::clone(&tracker));
        let outcome = run.optimize(10, BALANCED, None).unwrap();
        let sources: HashSet<_> = outcome.lineups.iter().filter_map(|l| l.source).collect();
        let history = tracker.history();
        assert_eq!(history.len(), sources.len());
        assert!(history.iter().all(|r| r.strategy == BALANCED));

        let infos = run.strategies();
        let cash = infos.iter().find(|i| i.name == CASH_GAME).unwrap();
        assert_eq!(cash.learned_weight, Some(1.0));
    }

    #[test]
    fn test_strategies_flags() {
        let settings = (0..6).fold(ExposureSettings::default(), |s, i| {
            s.with_player(format!("T1-X{i}"), ExposureBand::new(0.0, 50.0))
        });
        let run = OptimizationRun::initialize(
            input()
                .with_exposure(settings)
                .with_contest(ContestInfo::new(ContestType::Gpp, 1_000)),
        )
        .unwrap();
        let infos = run.strategies();
        assert_eq!(infos.len(), 7);
        let recommended: Vec<_> = infos.iter().filter(|i| i.recommended).collect();
        assert_eq!(recommended.len(), 1);
        assert_eq!(recommended[0].name, CONSTRAINT_FOCUSED);
        assert!(!infos.iter().find(|i| i.name == CASH_GAME).unwrap().suitable);
        assert!(infos.iter().all(|i| i.learned_weight.is_none()));
    }
}
