//! Hybrid orchestration loop.

use super::config::{validate_distribution, Distribution};
use crate::config::EngineConfig;
use crate::error::{OptimizerError, Result};
use crate::generator::{
    CancelToken, Generator, GeneratorOutput, GeneratorSummary, LineupContext, LineupGenerator,
    ProgressSink, ScopedProgress,
};
use crate::model::{Algorithm, Lineup};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Upper bound on algorithms run concurrently.
const MAX_WORKERS: usize = 10;

/// Outcome of one algorithm within a hybrid run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmReport {
    pub algorithm: Algorithm,
    pub requested: usize,
    pub produced: usize,
    /// Lineups of this algorithm that survived the merge.
    pub kept: usize,
    pub summary: Option<GeneratorSummary>,
    /// Failure message when the algorithm was skipped.
    pub error: Option<String>,
}

/// Result of a hybrid run.
#[derive(Debug, Clone)]
pub struct HybridResult {
    /// Distinct lineups, best first.
    pub lineups: Vec<Lineup>,
    pub reports: Vec<AlgorithmReport>,
    pub elapsed_ms: u64,
}

impl HybridResult {
    /// Algorithms that failed and were skipped.
    pub fn failures(&self) -> impl Iterator<Item = &AlgorithmReport> {
        self.reports.iter().filter(|r| r.error.is_some())
    }
}

/// Per-algorithm counts: `round(total * pct / 100)`, zero allocations dropped.
pub fn allocate(total: usize, distribution: &Distribution) -> Vec<(Algorithm, usize)> {
    distribution
        .iter()
        .map(|(&algorithm, &pct)| (algorithm, (total as f64 * pct / 100.0).round() as usize))
        .filter(|&(_, n)| n > 0)
        .collect()
}

/// Sorts by ranking score, drops repeated six-player signatures and keeps
/// the best `total`.
///
/// The sort is stable, so among equal scores the earlier candidate wins.
pub fn merge_candidates(mut candidates: Vec<Lineup>, total: usize) -> Vec<Lineup> {
    candidates.sort_by(|a, b| {
        b.ranking_score()
            .partial_cmp(&a.ranking_score())
            .unwrap_or(Ordering::Equal)
    });
    let mut seen = HashSet::new();
    candidates.retain(|lineup| seen.insert(lineup.signature()));
    candidates.truncate(total);
    candidates
}

/// Runs a distribution of generators against one prepared context.
pub struct HybridOrchestrator;

impl HybridOrchestrator {
    pub fn run(
        ctx: &Arc<LineupContext>,
        total: usize,
        distribution: &Distribution,
        engine: &EngineConfig,
        cancel: &CancelToken,
        sink: &dyn ProgressSink,
    ) -> Result<HybridResult> {
        validate_distribution(distribution).map_err(|m| OptimizerError::invalid_config("hybrid", m))?;
        cancel.check("hybrid orchestration")?;
        let started = Instant::now();

        let allocations = allocate(total, distribution);
        info!(total, algorithms = allocations.len(), parallel = engine.hybrid.parallel, "hybrid run started");

        let span = 90.0 / allocations.len().max(1) as f64;
        let job = |(i, &(algorithm, count)): (usize, &(Algorithm, usize))| {
            let scoped = ScopedProgress::new(sink, i as f64 * span, span);
            let outcome = run_one(ctx, algorithm, count, engine, cancel, &scoped);
            (algorithm, count, outcome)
        };

        let outcomes: Vec<(Algorithm, usize, Result<GeneratorOutput>)> =
            if engine.hybrid.parallel && allocations.len() > 1 {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(allocations.len().min(MAX_WORKERS))
                    .build()
                    .map_err(|e| {
                        OptimizerError::algorithm_failure(allocations[0].0, "thread pool", e.to_string())
                    })?;
                pool.install(|| allocations.par_iter().enumerate().map(job).collect())
            } else {
                let mut outcomes = Vec::with_capacity(allocations.len());
                for entry in allocations.iter().enumerate() {
                    cancel.check("hybrid orchestration")?;
                    outcomes.push(job(entry));
                }
                outcomes
            };

        let mut candidates = Vec::new();
        let mut reports = Vec::with_capacity(outcomes.len());
        for (algorithm, requested, outcome) in outcomes {
            match outcome {
                Ok(output) => {
                    sink.on_status(&format!("{algorithm} produced {} lineups", output.lineups.len()));
                    reports.push(AlgorithmReport {
                        algorithm,
                        requested,
                        produced: output.lineups.len(),
                        kept: 0,
                        summary: Some(output.summary),
                        error: None,
                    });
                    candidates.extend(output.lineups.into_iter().map(|l| l.with_source(algorithm)));
                }
                Err(err) if err.is_cancelled() => return Err(err),
                Err(err) => {
                    warn!(%algorithm, requested, error = %err, "algorithm failed, skipping");
                    sink.on_status(&format!("{algorithm} failed: {err}"));
                    reports.push(AlgorithmReport {
                        algorithm,
                        requested,
                        produced: 0,
                        kept: 0,
                        summary: None,
                        error: Some(err.to_string()),
                    });
                }
            }
        }
        cancel.check("hybrid merge")?;

        let candidate_count = candidates.len();
        let lineups = merge_candidates(candidates, total);
        for report in &mut reports {
            report.kept = lineups.iter().filter(|l| l.source == Some(report.algorithm)).count();
        }
        sink.on_progress(100.0, "merging");

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            candidates = candidate_count,
            produced = lineups.len(),
            elapsed_ms,
            "hybrid run finished"
        );
        Ok(HybridResult {
            lineups,
            reports,
            elapsed_ms,
        })
    }
}

fn run_one(
    ctx: &Arc<LineupContext>,
    algorithm: Algorithm,
    count: usize,
    engine: &EngineConfig,
    cancel: &CancelToken,
    sink: &dyn ProgressSink,
) -> Result<GeneratorOutput> {
    debug!(%algorithm, count, "dispatching");
    let mut generator = Generator::new(algorithm, engine);
    generator.set_cancel_token(cancel.clone());
    generator.bind(Arc::clone(ctx));
    generator.run(count, sink)
}
