//! Generator contract: progress reporting, cancellation and results.

use super::context::{GeneratorInput, LineupContext};
use crate::error::{OptimizerError, Result};
use crate::model::{Algorithm, Lineup};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Receives progress and status updates at loop milestones.
///
/// Implementations must be cheap; they are called from inside search loops
/// and, for parallel runs, from several threads.
pub trait ProgressSink: Send + Sync {
    /// `percent` is in `[0, 100]`.
    fn on_progress(&self, percent: f64, stage: &str);

    fn on_status(&self, _message: &str) {}
}

/// Discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _percent: f64, _stage: &str) {}
}

/// Maps a child's `0..100` progress onto `start..start + span` of a parent.
pub struct ScopedProgress<'a> {
    inner: &'a dyn ProgressSink,
    start: f64,
    span: f64,
}

impl<'a> ScopedProgress<'a> {
    pub fn new(inner: &'a dyn ProgressSink, start: f64, span: f64) -> Self {
        Self { inner, start, span }
    }
}

impl ProgressSink for ScopedProgress<'_> {
    fn on_progress(&self, percent: f64, stage: &str) {
        let scaled = self.start + percent.clamp(0.0, 100.0) / 100.0 * self.span;
        self.inner.on_progress(scaled.clamp(0.0, 100.0), stage);
    }

    fn on_status(&self, message: &str) {
        self.inner.on_status(message);
    }
}

/// Cooperative cancellation flag, checked at loop boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing flag, e.g. one owned by a session store.
    pub fn from_flag(flag: Arc<AtomicBool>) -> Self {
        Self(flag)
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Returns [`OptimizerError::Cancelled`] if the flag is set.
    pub fn check(&self, stage: &str) -> Result<()> {
        if self.is_cancelled() {
            Err(OptimizerError::Cancelled {
                stage: stage.to_string(),
            })
        } else {
            Ok(())
        }
    }
}

/// Run statistics reported by every generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSummary {
    pub algorithm: Option<Algorithm>,
    pub requested: usize,
    pub produced: usize,
    /// Rosters built and scored, including discarded ones.
    pub candidates_evaluated: usize,
    /// Trial batches, generations or annealing iterations.
    pub iterations: usize,
    pub best_score: f64,
    pub average_score: f64,
    pub elapsed_ms: u64,
}

impl GeneratorSummary {
    pub(crate) fn finish(
        algorithm: Algorithm,
        requested: usize,
        lineups: &[Lineup],
        candidates_evaluated: usize,
        iterations: usize,
        started: std::time::Instant,
    ) -> Self {
        let scores: Vec<f64> = lineups.iter().map(Lineup::ranking_score).collect();
        Self {
            algorithm: Some(algorithm),
            requested,
            produced: lineups.len(),
            candidates_evaluated,
            iterations,
            best_score: scores.iter().cloned().fold(0.0, f64::max),
            average_score: if scores.is_empty() {
                0.0
            } else {
                scores.iter().sum::<f64>() / scores.len() as f64
            },
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorOutput {
    pub lineups: Vec<Lineup>,
    pub summary: GeneratorSummary,
}

/// Shared interface of the candidate generators.
///
/// A generator must be bound to a prepared [`LineupContext`] (via
/// [`initialize`](LineupGenerator::initialize) or
/// [`bind`](LineupGenerator::bind)) before [`run`](LineupGenerator::run);
/// otherwise `run` fails with [`OptimizerError::NotInitialized`].
pub trait LineupGenerator: Send {
    fn algorithm(&self) -> Algorithm;

    /// Attaches an already validated context.
    fn bind(&mut self, context: Arc<LineupContext>);

    fn context(&self) -> Option<&Arc<LineupContext>>;

    fn cancel_token(&self) -> &CancelToken;

    /// Replaces the cancellation token, sharing it with a caller.
    fn set_cancel_token(&mut self, token: CancelToken);

    /// Produces up to `count` distinct lineups.
    fn run(&mut self, count: usize, sink: &dyn ProgressSink) -> Result<GeneratorOutput>;

    /// Validates and indexes the input, then binds it.
    fn initialize(&mut self, input: GeneratorInput) -> Result<Arc<LineupContext>> {
        let context = LineupContext::prepare(input)?;
        self.bind(Arc::clone(&context));
        Ok(context)
    }

    fn is_initialized(&self) -> bool {
        self.context().is_some()
    }

    /// Requests cooperative cancellation of the in-flight run.
    fn cancel(&self) {
        self.cancel_token().cancel();
    }
}

/// Fetches the bound context or fails with `NotInitialized`.
pub(crate) fn require_context(
    context: Option<&Arc<LineupContext>>,
    algorithm: Algorithm,
) -> Result<Arc<LineupContext>> {
    context
        .cloned()
        .ok_or(OptimizerError::NotInitialized { algorithm })
}
