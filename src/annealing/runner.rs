//! Multi-run annealing loop.

use super::config::AnnealingConfig;
use super::moves::{propose, random_replacement, MoveKind};
use crate::error::{OptimizerError, Result};
use crate::generator::{
    require_context, CancelToken, GeneratorOutput, GeneratorSummary, LineupContext,
    LineupGenerator, PartialRoster, ProgressSink,
};
use crate::model::{Algorithm, Lineup, Roster, ScoreCard};
use crate::random::{create_rng, derive_seed};
use rand::Rng;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace};

/// Metropolis acceptance probability for a move changing the score by `delta`.
///
/// Improving moves are always accepted; degrading moves with probability
/// `exp(delta / T)`. At `T <= 0` only improvements are accepted.
pub fn acceptance_probability(delta: f64, temperature: f64) -> f64 {
    if delta > 0.0 {
        1.0
    } else if temperature <= 0.0 {
        0.0
    } else {
        (delta / temperature).exp().min(1.0)
    }
}

/// Acceptance decision with a probability floor: a non-improving move whose
/// probability is below `floor` is rejected outright.
pub fn accepts(delta: f64, temperature: f64, floor: f64, roll: f64) -> bool {
    if delta > 0.0 {
        return true;
    }
    let p = acceptance_probability(delta, temperature);
    p >= floor && roll < p
}

/// Annealing score: NexusScore total minus the weighted exposure penalty.
pub fn energy(ctx: &LineupContext, roster: &Roster, exposure_weight: f64) -> f64 {
    ctx.score(roster).total - exposure_weight * ctx.exposure_penalty(roster, ctx.tracker())
}

/// Statistics of one independent run.
#[derive(Debug, Clone)]
pub struct RunStats {
    pub run: usize,
    pub best: Roster,
    pub best_energy: f64,
    pub iterations: usize,
    pub accepted_moves: usize,
    pub improving_moves: usize,
    pub reheats: usize,
    /// Neighbor proposals that failed and were skipped.
    pub skipped_neighbors: usize,
    pub final_temperature: f64,
    /// Best energy after each iteration.
    pub energy_history: Vec<f64>,
}

/// Result of a multi-run annealing pass.
#[derive(Debug, Clone)]
pub struct AnnealingResult {
    /// Distinct rosters with their energy, best first.
    pub solutions: Vec<(Roster, f64)>,
    pub runs: Vec<RunStats>,
    /// Solutions derived from the best roster after the runs.
    pub derived: usize,
}

impl AnnealingResult {
    pub fn best_energy(&self) -> f64 {
        self.solutions.first().map_or(f64::NEG_INFINITY, |(_, e)| *e)
    }

    pub fn total_iterations(&self) -> usize {
        self.runs.iter().map(|r| r.iterations).sum()
    }
}

/// Shared progress counter across parallel runs.
struct RunProgress<'a> {
    sink: &'a dyn ProgressSink,
    done: AtomicUsize,
    total: usize,
}

impl RunProgress<'_> {
    fn advance(&self, iterations: usize) {
        let done = self.done.fetch_add(iterations, Ordering::Relaxed) + iterations;
        let percent = done.min(self.total) as f64 / self.total.max(1) as f64 * 90.0;
        self.sink.on_progress(percent, "annealing");
    }
}

/// Executes simulated annealing against a prepared context.
pub struct AnnealingRunner;

impl AnnealingRunner {
    pub fn run(
        ctx: &LineupContext,
        count: usize,
        config: &AnnealingConfig,
        cancel: &CancelToken,
        sink: &dyn ProgressSink,
    ) -> Result<AnnealingResult> {
        config
            .validate()
            .map_err(|m| OptimizerError::invalid_config("annealing", m))?;
        cancel.check("annealing")?;
        if count == 0 {
            return Ok(AnnealingResult {
                solutions: Vec::new(),
                runs: Vec::new(),
                derived: 0,
            });
        }

        let base_seed = config.seed.unwrap_or_else(rand::random);
        let starts = (0..config.runs)
            .map(|run| start_roster(ctx, run, derive_seed(base_seed, run as u64)))
            .collect::<Result<Vec<_>>>()?;
        let moves = MoveKind::available(ctx);
        let progress = RunProgress {
            sink,
            done: AtomicUsize::new(0),
            total: config.runs * config.max_iterations,
        };

        let job = |run: usize| {
            let seed = derive_seed(base_seed, (config.runs + run) as u64);
            anneal(ctx, config, run, seed, starts[run], &moves, cancel, &progress)
        };
        let outcomes: Vec<Result<RunStats>> = if config.parallel && config.runs > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.runs)
                .build()
                .map_err(|e| {
                    OptimizerError::algorithm_failure(Algorithm::Annealing, "thread pool", e.to_string())
                })?;
            pool.install(|| (0..config.runs).into_par_iter().map(job).collect())
        } else {
            (0..config.runs).map(job).collect()
        };
        let runs = outcomes.into_iter().collect::<Result<Vec<_>>>()?;

        cancel.check("annealing merge")?;
        let mut pool: HashMap<[usize; 6], (Roster, f64)> = HashMap::new();
        for stats in &runs {
            keep_best(&mut pool, stats.best, stats.best_energy);
        }
        let best = runs
            .iter()
            .max_by(|a, b| a.best_energy.total_cmp(&b.best_energy))
            .map(|s| s.best)
            .ok_or_else(|| OptimizerError::algorithm_failure(Algorithm::Annealing, "merge", "no runs completed"))?;

        let before = pool.len();
        derive_variants(ctx, config, best, count, &mut pool, derive_seed(base_seed, u64::MAX));
        let derived = pool.len() - before;

        let mut solutions: Vec<(Roster, f64)> = pool.into_values().collect();
        solutions.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.signature().cmp(&b.0.signature())));
        solutions.truncate(count);
        sink.on_progress(100.0, "merging");

        Ok(AnnealingResult {
            solutions,
            runs,
            derived,
        })
    }
}

fn keep_best(pool: &mut HashMap<[usize; 6], (Roster, f64)>, roster: Roster, energy: f64) {
    let entry = pool.entry(roster.signature()).or_insert((roster, energy));
    if energy > entry.1 {
        *entry = (roster, energy);
    }
}

/// Run 0 starts from the value-greedy roster, the others from random ones.
fn start_roster(ctx: &LineupContext, run: usize, seed: u64) -> Result<Roster> {
    let roster = if run == 0 {
        ctx.greedy_roster()
    } else {
        let mut rng = create_rng(seed);
        ctx.construct(PartialRoster::default(), &ctx.slot_order(), |_, feasible| {
            Some(feasible[rng.random_range(0..feasible.len())])
        })
        .or_else(|| ctx.greedy_roster())
    };
    roster.ok_or_else(|| {
        OptimizerError::algorithm_failure(Algorithm::Annealing, "initial roster", "no feasible roster")
    })
}

#[allow(clippy::too_many_arguments)]
fn anneal(
    ctx: &LineupContext,
    config: &AnnealingConfig,
    run: usize,
    seed: u64,
    start: Roster,
    moves: &[MoveKind],
    cancel: &CancelToken,
    progress: &RunProgress<'_>,
) -> Result<RunStats> {
    let mut rng = create_rng(seed);
    let w = config.exposure_weight;

    let mut current = start;
    let mut current_energy = energy(ctx, &current, w);
    let mut best = current;
    let mut best_energy = current_energy;

    let mut temperature = config.initial_temperature;
    let mut iterations = 0;
    let mut accepted_moves = 0;
    let mut improving_moves = 0;
    let mut reheats = 0;
    let mut skipped_neighbors = 0;
    let mut since_improvement = 0;
    let mut energy_history = Vec::with_capacity(config.max_iterations);
    let milestone = (config.max_iterations / 10).max(1);
    let mut reported = 0;

    for iteration in 0..config.max_iterations {
        cancel.check("annealing iteration")?;
        if temperature < config.min_temperature {
            break;
        }

        let mut proposal: Option<(Roster, f64)> = None;
        for _ in 0..config.neighbors_per_iteration {
            let kind = moves[rng.random_range(0..moves.len())];
            match propose(kind, ctx, &current, ctx.tracker(), &mut rng) {
                Ok(neighbor) => {
                    let e = energy(ctx, &neighbor, w);
                    if proposal.is_none_or(|(_, pe)| e > pe) {
                        proposal = Some((neighbor, e));
                    }
                }
                Err(err) => {
                    skipped_neighbors += 1;
                    trace!(run, iteration, %err, "neighbor skipped");
                }
            }
        }

        if let Some((neighbor, e)) = proposal {
            let delta = e - current_energy;
            if delta > 0.0 {
                improving_moves += 1;
            }
            if accepts(delta, temperature, config.min_acceptance_probability, rng.random::<f64>()) {
                current = neighbor;
                current_energy = e;
                accepted_moves += 1;
            }
        }

        if current_energy > best_energy {
            best = current;
            best_energy = current_energy;
            since_improvement = 0;
        } else {
            since_improvement += 1;
        }

        if since_improvement >= config.stagnation_threshold {
            temperature = (temperature * config.reheat_factor).min(config.initial_temperature);
            since_improvement = 0;
            reheats += 1;
            debug!(run, iteration, temperature, "reheat");
        }

        temperature *= config.cooling_rate;
        iterations += 1;
        energy_history.push(best_energy);

        if iterations % milestone == 0 {
            progress.advance(iterations - reported);
            reported = iterations;
        }
    }
    if iterations > reported {
        progress.advance(iterations - reported);
    }

    debug!(run, iterations, best_energy, accepted_moves, reheats, "annealing run finished");
    Ok(RunStats {
        run,
        best,
        best_energy,
        iterations,
        accepted_moves,
        improving_moves,
        reheats,
        skipped_neighbors,
        final_temperature: temperature,
        energy_history,
    })
}

/// Fills the pool up to `count` with one- and two-slot variants, each
/// derived from `best` or from a variant accepted earlier in this call.
fn derive_variants(
    ctx: &LineupContext,
    config: &AnnealingConfig,
    best: Roster,
    count: usize,
    pool: &mut HashMap<[usize; 6], (Roster, f64)>,
    seed: u64,
) {
    let mut rng = create_rng(seed);
    let mut bases = vec![best];
    let attempts = count.saturating_mul(config.mutation_variants);

    for _ in 0..attempts {
        if pool.len() >= count {
            break;
        }
        let base = if rng.random_bool(0.5) {
            best
        } else {
            bases[rng.random_range(0..bases.len())]
        };
        let changes = if rng.random_bool(0.5) { 1 } else { 2 };
        let mut variant = Some(base);
        for _ in 0..changes {
            variant = variant.and_then(|r| random_replacement(ctx, &r, &mut rng));
        }
        let Some(variant) = variant else {
            continue;
        };
        if !ctx.is_valid(&variant) || pool.contains_key(&variant.signature()) {
            continue;
        }
        pool.insert(variant.signature(), (variant, energy(ctx, &variant, config.exposure_weight)));
        bases.push(variant);
    }
}

/// Simulated-annealing lineup generator.
#[derive(Debug, Default)]
pub struct AnnealingOptimizer {
    config: AnnealingConfig,
    context: Option<Arc<LineupContext>>,
    cancel: CancelToken,
}

impl AnnealingOptimizer {
    pub fn new(config: AnnealingConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &AnnealingConfig {
        &self.config
    }
}

impl LineupGenerator for AnnealingOptimizer {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Annealing
    }

    fn bind(&mut self, context: Arc<LineupContext>) {
        self.context = Some(context);
    }

    fn context(&self) -> Option<&Arc<LineupContext>> {
        self.context.as_ref()
    }

    fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    fn set_cancel_token(&mut self, token: CancelToken) {
        self.cancel = token;
    }

    fn run(&mut self, count: usize, sink: &dyn ProgressSink) -> Result<GeneratorOutput> {
        let ctx = require_context(self.context.as_ref(), Algorithm::Annealing)?;
        let started = Instant::now();
        info!(
            count,
            runs = self.config.runs,
            max_iterations = self.config.max_iterations,
            initial_temperature = self.config.initial_temperature,
            "simulated annealing started"
        );

        let result = AnnealingRunner::run(&ctx, count, &self.config, &self.cancel, sink)?;
        let lineups: Vec<Lineup> = result
            .solutions
            .iter()
            .map(|(roster, e)| {
                ctx.to_lineup(
                    roster,
                    Algorithm::Annealing,
                    ScoreCard {
                        annealing: *e,
                        ..ScoreCard::default()
                    },
                )
            })
            .collect();
        let evaluated = result
            .runs
            .iter()
            .map(|r| r.iterations * self.config.neighbors_per_iteration - r.skipped_neighbors)
            .sum::<usize>()
            + result.derived;
        let summary = GeneratorSummary::finish(
            Algorithm::Annealing,
            count,
            &lineups,
            evaluated,
            result.total_iterations(),
            started,
        );
        info!(
            produced = summary.produced,
            best_energy = result.best_energy(),
            derived = result.derived,
            elapsed_ms = summary.elapsed_ms,
            "simulated annealing finished"
        );
        Ok(GeneratorOutput { lineups, summary })
    }
}
