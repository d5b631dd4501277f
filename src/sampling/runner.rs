//! Stochastic sampling loop.

use super::config::SamplerConfig;
use crate::error::{OptimizerError, Result};
use crate::generator::{
    require_context, CancelToken, GeneratorOutput, GeneratorSummary, LineupContext,
    LineupGenerator, PartialRoster, ProgressSink,
};
use crate::model::{Algorithm, Lineup, Roster, ScoreCard, Slot};
use crate::random::{rng_from, shuffle, weighted_index};
use rand::Rng;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Result of a sampling run.
#[derive(Debug, Clone)]
pub struct SamplerResult {
    /// Best distinct lineups, best first.
    pub lineups: Vec<Lineup>,

    /// Trials attempted.
    pub trials: usize,

    /// Trials that produced a feasible roster.
    pub feasible: usize,

    /// Distinct signatures seen.
    pub unique: usize,

    /// Trial batches completed.
    pub batches: usize,
}

struct Candidate {
    roster: Roster,
    score: f64,
    adjusted: f64,
    salary: u32,
    ids: Vec<String>,
}

/// Executes stochastic sampling against a prepared context.
pub struct SamplerRunner;

impl SamplerRunner {
    pub fn run(
        ctx: &LineupContext,
        count: usize,
        config: &SamplerConfig,
        cancel: &CancelToken,
        sink: &dyn ProgressSink,
    ) -> Result<SamplerResult> {
        config
            .validate()
            .map_err(|m| OptimizerError::invalid_config("sampler", m))?;
        cancel.check("stochastic sampling")?;

        if count == 0 {
            return Ok(SamplerResult {
                lineups: Vec::new(),
                trials: 0,
                feasible: 0,
                unique: 0,
                batches: 0,
            });
        }

        let mut rng = rng_from(config.seed);
        let total = config.total_trials(count);
        let batches = total.div_ceil(config.batch_size);

        let mut best_by_signature: HashMap<[usize; 6], (Roster, f64)> = HashMap::new();
        let mut trials = 0usize;
        let mut feasible = 0usize;

        for batch in 0..batches {
            cancel.check("stochastic trial batch")?;

            let end = (trials + config.batch_size).min(total);
            while trials < end {
                trials += 1;
                let Some(roster) = sample_roster(ctx, config, &mut rng) else {
                    continue;
                };
                feasible += 1;
                let score = ctx.score(&roster).total;
                best_by_signature
                    .entry(roster.signature())
                    .and_modify(|(kept, kept_score)| {
                        if score > *kept_score {
                            *kept = roster;
                            *kept_score = score;
                        }
                    })
                    .or_insert((roster, score));
            }

            debug!(
                batch = batch + 1,
                batches,
                trials,
                unique = best_by_signature.len(),
                "stochastic batch complete"
            );
            sink.on_progress((batch + 1) as f64 / batches as f64 * 90.0, "sampling");
        }

        let unique = best_by_signature.len();
        let ranked = rank_candidates(ctx, config, best_by_signature.into_values());
        let selected = select_balanced(ctx, ranked, count);
        sink.on_progress(100.0, "ranking");

        let lineups = selected
            .iter()
            .map(|c| ctx.to_lineup(&c.roster, Algorithm::Stochastic, ScoreCard::default()))
            .collect();

        Ok(SamplerResult {
            lineups,
            trials,
            feasible,
            unique,
            batches,
        })
    }
}

/// One budget-aware trial, optionally seeded from a team stack.
fn sample_roster<R: Rng>(ctx: &LineupContext, config: &SamplerConfig, rng: &mut R) -> Option<Roster> {
    let mut order = ctx.slot_order();
    shuffle(&mut order, rng);

    let mut partial = PartialRoster::default();
    if !ctx.team_stacks().is_empty() && rng.random_bool(config.stack_probability) {
        seed_stack(ctx, &mut partial, rng);
    }

    let seeded = partial != PartialRoster::default();
    let mut pick = |slot: Slot, feasible: &[usize]| Some(pick_weighted(ctx, slot, feasible, config.randomness, rng));
    match ctx.construct(partial, &order, &mut pick) {
        Some(roster) => Some(roster),
        None if seeded => ctx.construct(PartialRoster::default(), &order, &mut pick),
        None => None,
    }
}

/// Places the players of one stack, chosen in proportion to Stack+.
fn seed_stack<R: Rng>(ctx: &LineupContext, partial: &mut PartialRoster, rng: &mut R) {
    let stacks = ctx.team_stacks();
    let weights: Vec<f64> = stacks.iter().map(|s| s.stack_plus).collect();
    let Some(chosen) = weighted_index(&weights, rng) else {
        return;
    };
    let stack = &stacks[chosen];

    for position in &stack.positions {
        let slot = match position.slot_index() {
            Some(i) => Slot::Flex(i),
            None if ctx.team_slot() => Slot::Team,
            None => continue,
        };
        if partial.get(slot).is_some() {
            continue;
        }
        let teammate = ctx
            .candidates(slot)
            .iter()
            .copied()
            .find(|&i| ctx.player(i).team == stack.team && !partial.used().contains(&i));
        if let Some(idx) = teammate {
            partial.set(slot, idx);
        }
    }
}

/// Samples a candidate weighted toward points per salary.
///
/// Weights are `(value / best_value)^((1 - randomness) / randomness)`:
/// randomness 0 is a pure argmax, 0.5 is proportional to value and 1 is
/// uniform over the feasible set.
fn pick_weighted<R: Rng>(
    ctx: &LineupContext,
    slot: Slot,
    feasible: &[usize],
    randomness: f64,
    rng: &mut R,
) -> usize {
    let values: Vec<f64> = feasible
        .iter()
        .map(|&i| ctx.slot_projection(slot, i) / ctx.slot_salary(slot, i).max(1) as f64)
        .collect();
    let (best, top) = values
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |acc, (i, v)| if v > acc.1 { (i, v) } else { acc });

    if randomness <= f64::EPSILON {
        return feasible[best];
    }
    if top <= 0.0 {
        return feasible[rng.random_range(0..feasible.len())];
    }

    let exponent = (1.0 - randomness) / randomness;
    let weights: Vec<f64> = values
        .iter()
        .map(|v| (v.max(0.0) / top).powf(exponent))
        .collect();
    weighted_index(&weights, rng).map_or(feasible[best], |k| feasible[k])
}

/// Orders candidates by exposure-adjusted score, then lower salary, then ids.
fn rank_candidates(
    ctx: &LineupContext,
    config: &SamplerConfig,
    candidates: impl Iterator<Item = (Roster, f64)>,
) -> Vec<Candidate> {
    let mut ranked: Vec<Candidate> = candidates
        .map(|(roster, score)| {
            let penalty = ctx.exposure_penalty(&roster, ctx.tracker());
            let mut ids: Vec<String> = roster.core().iter().map(|&i| ctx.player(i).id.clone()).collect();
            ids.sort();
            Candidate {
                roster,
                score,
                adjusted: score - config.exposure_weight * penalty,
                salary: ctx.salary(&roster),
                ids,
            }
        })
        .collect();
    ranked.sort_by(compare_candidates);
    ranked
}

fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    b.adjusted
        .partial_cmp(&a.adjusted)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.salary.cmp(&b.salary))
        .then_with(|| a.ids.cmp(&b.ids))
        .then_with(|| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal))
}

/// Takes the top `count`, deferring rosters that would push a player past
/// their exposure maximum until nothing else is left.
fn select_balanced(ctx: &LineupContext, ranked: Vec<Candidate>, count: usize) -> Vec<Candidate> {
    if ctx.exposure().is_empty() {
        return ranked.into_iter().take(count).collect();
    }

    let mut tracker = ctx.tracker().clone();
    let mut selected = Vec::with_capacity(count);
    let mut deferred = Vec::new();
    for candidate in ranked {
        if selected.len() == count {
            break;
        }
        let captain = ctx.player(candidate.roster.captain);
        let others = ctx.others(&candidate.roster);
        if tracker.would_exceed(ctx.exposure(), captain, &others) {
            deferred.push(candidate);
            continue;
        }
        tracker.record_players(captain, &others);
        selected.push(candidate);
    }

    let missing = count.saturating_sub(selected.len());
    selected.extend(deferred.into_iter().take(missing));
    selected.sort_by(compare_candidates);
    selected
}

/// Stochastic sampling generator.
#[derive(Debug, Default)]
pub struct StochasticSampler {
    config: SamplerConfig,
    context: Option<Arc<LineupContext>>,
    cancel: CancelToken,
}

impl StochasticSampler {
    pub fn new(config: SamplerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }
}

impl LineupGenerator for StochasticSampler {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Stochastic
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
        let ctx = require_context(self.context.as_ref(), Algorithm::Stochastic)?;
        let started = Instant::now();
        info!(
            count,
            trials = self.config.total_trials(count),
            randomness = self.config.randomness,
            "stochastic sampling started"
        );

        let result = SamplerRunner::run(&ctx, count, &self.config, &self.cancel, sink)?;
        let summary = GeneratorSummary::finish(
            Algorithm::Stochastic,
            count,
            &result.lineups,
            result.feasible,
            result.batches,
            started,
        );
        info!(
            produced = summary.produced,
            unique = result.unique,
            elapsed_ms = summary.elapsed_ms,
            "stochastic sampling finished"
        );
        Ok(GeneratorOutput {
            lineups: result.lineups,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, RecordingSink};
    use crate::generator::NoProgress;
    use crate::model::{ExposureBand, ExposureSettings};
    use crate::generator::{GeneratorInput, LineupContext};
    use std::collections::HashSet;

    fn config() -> SamplerConfig {
        SamplerConfig::default().with_seed(42).with_min_trials(300)
    }

    #[test]
    fn test_unique_valid_sorted() {
        let ctx = fixtures::sample_context();
        let result = SamplerRunner::run(&ctx, 10, &config(), &CancelToken::new(), &NoProgress).unwrap();
        assert_eq!(result.lineups.len(), 10);
        assert_eq!(result.trials, 400);

        let signatures: HashSet<_> = result.lineups.iter().map(Lineup::signature).collect();
        assert_eq!(signatures.len(), 10);
        for lineup in &result.lineups {
            let roster = ctx.roster_of(lineup).unwrap();
            assert!(ctx.is_valid(&roster));
        }
        for w in result.lineups.windows(2) {
            assert!(w[0].score.total >= w[1].score.total - 1e-9);
        }
    }

    #[test]
    fn test_seed_is_reproducible() {
        let ctx = fixtures::sample_context();
        let a = SamplerRunner::run(&ctx, 5, &config(), &CancelToken::new(), &NoProgress).unwrap();
        let b = SamplerRunner::run(&ctx, 5, &config(), &CancelToken::new(), &NoProgress).unwrap();
        assert_eq!(a.lineups, b.lineups);
    }

    #[test]
    fn test_zero_randomness_is_greedy() {
        let ctx = fixtures::sample_context();
        let config = config().with_randomness(0.0).with_stack_probability(0.0);
        let mut rng = rng_from(Some(1));
        let first = sample_roster(&ctx, &config, &mut rng).unwrap();
        assert!(ctx.is_valid(&first));
        // The argmax of a slot's feasible set is its best-value candidate.
        let slot = Slot::Flex(0);
        let feasible = ctx.candidates(slot).to_vec();
        let pick = pick_weighted(&ctx, slot, &feasible, 0.0, &mut rng);
        let best = feasible
            .iter()
            .copied()
            .max_by(|a, b| ctx.player(*a).value().partial_cmp(&ctx.player(*b).value()).unwrap())
            .unwrap();
        assert_eq!(ctx.player(pick).value(), ctx.player(best).value());
    }

    #[test]
    fn test_full_randomness_is_uniform() {
        let ctx = fixtures::sample_context();
        let slot = Slot::Flex(0);
        let feasible = ctx.candidates(slot).to_vec();
        let mut rng = rng_from(Some(9));
        let draws = 4_000;
        let mut counts = vec![0usize; feasible.len()];
        for _ in 0..draws {
            let pick = pick_weighted(&ctx, slot, &feasible, 1.0, &mut rng);
            let k = feasible.iter().position(|&i| i == pick).unwrap();
            counts[k] += 1;
        }
        let expected = draws as f64 / feasible.len() as f64;
        for count in counts {
            assert!((count as f64 - expected).abs() < expected * 0.2, "{count} vs {expected}");
        }
    }

    #[test]
    fn test_half_randomness_is_proportional_to_value() {
        let ctx = fixtures::sample_context();
        let slot = Slot::Flex(0);
        let feasible = ctx.candidates(slot).to_vec();
        let (hi, lo) = feasible
            .iter()
            .fold((feasible[0], feasible[0]), |(hi, lo), &i| {
                let v = ctx.player(i).value();
                (
                    if v > ctx.player(hi).value() { i } else { hi },
                    if v < ctx.player(lo).value() { i } else { lo },
                )
            });
        let pair = [hi, lo];
        let mut rng = rng_from(Some(11));
        let draws = 6_000;
        let hi_count = (0..draws)
            .filter(|_| pick_weighted(&ctx, slot, &pair, 0.5, &mut rng) == hi)
            .count();
        let (vh, vl) = (ctx.player(hi).value(), ctx.player(lo).value());
        let expected = vh / (vh + vl);
        let observed = hi_count as f64 / draws as f64;
        assert!((observed - expected).abs() < 0.03, "{observed} vs {expected}");
    }

    #[test]
    fn test_progress_reported_per_batch() {
        let ctx = fixtures::sample_context();
        let sink = RecordingSink::default();
        let config = config().with_batch_size(100);
        SamplerRunner::run(&ctx, 5, &config, &CancelToken::new(), &sink).unwrap();
        let events = sink.progress.lock().unwrap();
        // 300 trials in batches of 100, plus the final ranking step
        assert_eq!(events.len(), 4);
        assert_eq!(events.last().unwrap().0, 100.0);
        assert!(events.windows(2).all(|w| w[0].0 <= w[1].0));
    }

    #[test]
    fn test_exposure_max_is_respected_when_possible() {
        let settings = ExposureSettings::default().with_player("T1-MID", ExposureBand::new(0.0, 0.0));
        let ctx = LineupContext::prepare(fixtures::sample_input().with_exposure(settings)).unwrap();
        let result = SamplerRunner::run(&ctx, 8, &config(), &CancelToken::new(), &NoProgress).unwrap();
        assert_eq!(result.lineups.len(), 8);
        for lineup in &result.lineups {
            assert!(lineup.players().all(|p| p.id != "T1-MID"));
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let ctx = fixtures::sample_context();
        let err = SamplerRunner::run(
            &ctx,
            5,
            &config().with_batch_size(0),
            &CancelToken::new(),
            &NoProgress,
        )
        .unwrap_err();
        assert!(matches!(err, OptimizerError::InvalidConfig { .. }));
    }

    #[test]
    fn test_generator_summary() {
        let mut sampler = StochasticSampler::new(config());
        sampler.initialize(GeneratorInput::new(fixtures::sample_players())).unwrap();
        let output = sampler.run(4, &NoProgress).unwrap();
        assert_eq!(output.summary.requested, 4);
        assert_eq!(output.summary.produced, 4);
        assert_eq!(output.summary.iterations, 3);
        assert!(output.summary.best_score >= output.summary.average_score);
        assert!(output.lineups.iter().all(|l| l.scores.nexus > 0.0));
    }
}
