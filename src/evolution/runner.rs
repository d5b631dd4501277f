//! Generational loop execution.
//!
//! [`EvolutionRunner`] orchestrates the complete process:
//! initialization → evaluation → selection → crossover → mutation → repair → repeat,
//! followed by a diversity-aware final selection.

use super::config::EvolutionConfig;
use super::operators::{crossover, mutate, repair};
use crate::error::{OptimizerError, Result};
use crate::generator::{
    require_context, CancelToken, GeneratorOutput, GeneratorSummary, LineupContext,
    LineupGenerator, PartialRoster, ProgressSink,
};
use crate::model::{Algorithm, Lineup, Roster, ScoreCard};
use crate::random::{rng_from, shuffle};
use rand::Rng;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// A scored population member.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Member {
    pub roster: Roster,
    pub fitness: f64,
}

/// Result of an evolution run.
#[derive(Debug, Clone)]
pub struct EvolutionResult {
    /// Final selection, best first, distinct by signature.
    pub members: Vec<Member>,

    /// Generations executed.
    pub generations: usize,

    /// Offspring evaluated, including the initial population.
    pub evaluated: usize,

    /// Whether the run stopped on the stagnation limit.
    pub stagnated: bool,

    /// Best fitness after initialization and after each generation.
    pub fitness_history: Vec<f64>,
}

/// Executes population evolution against a prepared context.
pub struct EvolutionRunner;

impl EvolutionRunner {
    pub fn run(
        ctx: &LineupContext,
        count: usize,
        config: &EvolutionConfig,
        cancel: &CancelToken,
        sink: &dyn ProgressSink,
    ) -> Result<EvolutionResult> {
        config
            .validate()
            .map_err(|m| OptimizerError::invalid_config("evolution", m))?;
        cancel.check("evolution")?;

        if count == 0 {
            return Ok(EvolutionResult {
                members: Vec::new(),
                generations: 0,
                evaluated: 0,
                stagnated: false,
                fitness_history: Vec::new(),
            });
        }

        let mut rng = rng_from(config.seed);
        let size = config.population_for(count);
        let elite_count = config.elite_count(size);

        // 1. Initialize and evaluate
        let mut population = initial_population(ctx, size, &mut rng)?;
        evaluate(ctx, &mut population, config);
        let mut evaluated = population.len();

        let mut archive: HashMap<[usize; 6], Member> = HashMap::new();
        archive_all(&mut archive, &population);

        let mut best = best_fitness(&population);
        let mut fitness_history = Vec::with_capacity(config.generations + 1);
        fitness_history.push(best);

        let mut stagnation_counter = 0usize;
        let mut stagnated = false;
        let mut generations = 0usize;

        // 2. Generational loop
        for gen in 0..config.generations {
            cancel.check("evolution generation")?;

            population.sort_by(|a, b| b.fitness.partial_cmp(&a.fitness).unwrap_or(Ordering::Equal));
            let fitness: Vec<f64> = population.iter().map(|m| m.fitness).collect();

            let mut next: Vec<Member> = population[..elite_count].to_vec();
            while next.len() < size {
                let p1 = config.selection.select(&fitness, &mut rng);
                let p2 = config.selection.select(&fitness, &mut rng);

                let mut child = if rng.random_bool(config.crossover_rate) {
                    crossover(ctx, &population[p1].roster, &population[p2].roster, &mut rng)
                } else {
                    population[p1].roster
                };
                if rng.random_bool(config.mutation_rate) {
                    mutate(ctx, &mut child, &mut rng);
                }
                if !repair(ctx, &mut child) {
                    child = population[p1].roster;
                }

                next.push(Member {
                    roster: child,
                    fitness: f64::NEG_INFINITY,
                });
            }

            // elites keep their fitness
            evaluate(ctx, &mut next[elite_count..], config);
            evaluated += size - elite_count;
            population = next;
            archive_all(&mut archive, &population);
            generations = gen + 1;

            let gen_best = best_fitness(&population);
            if gen_best > best {
                best = gen_best;
                stagnation_counter = 0;
            } else {
                stagnation_counter += 1;
            }
            fitness_history.push(best);

            debug!(
                generation = gen + 1,
                best_fitness = best,
                archive = archive.len(),
                "evolution generation complete"
            );
            sink.on_progress(
                (gen + 1) as f64 / config.generations as f64 * 90.0,
                "evolution",
            );

            if config.stagnation_limit > 0 && stagnation_counter >= config.stagnation_limit {
                stagnated = true;
                break;
            }
        }

        let mut ranked: Vec<Member> = archive.into_values().collect();
        ranked.sort_by(|a, b| {
            b.fitness
                .partial_cmp(&a.fitness)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.roster.signature().cmp(&b.roster.signature()))
        });
        ranked.truncate(count.saturating_mul(5));
        let members = diversity_select(ctx, ranked, count, config.diversity_weight);
        sink.on_progress(100.0, "selection");

        Ok(EvolutionResult {
            members,
            generations,
            evaluated,
            stagnated,
            fitness_history,
        })
    }
}

/// NexusScore minus the weighted exposure penalty.
pub fn fitness(ctx: &LineupContext, roster: &Roster, exposure_weight: f64) -> f64 {
    ctx.score(roster).total - exposure_weight * ctx.exposure_penalty(roster, ctx.tracker())
}

fn evaluate(ctx: &LineupContext, members: &mut [Member], config: &EvolutionConfig) {
    let weight = config.exposure_weight;
    let eval = |m: &mut Member| m.fitness = fitness(ctx, &m.roster, weight);
    if config.parallel {
        members.par_iter_mut().for_each(eval);
    } else {
        members.iter_mut().for_each(eval);
    }
}

fn best_fitness(population: &[Member]) -> f64 {
    population
        .iter()
        .map(|m| m.fitness)
        .fold(f64::NEG_INFINITY, f64::max)
}

fn archive_all(archive: &mut HashMap<[usize; 6], Member>, population: &[Member]) {
    for member in population {
        archive
            .entry(member.roster.signature())
            .and_modify(|kept| {
                if member.fitness > kept.fitness {
                    *kept = *member;
                }
            })
            .or_insert(*member);
    }
}

/// Greedy roster plus random budget-aware rosters.
///
/// When fewer distinct rosters exist than `size`, existing ones are repeated.
fn initial_population<R: Rng>(ctx: &LineupContext, size: usize, rng: &mut R) -> Result<Vec<Member>> {
    let mut rosters: Vec<Roster> = Vec::with_capacity(size);
    rosters.extend(ctx.greedy_roster());

    let mut order = ctx.slot_order();
    let max_attempts = size.saturating_mul(20);
    let mut attempts = 0;
    while rosters.len() < size && attempts < max_attempts {
        attempts += 1;
        shuffle(&mut order, rng);
        let built = ctx.construct(PartialRoster::default(), &order, |_, feasible| {
            Some(feasible[rng.random_range(0..feasible.len())])
        });
        rosters.extend(built);
    }

    if rosters.is_empty() {
        return Err(OptimizerError::algorithm_failure(
            Algorithm::Evolutionary,
            "initial population",
            "no feasible roster could be constructed",
        ));
    }
    let distinct = rosters.len();
    for i in 0..size.saturating_sub(distinct) {
        rosters.push(rosters[i % distinct]);
    }

    Ok(rosters
        .into_iter()
        .map(|roster| Member {
            roster,
            fitness: f64::NEG_INFINITY,
        })
        .collect())
}

/// Picks `count` members, best first, discounting each candidate by
/// `1 - (1 - weight)^dups` of its fitness, where `dups` is the number of
/// already-selected members with the same team composition.
fn diversity_select(ctx: &LineupContext, ranked: Vec<Member>, count: usize, weight: f64) -> Vec<Member> {
    if weight <= 0.0 {
        return ranked.into_iter().take(count).collect();
    }

    let mut pool: Vec<(Member, BTreeMap<&str, usize>)> = ranked
        .into_iter()
        .map(|m| {
            let mut composition = BTreeMap::new();
            for idx in m.roster.players() {
                *composition.entry(ctx.player(idx).team.as_str()).or_insert(0) += 1;
            }
            (m, composition)
        })
        .collect();

    let mut used: HashMap<BTreeMap<&str, usize>, i32> = HashMap::new();
    let mut selected = Vec::with_capacity(count.min(pool.len()));
    while selected.len() < count && !pool.is_empty() {
        let mut best_idx = 0;
        let mut best_adjusted = f64::NEG_INFINITY;
        for (i, (member, composition)) in pool.iter().enumerate() {
            let dups = used.get(composition).copied().unwrap_or(0);
            let discount = 1.0 - (1.0 - weight).powi(dups);
            let adjusted = member.fitness - member.fitness.abs() * discount;
            if adjusted > best_adjusted {
                best_adjusted = adjusted;
                best_idx = i;
            }
        }
        let (member, composition) = pool.remove(best_idx);
        *used.entry(composition).or_insert(0) += 1;
        selected.push(member);
    }

    selected.sort_by(|a, b| b.fitness.partial_cmp(&a.fitness).unwrap_or(Ordering::Equal));
    selected
}

/// Population evolution generator.
#[derive(Debug, Default)]
pub struct EvolutionaryOptimizer {
    config: EvolutionConfig,
    context: Option<Arc<LineupContext>>,
    cancel: CancelToken,
}

impl EvolutionaryOptimizer {
    pub fn new(config: EvolutionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }
}

impl LineupGenerator for EvolutionaryOptimizer {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Evolutionary
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
        let ctx = require_context(self.context.as_ref(), Algorithm::Evolutionary)?;
        let started = Instant::now();
        info!(
            count,
            population = self.config.population_for(count),
            generations = self.config.generations,
            "evolution started"
        );

        let result = EvolutionRunner::run(&ctx, count, &self.config, &self.cancel, sink)?;
        let lineups: Vec<Lineup> = result
            .members
            .iter()
            .map(|m| {
                let scores = ScoreCard {
                    fitness: m.fitness,
                    ..ScoreCard::default()
                };
                ctx.to_lineup(&m.roster, Algorithm::Evolutionary, scores)
            })
            .collect();

        let summary = GeneratorSummary::finish(
            Algorithm::Evolutionary,
            count,
            &lineups,
            result.evaluated,
            result.generations,
            started,
        );
        info!(
            produced = summary.produced,
            generations = result.generations,
            stagnated = result.stagnated,
            elapsed_ms = summary.elapsed_ms,
            "evolution finished"
        );
        Ok(GeneratorOutput { lineups, summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::generator::NoProgress;
    use std::collections::HashSet;

    fn config() -> EvolutionConfig {
        EvolutionConfig::default()
            .with_population_size(40)
            .with_generations(20)
            .with_seed(42)
            .with_parallel(false)
    }

    #[test]
    fn test_valid_distinct_members() {
        let ctx = fixtures::sample_context();
        let result = EvolutionRunner::run(&ctx, 10, &config(), &CancelToken::new(), &NoProgress).unwrap();
        assert_eq!(result.members.len(), 10);
        let signatures: HashSet<_> = result.members.iter().map(|m| m.roster.signature()).collect();
        assert_eq!(signatures.len(), 10);
        for m in &result.members {
            assert!(ctx.is_valid(&m.roster), "{:?}", ctx.check(&m.roster));
        }
        for w in result.members.windows(2) {
            assert!(w[0].fitness >= w[1].fitness);
        }
    }

    #[test]
    fn test_best_never_regresses() {
        let ctx = fixtures::sample_context();
        let config = config().with_stagnation_limit(0);
        let result = EvolutionRunner::run(&ctx, 5, &config, &CancelToken::new(), &NoProgress).unwrap();
        assert_eq!(result.fitness_history.len(), 21);
        for w in result.fitness_history.windows(2) {
            assert!(w[1] >= w[0]);
        }
    }

    #[test]
    fn test_improves_on_greedy_start() {
        let ctx = fixtures::sample_context();
        let greedy = ctx.greedy_roster().unwrap();
        let result = EvolutionRunner::run(&ctx, 1, &config(), &CancelToken::new(), &NoProgress).unwrap();
        assert!(result.members[0].fitness >= fitness(&ctx, &greedy, 1.0));
    }

    #[test]
    fn test_stagnation_termination() {
        let ctx = fixtures::sample_context();
        let config = config().with_generations(500).with_stagnation_limit(5);
        let result = EvolutionRunner::run(&ctx, 3, &config, &CancelToken::new(), &NoProgress).unwrap();
        assert!(result.stagnated);
        assert!(result.generations < 500);
    }

    #[test]
    fn test_cancellation() {
        let ctx = fixtures::sample_context();
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = EvolutionRunner::run(&ctx, 3, &config(), &cancel, &NoProgress).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let ctx = fixtures::sample_context();
        let seq = EvolutionRunner::run(&ctx, 5, &config(), &CancelToken::new(), &NoProgress).unwrap();
        let par = EvolutionRunner::run(&ctx, 5, &config().with_parallel(true), &CancelToken::new(), &NoProgress)
            .unwrap();
        assert_eq!(seq.members, par.members);
    }

    #[test]
    fn test_diversity_select_spreads_compositions() {
        let ctx = fixtures::sample_context();
        let mut rng = rng_from(Some(8));
        let mut ranked: Vec<Member> = (0..60)
            .filter_map(|_| {
                ctx.construct(PartialRoster::default(), &ctx.slot_order(), |_, f| {
                    Some(f[rng.random_range(0..f.len())])
                })
            })
            .map(|roster| Member {
                roster,
                fitness: fitness(&ctx, &roster, 1.0),
            })
            .collect();
        ranked.sort_by(|a, b| b.fitness.partial_cmp(&a.fitness).unwrap());

        let composition = |m: &Member| {
            let mut c: BTreeMap<String, usize> = BTreeMap::new();
            for idx in m.roster.players() {
                *c.entry(ctx.player(idx).team.clone()).or_insert(0) += 1;
            }
            c
        };
        let distinct = |members: &[Member]| members.iter().map(composition).collect::<HashSet<_>>().len();

        let plain = diversity_select(&ctx, ranked.clone(), 8, 0.0);
        let diverse = diversity_select(&ctx, ranked, 8, 0.9);
        assert_eq!(plain.len(), 8);
        assert_eq!(diverse.len(), 8);
        assert!(distinct(&diverse) >= distinct(&plain));
    }
}
