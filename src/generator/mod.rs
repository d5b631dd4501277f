//! Shared contract of the candidate generators.
//!
//! Every generator follows the same lifecycle:
//!
//! 1. [`LineupGenerator::initialize`] validates and indexes a
//!    [`GeneratorInput`] into a shared [`LineupContext`] (or
//!    [`LineupGenerator::bind`] attaches one that already exists).
//! 2. [`LineupGenerator::run`] produces up to `count` distinct, salary-capped
//!    lineups, reporting progress to a [`ProgressSink`] at loop milestones.
//! 3. [`LineupGenerator::cancel`] flips a [`CancelToken`] that the loop
//!    checks at its next boundary; the run then fails with
//!    [`OptimizerError::Cancelled`](crate::error::OptimizerError::Cancelled).
//!
//! [`Generator`] is the closed set of implementations, built from an
//! [`Algorithm`] tag and an [`EngineConfig`].

mod context;
mod types;

pub use context::{GeneratorInput, LineupContext, PartialRoster};
pub use types::{
    CancelToken, GeneratorOutput, GeneratorSummary, LineupGenerator, NoProgress, ProgressSink,
    ScopedProgress,
};

pub(crate) use types::require_context;

use crate::annealing::AnnealingOptimizer;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::evolution::EvolutionaryOptimizer;
use crate::model::Algorithm;
use crate::sampling::StochasticSampler;
use std::sync::Arc;

/// One of the three candidate generators.
#[derive(Debug)]
pub enum Generator {
    Stochastic(StochasticSampler),
    Evolutionary(EvolutionaryOptimizer),
    Annealing(AnnealingOptimizer),
}

impl Generator {
    /// Builds the generator for `algorithm` from the matching engine section.
    pub fn new(algorithm: Algorithm, engine: &EngineConfig) -> Self {
        match algorithm {
            Algorithm::Stochastic => Generator::Stochastic(StochasticSampler::new(engine.sampler.clone())),
            Algorithm::Evolutionary => {
                Generator::Evolutionary(EvolutionaryOptimizer::new(engine.evolution.clone()))
            }
            Algorithm::Annealing => Generator::Annealing(AnnealingOptimizer::new(engine.annealing.clone())),
        }
    }

    fn inner(&self) -> &dyn LineupGenerator {
        match self {
            Generator::Stochastic(g) => g,
            Generator::Evolutionary(g) => g,
            Generator::Annealing(g) => g,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn LineupGenerator {
        match self {
            Generator::Stochastic(g) => g,
            Generator::Evolutionary(g) => g,
            Generator::Annealing(g) => g,
        }
    }
}

impl LineupGenerator for Generator {
    fn algorithm(&self) -> Algorithm {
        self.inner().algorithm()
    }

    fn bind(&mut self, context: Arc<LineupContext>) {
        self.inner_mut().bind(context);
    }

    fn context(&self) -> Option<&Arc<LineupContext>> {
        self.inner().context()
    }

    fn cancel_token(&self) -> &CancelToken {
        self.inner().cancel_token()
    }

    fn set_cancel_token(&mut self, token: CancelToken) {
        self.inner_mut().set_cancel_token(token);
    }

    fn run(&mut self, count: usize, sink: &dyn ProgressSink) -> Result<GeneratorOutput> {
        self.inner_mut().run(count, sink)
    }
}
