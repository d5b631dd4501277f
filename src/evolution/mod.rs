//! Population evolution.
//!
//! Maintains a fixed-size population of feasible rosters and breeds it for
//! a configured number of generations:
//!
//! - parents are drawn with [`Selection`] (fitness-proportional by default);
//! - offspring inherit each slot independently from one parent
//!   ([`operators::crossover`]), may have one slot replaced
//!   ([`operators::mutate`]) and are then [`operators::repair`]ed;
//! - the best `elite_ratio` of each generation survives unchanged.
//!
//! Every evaluated roster is archived by signature. The final selection is
//! drawn from the archive, discounting rosters whose team composition
//! duplicates one already selected.
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*

mod config;
pub mod operators;
mod runner;
mod selection;

pub use config::EvolutionConfig;
pub use runner::{fitness, EvolutionResult, EvolutionRunner, EvolutionaryOptimizer, Member};
pub use selection::Selection;
