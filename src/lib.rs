//! Salary-capped captain-mode lineup optimization for League of Legends
//! daily fantasy contests.
//!
//! A lineup is one CAPTAIN (1.5× salary and points), five FLEX players and
//! an optional TEAM slot, all under a salary cap. The crate provides:
//!
//! - **Validation**: gates a raw player pool before any work is done.
//! - **NexusScore**: composite quality of a roster (projection, leverage,
//!   stacking, salary usage).
//! - **Generators**: stochastic sampling, evolutionary search and
//!   multi-run simulated annealing behind one [`generator::LineupGenerator`]
//!   contract with cancellation and progress reporting.
//! - **Hybrid**: runs several generators on a percentage split and merges
//!   their output.
//! - **Strategy**: named presets and automatic recommendation from the
//!   constraint analysis of a run.
//! - **Portfolio**: barbell selection across risk categories.
//! - **Learning**: adapts per-algorithm weights from past outcomes.
//! - **Session**: the [`session::OptimizationRun`] facade tying it together.
//!
//! # Example
//!
//! ```no_run
//! use nexus_lineup::session::{OptimizationRun, RunInput};
//!
//! # fn records() -> Vec<nexus_lineup::model::PlayerRecord> { Vec::new() }
//! let run = OptimizationRun::initialize(RunInput::new(records()))?;
//! let outcome = run.optimize(20, "recommended", None)?;
//! for lineup in &outcome.lineups {
//!     println!("{} {:.1}", lineup.captain.name, lineup.score.total);
//! }
//! # Ok::<(), nexus_lineup::error::OptimizerError>(())
//! ```

pub mod annealing;
pub mod config;
pub mod error;
pub mod evolution;
pub mod generator;
pub mod hybrid;
pub mod learning;
pub mod model;
pub mod portfolio;
pub mod random;
pub mod sampling;
pub mod scoring;
pub mod session;
pub mod strategy;
pub mod validation;

#[cfg(test)]
mod fixtures;
