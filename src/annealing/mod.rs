//! Simulated annealing.
//!
//! Several independent runs (up to [`MAX_RUNS`], on a bounded thread pool)
//! each walk the roster space from a starting roster. Every iteration
//! samples a handful of neighbors through the five [`MoveKind`]s and
//! proposes the best one; the proposal is accepted with the Metropolis
//! probability `exp(delta / T)` unless that falls below a floor.
//!
//! Temperature cools geometrically and is reheated when a run stagnates.
//! After the runs, their best rosters are merged and the batch is filled
//! with small mutations of the overall best.
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Metropolis et al. (1953), "Equation of State Calculations by Fast Computing Machines"

mod config;
pub mod moves;
mod runner;

pub use config::{AnnealingConfig, MAX_RUNS};
pub use moves::MoveKind;
pub use runner::{
    acceptance_probability, accepts, energy, AnnealingOptimizer, AnnealingResult, AnnealingRunner,
    RunStats,
};
