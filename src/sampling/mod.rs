//! Stochastic sampling.
//!
//! Builds many more feasible rosters than requested by sampling each slot
//! with probability weighted toward points per salary, then keeps the best
//! distinct ones.
//!
//! - Construction is budget-aware: a candidate is eligible only if the
//!   remaining cap still covers the cheapest completion of the open slots.
//! - A configurable share of trials starts from a team stack, chosen in
//!   proportion to its Stack+ rating.
//! - Rosters are deduplicated by their six-player signature and ranked by
//!   NexusScore minus the weighted exposure penalty; ties go to the lower
//!   salary, then to the lexicographically smaller id list.

mod config;
mod runner;

pub use config::SamplerConfig;
pub use runner::{SamplerResult, SamplerRunner, StochasticSampler};
