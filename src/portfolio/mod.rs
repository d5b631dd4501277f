//! Barbell portfolio construction.
//!
//! Generates a bulk of candidates through the hybrid orchestrator
//! (`size * candidate_multiplier`), classifies each by average ownership
//! into [`RiskCategory`] buckets (high-floor, high-ceiling, balanced) and by
//! [`StackShape`], then fills per-category targets with the best candidates
//! and backfills any shortfall from the best of the rest.

mod config;
mod runner;
mod types;

pub use config::PortfolioConfig;
pub use runner::{select_portfolio, Portfolio, PortfolioConstructor, PortfolioEntry};
pub use types::{
    category_targets, classify_risk, classify_stack_shape, CategoryTargets, RiskCategory, StackShape,
};
