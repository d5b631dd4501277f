//! Hybrid orchestration.
//!
//! Splits a batch across generators by a percentage [`Distribution`]
//! (`round(total * pct / 100)` each, zero allocations skipped), runs them
//! sequentially or on a bounded thread pool, and merges the results:
//! sorted by ranking score, deduplicated by the six-player signature,
//! truncated to the requested size.
//!
//! A generator that fails is logged and skipped; a cancellation aborts the
//! whole run.

mod config;
mod runner;

pub use config::{default_distribution, single, validate_distribution, Distribution, HybridConfig};
pub use runner::{allocate, merge_candidates, AlgorithmReport, HybridOrchestrator, HybridResult};
