//! Performance learning.
//!
//! Every completed run appends one [`PerformanceRecord`] per contributing
//! algorithm to a bounded history. Once an algorithm has enough records,
//! its weight is nudged toward a target derived from the averaged
//! composite score (ROI 40%, NexusScore 40%, diversity 20%):
//!
//! ```text
//! target = clamp(composite / reference_score, min_weight, max_weight)
//! weight = (1 - rho) * weight + rho * target
//! ```
//!
//! History and weights persist through an injected [`KeyValueStore`].
//! Updates are serialized behind one lock, so a tracker can be shared by
//! concurrent runs.

mod config;
mod store;
mod tracker;

pub use config::LearningConfig;
pub use store::{KeyValueStore, MemoryStore};
pub use tracker::{diversity_score, AlgorithmStats, PerformanceRecord, PerformanceTracker};
