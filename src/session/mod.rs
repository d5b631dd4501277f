//! Session facade.
//!
//! An [`OptimizationRun`] is the unit a caller works with:
//!
//! ```text
//! initialize(RunInput) ─► init_summary()
//!                      ─► optimize(count, strategy, overrides)*
//!                      ─► strategies() / cancel()
//! ```
//!
//! Each run owns its pool, exposure counts, cancellation token and
//! progress sink, so concurrent runs never observe each other. Only a
//! [`PerformanceTracker`](crate::learning::PerformanceTracker) attached
//! with [`OptimizationRun::with_learning`] is shared.
//!
//! [`SessionStore`] keeps runs addressable by id for callers that need to
//! cancel or inspect a run from elsewhere.

mod run;
mod store;
mod types;

pub use run::OptimizationRun;
pub use store::{InMemorySessionStore, SessionStore};
pub use types::{InitSummary, OptimizationOutcome, OptimizationSummary, RunInput, StrategyInfo};

use crate::model::{PlayerRecord, RosterRules};
use crate::validation::ValidationReport;

/// Validates raw records against the default roster rules without
/// starting a run.
pub fn validate(records: &[PlayerRecord]) -> ValidationReport {
    crate::validation::validate(records, &RosterRules::default())
}
