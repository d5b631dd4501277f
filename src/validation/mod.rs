//! Player pool validation.
//!
//! Gates all downstream work. Checks run in a fixed order:
//!
//! 1. **Structural**: non-empty pool; each record has a name, a team, a
//!    known position, non-negative salary and projection, a unique id
//! 2. **Positional coverage**: every required position has a player
//!    (warns when only one)
//! 3. **Team balance**: at least two distinct teams (warns on over- or
//!    under-represented teams)
//! 4. **Salary feasibility**: the cheapest possible lineup must fit under
//!    the cap
//! 5. **Statistical sanity**: ownership/projection ranges, duplicate
//!    names, value outliers (warnings only)
//!
//! Errors make the pool unusable; warnings are surfaced to the caller and
//! never block generation.

mod checks;
mod pool;
mod report;

pub use checks::{minimum_lineup_salary, validate, validate_players};
pub use pool::PlayerPool;
pub use report::{PoolStats, ValidationReport};
