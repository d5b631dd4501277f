//! Domain model: players, rosters, lineups, exposure and contest metadata.
//!
//! # Key Types
//!
//! - [`Player`]: an immutable pool member; [`PlayerRecord`] is its raw,
//!   pre-validation form
//! - [`RosterRules`]: salary cap, captain multiplier and slot layout
//! - [`Roster`]: index-based search state manipulated by the generators
//! - [`Lineup`]: a frozen, fully resolved result with its score breakdown
//! - [`ExposureSettings`] / [`ExposureTracker`]: soft batch-level exposure
//!   targets and the running counts used to penalize violations
//! - [`ContestInfo`] / [`TeamStack`]: contest metadata and stack ratings

mod contest;
mod exposure;
mod lineup;
mod player;

pub use contest::{ContestInfo, ContestType, TeamStack};
pub use exposure::{ExposureBand, ExposureSettings, ExposureTracker, TeamExposure};
pub use lineup::{Algorithm, Lineup, LineupSignature, Roster, ScoreCard, Slot, FLEX_SLOTS};
pub use player::{Player, PlayerRecord, Position, RosterRules};
