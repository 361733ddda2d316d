//! Rostering domain models.
//!
//! Provides the core data types for representing nurse rostering problems
//! and their solutions.
//!
//! # Domain Mappings
//!
//! | u-roster | Scheduling analogue |
//! |----------|---------------------|
//! | Nurse | Resource (human, skilled) |
//! | Shift | Fixed-time activity with a coverage requirement |
//! | Assignment | Resource-to-activity allocation |
//! | Roster | Schedule |
//! | NurseStats | Resource history (read-only) |
//! | PenaltyConfig | Objective weights |

mod nurse;
mod penalty;
mod period;
mod roster;
mod shift;
mod stats;

pub use nurse::{ContractType, Nurse, NursePreferences, SeniorityLevel};
pub use penalty::{PenaltyConfig, PenaltyKey};
pub use period::{consecutive_runs, longest_run, SchedulingPeriod, StreakCarry};
pub use roster::{Assignment, Roster, RosterStatus};
pub use shift::{NightWindow, Shift};
pub use stats::{fatigue_from_counts, NurseStats, StatsSnapshot};
