//! Nurse rostering engine with a feedback-driven refinement loop.
//!
//! Generates a shift roster that satisfies hard regulatory rules, checks it
//! for compliance and fairness, and feeds unresolved fairness issues back
//! into the solver's penalty weights until the roster passes or the
//! iteration cap is reached.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Nurse`, `Shift`, `Roster`, `NurseStats`,
//!   `SchedulingPeriod`, `PenaltyConfig`
//! - **`problem`**: `RosterProblem`, the frozen input snapshot
//! - **`validation`**: Input integrity checks (duplicate IDs, shift bounds, stats ranges)
//! - **`solver`**: `RosterSolver` trait and the backtracking `ConstraintSolver`
//! - **`validator`**: Compliance and fairness checks, `ValidationReport`
//! - **`feedback`**: Penalty escalation and decay between iterations
//! - **`controller`**: `LoopController` state machine and `FinalRosterResult`
//! - **`config`**: Rule thresholds and loop tuning, loadable from TOML
//!
//! # Flow
//!
//! ```text
//! Generating ──► Validating ──► Passed
//!     ▲              │
//!     │              ├──► MaxIterationsReached
//!     └── Analyzing ◄┘
//! ```
//!
//! # References
//!
//! - Burke et al. (2004), "The State of the Art of Nurse Rostering"
//! - Cheang et al. (2003), "Nurse rostering problems: a bibliographic survey"

pub mod config;
pub mod controller;
pub mod error;
pub mod feedback;
pub mod models;
pub mod problem;
pub mod solver;
pub mod validation;
pub mod validator;

pub use controller::{CancellationToken, FinalRosterResult, LoopController, LoopStatus};
pub use error::{RosterError, SolveError};
pub use problem::RosterProblem;
