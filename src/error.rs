//! Error types.
//!
//! [`SolveError`] is the solver contract: structural infeasibility is fatal,
//! a timeout is retriable. [`RosterError`] is what the refinement loop
//! surfaces to its caller. Reaching the iteration cap and cancellation are
//! not errors; they are terminal statuses on the loop result. Only
//! [`FinalRosterResult::into_roster`](crate::controller::FinalRosterResult::into_roster)
//! turns a roster-less outcome into an error.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::controller::{IllegalTransition, IterationRecord};
use crate::validation::ValidationError;

/// Why a model has no hard-constraint-feasible roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Infeasibility {
    /// Shift that cannot be covered, when a single shift is to blame.
    pub shift_id: Option<String>,
    /// Human-readable explanation.
    pub reason: String,
}

impl Infeasibility {
    /// Infeasibility attributed to one shift.
    pub fn for_shift(shift_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            shift_id: Some(shift_id.into()),
            reason: reason.into(),
        }
    }

    /// Infeasibility of the model as a whole.
    pub fn global(reason: impl Into<String>) -> Self {
        Self {
            shift_id: None,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Infeasibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.shift_id {
            Some(id) => write!(f, "shift {id}: {}", self.reason),
            None => f.write_str(&self.reason),
        }
    }
}

/// Failure of a single solve.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    /// Hard constraints cannot be satisfied.
    #[error("infeasible model: {0}")]
    Infeasible(Infeasibility),

    /// Search budget exhausted before any feasible roster was found.
    #[error("solver exceeded its budget of {budget_ms} ms")]
    Timeout { budget_ms: u64 },
}

impl SolveError {
    /// Whether retrying the same solve may succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Errors surfaced by the refinement loop.
#[derive(Debug, Error)]
pub enum RosterError {
    /// Hard constraints cannot be satisfied.
    #[error("infeasible model: {0}")]
    InfeasibleModel(Infeasibility),

    /// The solver kept timing out after all retries.
    #[error("solver timed out after {attempts} attempt(s) of {budget_ms} ms")]
    SolverTimeout { budget_ms: u64, attempts: u32 },

    /// A validation report was malformed or had an unexpected shape.
    #[error("malformed validation report: {0}")]
    ValidationParse(String),

    /// The input snapshot failed structural checks.
    #[error("invalid input: {}", format_input_errors(.0))]
    InvalidInput(Vec<ValidationError>),

    /// A configuration value is invalid or could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The loop was cancelled before any roster was produced.
    #[error("cancelled before the first roster was produced")]
    Cancelled,

    /// A later iteration failed after earlier ones completed.
    #[error("loop interrupted after {} completed iteration(s)", .completed.len())]
    Interrupted {
        /// Iterations that completed before the failure, in order.
        completed: Vec<IterationRecord>,
        #[source]
        cause: Box<RosterError>,
    },

    /// The loop attempted a transition outside its state graph.
    #[error(transparent)]
    State(#[from] IllegalTransition),
}

fn format_input_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<serde_json::Error> for RosterError {
    fn from(err: serde_json::Error) -> Self {
        Self::ValidationParse(err.to_string())
    }
}

impl From<toml::de::Error> for RosterError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_timeout_is_retriable() {
        assert!(SolveError::Timeout { budget_ms: 10 }.is_retriable());
        assert!(!SolveError::Infeasible(Infeasibility::global("x")).is_retriable());
    }

    #[test]
    fn test_infeasibility_display() {
        let e = SolveError::Infeasible(Infeasibility::for_shift("S1", "no ICU nurse"));
        assert_eq!(e.to_string(), "infeasible model: shift S1: no ICU nurse");
        assert_eq!(Infeasibility::global("too few nurses").to_string(), "too few nurses");
    }

    #[test]
    fn test_invalid_input_display_joins_messages() {
        let err = RosterError::InvalidInput(vec![
            ValidationError::new(ValidationErrorKind::DuplicateId, "Duplicate nurse ID: N1"),
            ValidationError::new(
                ValidationErrorKind::EmptyShift,
                "Shift 'S1' ends before it starts",
            ),
        ]);
        assert_eq!(
            err.to_string(),
            "invalid input: Duplicate nurse ID: N1; Shift 'S1' ends before it starts"
        );
    }

    #[test]
    fn test_interrupted_exposes_cause() {
        use std::error::Error as _;

        let err = RosterError::Interrupted {
            completed: Vec::new(),
            cause: Box::new(RosterError::SolverTimeout {
                budget_ms: 5,
                attempts: 1,
            }),
        };
        assert_eq!(err.to_string(), "loop interrupted after 0 completed iteration(s)");
        let source = err.source().unwrap().to_string();
        assert_eq!(source, "solver timed out after 1 attempt(s) of 5 ms");
    }

    #[test]
    fn test_json_error_maps_to_parse_error() {
        let err: RosterError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, RosterError::ValidationParse(_)));
    }
}
