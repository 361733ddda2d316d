//! Refinement loop states and legal transitions.
//!
//! ```text
//! Generating → Validating | Infeasible
//! Validating → Passed | Analyzing | MaxIterationsReached
//! Analyzing  → Generating            (iteration + 1)
//! any non-terminal → Cancelled
//! ```
//!
//! Every accepted transition is recorded for replay and diagnostics.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Refinement loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    /// The solver is building a roster.
    Generating,
    /// The roster is being checked.
    Validating,
    /// Penalties are being adjusted from a failing report.
    Analyzing,
    /// A roster passed both checks. Terminal.
    Passed,
    /// The last allowed iteration failed. Terminal.
    MaxIterationsReached,
    /// Hard constraints cannot be met. Terminal.
    Infeasible,
    /// The caller stopped the loop. Terminal.
    Cancelled,
}

impl LoopState {
    /// Whether no further transition is allowed.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Passed | Self::MaxIterationsReached | Self::Infeasible | Self::Cancelled
        )
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Generating => "Generating",
            Self::Validating => "Validating",
            Self::Analyzing => "Analyzing",
            Self::Passed => "Passed",
            Self::MaxIterationsReached => "MaxIterationsReached",
            Self::Infeasible => "Infeasible",
            Self::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

fn is_legal_transition(from: LoopState, to: LoopState) -> bool {
    use LoopState::*;

    if to == Cancelled && !from.is_terminal() {
        return true;
    }

    matches!(
        (from, to),
        (Generating, Validating)
            | (Generating, Infeasible)
            | (Validating, Passed)
            | (Validating, Analyzing)
            | (Validating, MaxIterationsReached)
            | (Analyzing, Generating)
    )
}

/// One recorded transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: LoopState,
    pub to: LoopState,
    /// Iteration in progress when the transition happened.
    pub iteration: u32,
    /// Milliseconds since the loop started.
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A transition outside the state graph was attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal loop transition: {from} -> {to}")]
pub struct IllegalTransition {
    pub from: LoopState,
    pub to: LoopState,
}

/// Loop state machine. Starts in `Generating` at iteration 1.
#[derive(Debug)]
pub struct StateMachine {
    current: LoopState,
    iteration: u32,
    started: Instant,
    transitions: Vec<TransitionRecord>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            current: LoopState::Generating,
            iteration: 1,
            started: Instant::now(),
            transitions: Vec::new(),
        }
    }

    pub fn current(&self) -> LoopState {
        self.current
    }

    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Moves to `to` if the edge exists, recording it.
    ///
    /// `Analyzing → Generating` starts the next iteration.
    pub fn advance(
        &mut self,
        to: LoopState,
        reason: Option<&str>,
    ) -> Result<(), IllegalTransition> {
        let from = self.current;
        if !is_legal_transition(from, to) {
            return Err(IllegalTransition { from, to });
        }
        if from == LoopState::Analyzing && to == LoopState::Generating {
            self.iteration += 1;
        }

        debug!(iteration = self.iteration, %from, %to, reason, "loop transition");
        self.transitions.push(TransitionRecord {
            from,
            to,
            iteration: self.iteration,
            elapsed_ms: self.started.elapsed().as_millis() as u64,
            reason: reason.map(str::to_owned),
        });
        self.current = to;
        Ok(())
    }

    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    pub fn into_transitions(self) -> Vec<TransitionRecord> {
        self.transitions
    }
}
