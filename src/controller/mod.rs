//! Generate → validate → analyze refinement loop.
//!
//! [`LoopController`] drives a [`RosterSolver`] and a [`RosterValidator`]
//! through the [`LoopState`] machine until a roster passes, the iteration
//! cap is reached, the model proves infeasible, or the caller cancels.
//!
//! # Termination
//!
//! | Status | Roster | Outstanding issues |
//! |--------|--------|--------------------|
//! | `PASS` | the passing roster | none |
//! | `FAIL_MAX_ITERATIONS` | fewest issues, latest on ties | that roster's issues |
//! | `INFEASIBLE` | none | none; see `infeasibility` |
//! | `CANCELLED` | last completed iteration's, if any | that roster's issues |
//!
//! Cancellation is checked only between iterations. A solver timeout is
//! retried `timeout_retries` times within the iteration, then surfaces as
//! [`RosterError::SolverTimeout`]. A malformed report aborts the loop with
//! [`RosterError::ValidationParse`]. Either error raised after an iteration
//! has completed is wrapped in [`RosterError::Interrupted`] together with
//! the completed iterations.
//!
//! # Example
//!
//! ```no_run
//! use u_roster::config::LoopConfig;
//! use u_roster::controller::LoopController;
//! use u_roster::models::PenaltyConfig;
//! # fn problem() -> u_roster::problem::RosterProblem { unimplemented!() }
//!
//! let controller = LoopController::new(LoopConfig::default());
//! let result = controller.run(&problem(), PenaltyConfig::base()).unwrap();
//! println!("{:?} after {} iteration(s)", result.status, result.iteration_count);
//! ```

mod state;

pub use state::{IllegalTransition, LoopState, StateMachine, TransitionRecord};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::LoopConfig;
use crate::error::{Infeasibility, RosterError, SolveError};
use crate::feedback::{FeedbackAnalyzer, FeedbackState};
use crate::models::{PenaltyConfig, Roster};
use crate::problem::RosterProblem;
use crate::solver::{ConstraintSolver, RosterSolver};
use crate::validator::{Issue, ParallelValidator, RosterValidator, ValidationReport};

/// Cooperative cancellation flag shared with the caller.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Takes effect at the next iteration boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Terminal status of a loop run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoopStatus {
    Pass,
    FailMaxIterations,
    Infeasible,
    Cancelled,
}

/// One completed iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: u32,
    pub roster: Roster,
    pub report: ValidationReport,
    /// Weights the roster was generated under.
    pub penalties: PenaltyConfig,
    /// Analysis of the report; `None` when the iteration ended the loop.
    pub feedback: Option<FeedbackState>,
}

/// Outcome of a loop run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalRosterResult {
    /// Selected roster; `None` when infeasible or cancelled before the first
    /// iteration completed.
    pub roster: Option<Roster>,
    pub status: LoopStatus,
    /// Iterations entered.
    pub iteration_count: u32,
    pub history: Vec<IterationRecord>,
    /// Issues the selected roster still carries.
    pub outstanding_issues: Vec<Issue>,
    /// Why the model is infeasible, for `INFEASIBLE`.
    pub infeasibility: Option<Infeasibility>,
    /// Iteration the selected roster came from.
    pub best_iteration: Option<u32>,
    pub transitions: Vec<TransitionRecord>,
}

impl FinalRosterResult {
    /// Whether a roster passed both checks.
    pub fn is_success(&self) -> bool {
        self.status == LoopStatus::Pass
    }

    /// Number of outstanding issues.
    pub fn total_issues(&self) -> usize {
        self.outstanding_issues.len()
    }

    /// The selected roster, whatever the status.
    ///
    /// # Errors
    /// [`RosterError::InfeasibleModel`] for an infeasible model,
    /// [`RosterError::Cancelled`] when no iteration completed.
    pub fn into_roster(self) -> Result<Roster, RosterError> {
        match (self.roster, self.infeasibility) {
            (Some(roster), _) => Ok(roster),
            (None, Some(infeasibility)) => Err(RosterError::InfeasibleModel(infeasibility)),
            (None, None) => Err(RosterError::Cancelled),
        }
    }
}

/// Drives the refinement loop.
pub struct LoopController<S = ConstraintSolver, V = ParallelValidator> {
    config: LoopConfig,
    solver: S,
    validator: V,
    cancel: CancellationToken,
}

impl LoopController {
    /// Creates a controller with the built-in solver and validator.
    pub fn new(config: LoopConfig) -> Self {
        let solver = ConstraintSolver::new(config.solver);
        let validator = ParallelValidator::new(config.parallel_validation);
        Self::with_components(config, solver, validator)
    }
}

impl<S: RosterSolver, V: RosterValidator> LoopController<S, V> {
    /// Creates a controller around the given solver and validator.
    pub fn with_components(config: LoopConfig, solver: S, validator: V) -> Self {
        Self {
            config,
            solver,
            validator,
            cancel: CancellationToken::new(),
        }
    }

    /// Uses an existing cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels this controller's runs.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Runs the loop on a frozen problem, starting from `initial` weights.
    ///
    /// `initial` is also the base the analyzer decays toward.
    ///
    /// # Errors
    /// - [`RosterError::Config`] / [`RosterError::InvalidInput`] before the
    ///   first iteration
    /// - [`RosterError::SolverTimeout`] when every attempt timed out
    /// - [`RosterError::ValidationParse`] on a malformed report
    /// - [`RosterError::Interrupted`] wrapping either of the above when at
    ///   least one iteration had already completed
    pub fn run(
        &self,
        problem: &RosterProblem,
        initial: PenaltyConfig,
    ) -> Result<FinalRosterResult, RosterError> {
        self.config.validate()?;
        problem.rules.validate()?;
        problem.validate().map_err(RosterError::InvalidInput)?;

        info!(
            problem = %problem.id,
            nurses = problem.nurses.len(),
            shifts = problem.shifts.len(),
            max_iterations = self.config.max_iterations,
            "refinement loop started"
        );

        let mut history: Vec<IterationRecord> = Vec::new();
        match self.drive(problem, initial, &mut history) {
            Err(cause) if !history.is_empty() => {
                warn!(
                    problem = %problem.id,
                    completed = history.len(),
                    %cause,
                    "loop interrupted"
                );
                Err(RosterError::Interrupted {
                    completed: history,
                    cause: Box::new(cause),
                })
            }
            outcome => outcome,
        }
    }

    /// Iterates until a terminal state. Completed iterations accumulate in
    /// `history`, which is moved into the result on success.
    fn drive(
        &self,
        problem: &RosterProblem,
        initial: PenaltyConfig,
        history: &mut Vec<IterationRecord>,
    ) -> Result<FinalRosterResult, RosterError> {
        let analyzer = FeedbackAnalyzer::new(self.config.feedback, initial.clone());
        let mut sm = StateMachine::new();
        let mut penalties = initial;

        loop {
            let iteration = sm.iteration();

            if self.cancel.is_cancelled() {
                sm.advance(LoopState::Cancelled, Some("cancellation requested"))?;
                return Ok(finish_cancelled(std::mem::take(history), sm));
            }

            let mut roster = match self.generate(problem, &penalties, iteration) {
                Ok(roster) => roster,
                Err(SolveError::Infeasible(infeasibility)) => {
                    let reason = infeasibility.to_string();
                    sm.advance(LoopState::Infeasible, Some(reason.as_str()))?;
                    info!(
                        problem = %problem.id,
                        iteration,
                        %infeasibility,
                        "loop ended: infeasible"
                    );
                    return Ok(FinalRosterResult {
                        roster: None,
                        status: LoopStatus::Infeasible,
                        iteration_count: iteration,
                        history: std::mem::take(history),
                        outstanding_issues: Vec::new(),
                        infeasibility: Some(infeasibility),
                        best_iteration: None,
                        transitions: sm.into_transitions(),
                    });
                }
                Err(SolveError::Timeout { budget_ms }) => {
                    let attempts = self.config.timeout_retries + 1;
                    warn!(
                        problem = %problem.id,
                        iteration,
                        attempts,
                        "solver timed out on every attempt"
                    );
                    return Err(RosterError::SolverTimeout { budget_ms, attempts });
                }
            };
            roster.id = format!("{}-{iteration}", problem.id);
            sm.advance(LoopState::Validating, None)?;

            let report = self.validator.validate(problem, &roster)?;
            report.ensure_well_formed()?;
            if report.roster_id != roster.id {
                return Err(RosterError::ValidationParse(format!(
                    "report for roster '{}' returned while validating '{}'",
                    report.roster_id, roster.id
                )));
            }
            info!(
                roster_id = %roster.id,
                iteration,
                issues = report.issue_count(),
                compliance = ?report.compliance,
                fairness = ?report.fairness,
                "iteration validated"
            );

            if report.is_pass() {
                sm.advance(LoopState::Passed, None)?;
                info!(roster_id = %roster.id, iteration, "loop ended: pass");
                history.push(IterationRecord {
                    iteration,
                    roster: roster.clone(),
                    report,
                    penalties,
                    feedback: None,
                });
                return Ok(FinalRosterResult {
                    roster: Some(roster),
                    status: LoopStatus::Pass,
                    iteration_count: iteration,
                    history: std::mem::take(history),
                    outstanding_issues: Vec::new(),
                    infeasibility: None,
                    best_iteration: Some(iteration),
                    transitions: sm.into_transitions(),
                });
            }

            if iteration >= self.config.max_iterations {
                let reason = format!("{} issue(s) at the iteration cap", report.issue_count());
                sm.advance(LoopState::MaxIterationsReached, Some(reason.as_str()))?;
                history.push(IterationRecord {
                    iteration,
                    roster,
                    report,
                    penalties,
                    feedback: None,
                });
                return Ok(finish_max_iterations(std::mem::take(history), sm, iteration));
            }

            let reason = format!("{} issue(s)", report.issue_count());
            sm.advance(LoopState::Analyzing, Some(reason.as_str()))?;
            let feedback = analyzer.analyze(iteration, &report, &penalties);
            info!(
                iteration,
                escalated = ?feedback.escalated,
                unclassified = feedback.unclassified.len(),
                "penalties adjusted"
            );
            let next = feedback.penalties.clone();
            history.push(IterationRecord {
                iteration,
                roster,
                report,
                penalties,
                feedback: Some(feedback),
            });
            penalties = next;
            sm.advance(LoopState::Generating, None)?;
        }
    }

    /// Solves once, retrying timeouts up to the configured count.
    fn generate(
        &self,
        problem: &RosterProblem,
        penalties: &PenaltyConfig,
        iteration: u32,
    ) -> Result<Roster, SolveError> {
        let attempts = self.config.timeout_retries + 1;
        let mut attempt = 1;
        loop {
            match self.solver.solve(problem, penalties) {
                Err(err) if err.is_retriable() && attempt < attempts => {
                    warn!(iteration, attempt, %err, "solve attempt timed out; retrying");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

fn finish_cancelled(history: Vec<IterationRecord>, sm: StateMachine) -> FinalRosterResult {
    let last = history.last();
    let roster = last.map(|r| r.roster.clone());
    let outstanding_issues = last.map(|r| r.report.issues.clone()).unwrap_or_default();
    let best_iteration = last.map(|r| r.iteration);
    let iteration_count = history.len() as u32;
    info!(completed = iteration_count, "loop ended: cancelled");

    FinalRosterResult {
        roster,
        status: LoopStatus::Cancelled,
        iteration_count,
        history,
        outstanding_issues,
        infeasibility: None,
        best_iteration,
        transitions: sm.into_transitions(),
    }
}

fn finish_max_iterations(
    history: Vec<IterationRecord>,
    sm: StateMachine,
    iteration: u32,
) -> FinalRosterResult {
    // `<=` keeps the latest iteration on ties
    let mut best: Option<&IterationRecord> = None;
    for record in &history {
        if best.map_or(true, |b| record.report.issue_count() <= b.report.issue_count()) {
            best = Some(record);
        }
    }
    let roster = best.map(|r| r.roster.clone());
    let outstanding_issues = best.map(|r| r.report.issues.clone()).unwrap_or_default();
    let best_iteration = best.map(|r| r.iteration);
    info!(
        iteration,
        best_iteration,
        outstanding = outstanding_issues.len(),
        "loop ended: iteration cap reached"
    );

    FinalRosterResult {
        roster,
        status: LoopStatus::FailMaxIterations,
        iteration_count: iteration,
        history,
        outstanding_issues,
        infeasibility: None,
        best_iteration,
        transitions: sm.into_transitions(),
    }
}
