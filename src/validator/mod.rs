//! Roster validation.
//!
//! Two independent checks read the same immutable roster snapshot:
//!
//! - [`compliance`]: hard regulatory and coverage rules (PASS / FAIL)
//! - [`fairness`]: workload distribution and burnout risk (APPROVED / REJECTED)
//!
//! [`ParallelValidator`] runs them on scoped threads and merges the results
//! with compliance issues first. Neither check mutates shared state, so the
//! merged report is the same whether they run in parallel or in sequence.

pub mod compliance;
pub mod fairness;
mod metrics;
mod report;

pub use metrics::{NurseWorkload, RosterMetrics};
pub use report::{
    CheckKind, ComplianceStatus, FairnessStatus, Issue, IssueCategory, ValidationReport,
};

use std::thread;

use tracing::debug;

use crate::error::RosterError;
use crate::models::Roster;
use crate::problem::RosterProblem;

/// Produces a validation report for a roster.
pub trait RosterValidator {
    /// Validates `roster` against `problem`'s rules.
    ///
    /// # Errors
    /// [`RosterError::ValidationParse`] if no well-formed report could be
    /// produced.
    fn validate(
        &self,
        problem: &RosterProblem,
        roster: &Roster,
    ) -> Result<ValidationReport, RosterError>;
}

/// Runs the compliance and fairness checks concurrently.
#[derive(Debug, Clone)]
pub struct ParallelValidator {
    parallel: bool,
}

impl Default for ParallelValidator {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl ParallelValidator {
    /// Creates a validator. With `parallel = false` the checks run in
    /// sequence on the calling thread.
    pub fn new(parallel: bool) -> Self {
        Self { parallel }
    }
}

fn fairness_pass(problem: &RosterProblem, roster: &Roster) -> (RosterMetrics, Vec<Issue>) {
    let metrics = RosterMetrics::calculate(problem, roster);
    let issues = fairness::check(&problem.rules.fairness, &metrics);
    (metrics, issues)
}

impl RosterValidator for ParallelValidator {
    fn validate(
        &self,
        problem: &RosterProblem,
        roster: &Roster,
    ) -> Result<ValidationReport, RosterError> {
        let (compliance_issues, (metrics, fairness_issues)) = if self.parallel {
            thread::scope(|scope| {
                let compliance = scope.spawn(|| compliance::check(problem, roster));
                let fairness = scope.spawn(|| fairness_pass(problem, roster));
                let compliance = compliance.join().map_err(|_| {
                    RosterError::ValidationParse("compliance check panicked".into())
                })?;
                let fairness = fairness.join().map_err(|_| {
                    RosterError::ValidationParse("fairness check panicked".into())
                })?;
                Ok::<_, RosterError>((compliance, fairness))
            })?
        } else {
            (
                compliance::check(problem, roster),
                fairness_pass(problem, roster),
            )
        };

        let report =
            ValidationReport::merge(roster.id.clone(), compliance_issues, fairness_issues, metrics);
        report.ensure_well_formed()?;

        debug!(
            roster_id = %report.roster_id,
            compliance = ?report.compliance,
            fairness = ?report.fairness,
            issues = report.issue_count(),
            empathy = report.metrics.empathy_score,
            "roster validated"
        );
        Ok(report)
    }
}
