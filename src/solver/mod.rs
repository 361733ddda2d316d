//! Roster solver.
//!
//! [`RosterSolver`] is the seam the refinement loop calls once per iteration.
//! [`ConstraintSolver`] is the built-in implementation: a preflight coverage
//! check, a complete depth-first search for a feasible roster, and a bounded
//! local search that lowers the weighted objective without breaking any hard
//! rule.
//!
//! # Determinism
//! Shifts are ordered by (start, id), nurses by id, candidate ties by nurse
//! index, and the swap phase uses a fixed seed. The same problem, penalties
//! and config always yield the same roster. The clock only bounds the
//! feasibility search; improvement stops on pass and swap counts.
//!
//! # Failure Modes
//! - [`SolveError::Infeasible`]: preflight failed or the search space was
//!   exhausted. Penalty changes cannot fix it.
//! - [`SolveError::Timeout`]: the node or time budget ran out before any
//!   feasible roster was found. A retry may succeed.

mod model;
mod objective;
mod search;

pub use model::{AssignmentState, RosterModel};
pub use objective::Objective;

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::SolverConfig;
use crate::error::{Infeasibility, SolveError};
use crate::models::{Assignment, PenaltyConfig, Roster};
use crate::problem::RosterProblem;

use search::{improve, Budget, ImproveParams, Search, SearchOutcome};

/// Produces a roster satisfying every hard rule.
pub trait RosterSolver {
    /// Solves `problem` under `penalties`.
    ///
    /// The returned roster's id is the problem id; callers may rename it.
    fn solve(&self, problem: &RosterProblem, penalties: &PenaltyConfig)
        -> Result<Roster, SolveError>;
}

/// Backtracking search followed by local improvement.
#[derive(Debug, Clone, Default)]
pub struct ConstraintSolver {
    config: SolverConfig,
}

impl ConstraintSolver {
    /// Creates a solver with the given budget and search parameters.
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Solver parameters.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }
}

impl RosterSolver for ConstraintSolver {
    fn solve(
        &self,
        problem: &RosterProblem,
        penalties: &PenaltyConfig,
    ) -> Result<Roster, SolveError> {
        let started = Instant::now();
        let deadline = started + Duration::from_millis(self.config.timeout_ms);

        let model = RosterModel::new(problem);
        if let Err(infeasibility) = model.preflight() {
            warn!(problem = %problem.id, %infeasibility, "preflight rejected model");
            return Err(SolveError::Infeasible(infeasibility));
        }

        let objective = Objective::new(&model, penalties);
        let mut budget = Budget::new(deadline, self.config.max_nodes);

        let mut state = match Search::new(&model, &objective).run(&mut budget) {
            SearchOutcome::Found(state) => state,
            SearchOutcome::Exhausted => {
                warn!(problem = %problem.id, nodes = budget.nodes, "search space exhausted");
                return Err(SolveError::Infeasible(Infeasibility::global(
                    "no roster satisfies every hard rule",
                )));
            }
            SearchOutcome::OutOfBudget => {
                warn!(
                    problem = %problem.id,
                    nodes = budget.nodes,
                    budget_ms = self.config.timeout_ms,
                    "search budget exhausted before a feasible roster"
                );
                return Err(SolveError::Timeout {
                    budget_ms: self.config.timeout_ms,
                });
            }
        };
        let first_cost = objective.total(&model, &state);
        debug!(nodes = budget.nodes, cost = first_cost, "feasible roster found");

        let params = ImproveParams {
            passes: self.config.improvement_passes,
            swap_attempts: self.config.swap_attempts,
            seed: self.config.seed,
        };
        let cost = improve(&model, &objective, &mut state, params);

        let mut roster = Roster::new(problem.id.clone(), problem.period);
        for (s, nurses) in state.by_shift.iter().enumerate() {
            let mut nurses = nurses.clone();
            nurses.sort_unstable();
            for n in nurses {
                roster.add_assignment(Assignment::new(
                    model.nurses[n].id.clone(),
                    model.shifts[s].id.clone(),
                ));
            }
        }

        info!(
            problem = %problem.id,
            assignments = roster.assignment_count(),
            cost,
            improved_by = first_cost - cost,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "solve finished"
        );
        Ok(roster)
    }
}
