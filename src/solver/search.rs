//! Feasibility search and local improvement.
//!
//! # Algorithm
//!
//! 1. **Depth-first search** over nurse slots (one per unit of headcount) in
//!    chronological shift order. Candidates are ordered by marginal cost,
//!    ties by nurse index. Slots of the same shift take nurses in increasing
//!    index order, so each nurse set is tried once. When the last slot of a
//!    start-time group is reached without a senior, only seniors are tried.
//! 2. **Reassign sweeps**: each assignment is moved to the cheapest other
//!    feasible nurse while that lowers the total cost.
//! 3. **Random swaps**: two assignments exchange nurses when both moves stay
//!    feasible and the cost drops. Driven by a seeded `StdRng`.
//!
//! Improvement only ever applies moves that keep every hard rule, so the
//! first solution's feasibility is preserved.
//!
//! # Reference
//! Burke et al. (2004), "The State of the Art of Nurse Rostering"

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::model::{AssignmentState, RosterModel};
use super::objective::Objective;

const EPS: f64 = 1e-9;

/// Result of the feasibility phase.
#[derive(Debug)]
pub(crate) enum SearchOutcome {
    /// Every slot filled.
    Found(AssignmentState),
    /// The search space holds no feasible roster.
    Exhausted,
    /// The node or time budget ran out first.
    OutOfBudget,
}

/// Node and wall-clock budget of the feasibility phase.
#[derive(Debug)]
pub(crate) struct Budget {
    deadline: Instant,
    max_nodes: u64,
    pub(crate) nodes: u64,
}

impl Budget {
    pub(crate) fn new(deadline: Instant, max_nodes: u64) -> Self {
        Self {
            deadline,
            max_nodes,
            nodes: 0,
        }
    }

    /// Counts one node. Returns `false` once the budget is spent.
    fn tick(&mut self) -> bool {
        self.nodes += 1;
        if self.nodes > self.max_nodes {
            return false;
        }
        self.nodes % 256 != 0 || Instant::now() < self.deadline
    }
}

enum Step {
    Found,
    Failed,
    Aborted,
}

/// Depth-first feasibility search.
pub(crate) struct Search<'m, 'a> {
    model: &'m RosterModel<'a>,
    objective: &'m Objective,
    slots: Vec<usize>,
    closes_group: Vec<bool>,
    state: AssignmentState,
}

impl<'m, 'a> Search<'m, 'a> {
    pub(crate) fn new(model: &'m RosterModel<'a>, objective: &'m Objective) -> Self {
        let slots: Vec<usize> = model
            .shifts
            .iter()
            .enumerate()
            .flat_map(|(s, shift)| std::iter::repeat(s).take(shift.headcount as usize))
            .collect();
        let closes_group = (0..slots.len())
            .map(|k| {
                slots
                    .get(k + 1)
                    .map_or(true, |&next| model.group[next] != model.group[slots[k]])
            })
            .collect();

        Self {
            model,
            objective,
            slots,
            closes_group,
            state: AssignmentState::new(model),
        }
    }

    /// Runs the search to the first feasible roster.
    pub(crate) fn run(mut self, budget: &mut Budget) -> SearchOutcome {
        match self.dfs(0, budget) {
            Step::Found => SearchOutcome::Found(self.state),
            Step::Failed => SearchOutcome::Exhausted,
            Step::Aborted => SearchOutcome::OutOfBudget,
        }
    }

    fn dfs(&mut self, k: usize, budget: &mut Budget) -> Step {
        let Some(&s) = self.slots.get(k) else {
            return Step::Found;
        };
        let model = self.model;
        let group = model.group[s];
        let closing = self.closes_group[k] && !self.state.group_satisfied(model, group);
        let first = self.state.by_shift[s].last().map_or(0, |&n| n + 1);

        let mut candidates: Vec<(f64, usize)> = (first..model.num_nurses())
            .filter(|&n| !closing || model.is_senior[n])
            .filter(|&n| self.state.can_assign(model, n, s))
            .map(|n| (self.objective.marginal(model, &self.state, n, s), n))
            .collect();
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        for (_, n) in candidates {
            if !budget.tick() {
                return Step::Aborted;
            }
            self.state.assign(model, n, s);
            match self.dfs(k + 1, budget) {
                Step::Found => return Step::Found,
                Step::Aborted => return Step::Aborted,
                Step::Failed => self.state.unassign(model, n, s),
            }
        }
        Step::Failed
    }
}

/// Improvement settings.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ImproveParams {
    pub passes: u32,
    pub swap_attempts: u32,
    pub seed: u64,
}

/// Improves a feasible state in place. Returns the final cost.
///
/// Bounded by pass and swap counts only, never by the clock.
pub(crate) fn improve(
    model: &RosterModel<'_>,
    objective: &Objective,
    state: &mut AssignmentState,
    params: ImproveParams,
) -> f64 {
    let mut cost = objective.total(model, state);

    for _ in 0..params.passes {
        let mut improved = false;
        let pairs: Vec<(usize, usize)> = state.pairs().collect();
        for (n, s) in pairs {
            if !state.is_assigned(n, s) {
                continue;
            }
            state.unassign(model, n, s);
            let mut best: Option<(f64, usize)> = None;
            for m in 0..model.num_nurses() {
                if m == n || !state.can_assign(model, m, s) {
                    continue;
                }
                state.assign(model, m, s);
                if state.group_satisfied(model, model.group[s]) {
                    let c = objective.total(model, state);
                    if c < cost - EPS && best.map_or(true, |(bc, _)| c < bc - EPS) {
                        best = Some((c, m));
                    }
                }
                state.unassign(model, m, s);
            }
            match best {
                Some((c, m)) => {
                    state.assign(model, m, s);
                    cost = c;
                    improved = true;
                }
                None => state.assign(model, n, s),
            }
        }
        if !improved {
            break;
        }
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    for _ in 0..params.swap_attempts {
        let pairs: Vec<(usize, usize)> = state.pairs().collect();
        if pairs.len() < 2 {
            break;
        }
        let (n1, s1) = pairs[rng.random_range(0..pairs.len())];
        let (n2, s2) = pairs[rng.random_range(0..pairs.len())];
        if n1 == n2 || s1 == s2 || state.is_assigned(n1, s2) || state.is_assigned(n2, s1) {
            continue;
        }

        state.unassign(model, n1, s1);
        state.unassign(model, n2, s2);
        let first = state.can_assign(model, n2, s1);
        if first {
            state.assign(model, n2, s1);
        }
        let second = first && state.can_assign(model, n1, s2);
        if second {
            state.assign(model, n1, s2);
        }

        let feasible = second
            && state.group_satisfied(model, model.group[s1])
            && state.group_satisfied(model, model.group[s2]);
        if feasible {
            let c = objective.total(model, state);
            if c < cost - EPS {
                cost = c;
                continue;
            }
        }

        if second {
            state.unassign(model, n1, s2);
        }
        if first {
            state.unassign(model, n2, s1);
        }
        state.assign(model, n1, s1);
        state.assign(model, n2, s2);
    }

    cost
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ContractType, Nurse, NurseStats, PenaltyConfig, SchedulingPeriod, SeniorityLevel, Shift,
        StatsSnapshot,
    };
    use crate::problem::RosterProblem;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::time::Duration;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn far_budget() -> Budget {
        Budget::new(Instant::now() + Duration::from_secs(30), 1_000_000)
    }

    #[test]
    fn test_senior_forced_into_group() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let p = RosterProblem::new("p", SchedulingPeriod::from_days(start, 7))
            .with_nurse(Nurse::new("A-junior", SeniorityLevel::Junior, ContractType::FullTime))
            .with_nurse(Nurse::new("Z-senior", SeniorityLevel::Senior, ContractType::FullTime))
            .with_shift(Shift::new("S1", "Gen", at(6, 8), at(6, 16)));
        let m = RosterModel::new(&p);
        let o = Objective::new(&m, &PenaltyConfig::base());

        let SearchOutcome::Found(st) = Search::new(&m, &o).run(&mut far_budget()) else {
            panic!("expected a roster");
        };
        assert_eq!(st.by_shift[0], vec![1]);
    }

    #[test]
    fn test_exhausts_when_rest_forbids_cover() {
        // one nurse, two back-to-back shifts
        let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let p = RosterProblem::new("p", SchedulingPeriod::from_days(start, 7))
            .with_nurse(Nurse::new("A", SeniorityLevel::Mid, ContractType::FullTime))
            .with_shift(Shift::new("S1", "Gen", at(6, 8), at(6, 16)))
            .with_shift(Shift::new("S2", "Gen", at(6, 16), at(7, 0)));
        let m = RosterModel::new(&p);
        assert!(m.preflight().is_ok());
        let o = Objective::new(&m, &PenaltyConfig::base());
        assert!(matches!(
            Search::new(&m, &o).run(&mut far_budget()),
            SearchOutcome::Exhausted
        ));
    }

    #[test]
    fn test_node_budget_aborts() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let p = RosterProblem::new("p", SchedulingPeriod::from_days(start, 7))
            .with_nurse(Nurse::new("A", SeniorityLevel::Mid, ContractType::FullTime))
            .with_nurse(Nurse::new("B", SeniorityLevel::Mid, ContractType::FullTime))
            .with_shift(Shift::new("S1", "Gen", at(6, 8), at(6, 16)))
            .with_shift(Shift::new("S2", "Gen", at(7, 8), at(7, 16)));
        let m = RosterModel::new(&p);
        let o = Objective::new(&m, &PenaltyConfig::base());
        let mut budget = Budget::new(Instant::now() + Duration::from_secs(30), 1);
        assert!(matches!(
            Search::new(&m, &o).run(&mut budget),
            SearchOutcome::OutOfBudget
        ));
    }

    fn week_problem() -> RosterProblem {
        let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let mut p = RosterProblem::new("p", SchedulingPeriod::from_days(start, 7))
            .with_nurse(Nurse::new("A", SeniorityLevel::Senior, ContractType::FullTime))
            .with_nurse(Nurse::new("B", SeniorityLevel::Senior, ContractType::FullTime))
            .with_nurse(Nurse::new("C", SeniorityLevel::Senior, ContractType::PartTime))
            .with_stats(
                StatsSnapshot::new().with(NurseStats::new("A").with_nights(8).with_weekends(4)),
            );
        for day in 6..=12 {
            p = p.with_shift(Shift::new(format!("d{day}"), "Gen", at(day, 8), at(day, 16)));
        }
        p
    }

    #[test]
    fn test_improvement_never_raises_cost() {
        let p = week_problem();
        let m = RosterModel::new(&p);
        let o = Objective::new(&m, &PenaltyConfig::base());
        let SearchOutcome::Found(mut st) = Search::new(&m, &o).run(&mut far_budget()) else {
            panic!("expected a roster");
        };
        let before = o.total(&m, &st);
        let params = ImproveParams {
            passes: 4,
            swap_attempts: 200,
            seed: 7,
        };
        let after = improve(&m, &o, &mut st, params);
        assert!(after <= before + 1e-9);
        assert!((after - o.total(&m, &st)).abs() < 1e-9);
        assert_eq!(st.pairs().count(), 7);
    }

    #[test]
    fn test_improvement_ignores_elapsed_time() {
        let p = week_problem();
        let m = RosterModel::new(&p);
        let o = Objective::new(&m, &PenaltyConfig::base());
        let SearchOutcome::Found(first) = Search::new(&m, &o).run(&mut far_budget()) else {
            panic!("expected a roster");
        };
        let params = ImproveParams {
            passes: 4,
            swap_attempts: 200,
            seed: 7,
        };

        let mut fast = first.clone();
        let fast_cost = improve(&m, &o, &mut fast, params);
        std::thread::sleep(Duration::from_millis(5));
        let mut slow = first;
        let slow_cost = improve(&m, &o, &mut slow, params);

        assert!((fast_cost - slow_cost).abs() < 1e-10);
        let mut fast_pairs: Vec<_> = fast.pairs().collect();
        let mut slow_pairs: Vec<_> = slow.pairs().collect();
        fast_pairs.sort_unstable();
        slow_pairs.sort_unstable();
        assert_eq!(fast_pairs, slow_pairs);
    }
}
