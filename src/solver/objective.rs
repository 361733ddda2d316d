//! Weighted soft-constraint objective.
//!
//! Cost splits into a per-assignment part (fatigue bands, night and weekend
//! load for fatigued nurses, preferences) and a per-nurse balance part
//! (distance from the fair share of shifts, weekends and nights).
//!
//! | Term | Applies when | Unit |
//! |------|--------------|------|
//! | fatigue_high | f >= high band | per shift |
//! | fatigue_moderate | moderate <= f < high | per shift |
//! | fatigue_weekend | f >= moderate, weekend shift | per shift |
//! | fatigue_night | f >= moderate, night shift | per shift |
//! | avoid_night | nurse avoids nights, night shift | per shift |
//! | preferred_day | shift on a preferred weekday | per shift (bonus) |
//! | overwork | n > fair | per extra shift |
//! | underutilization | n < fair | per missing shift |
//! | weekend_excess | w > fair_w | per extra weekend shift |
//! | night_excess | k > fair_k, nurse accepts nights | per extra night shift |
//!
//! `fair = floor(slots / nurses)`, `fair_w = max(1, floor(weekend slots /
//! nurses))`, `fair_k = max(1, floor(night slots / nurses accepting nights))`.

use crate::config::FatigueBands;
use crate::models::{PenaltyConfig, PenaltyKey};

use super::model::{AssignmentState, RosterModel};

/// Per-nurse workload counts the balance terms depend on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Load {
    pub shifts: u32,
    pub weekends: u32,
    pub nights: u32,
}

/// Objective evaluator for one model and one penalty configuration.
#[derive(Debug)]
pub struct Objective {
    /// Cost of each (shift, nurse) assignment, excluding balance terms.
    unit: Vec<Vec<f64>>,
    avoids_night: Vec<bool>,
    fair: u32,
    fair_weekend: u32,
    fair_night: u32,
    w_over: f64,
    w_under: f64,
    w_weekend: f64,
    w_night: f64,
}

impl Objective {
    /// Builds the evaluator.
    pub fn new(model: &RosterModel<'_>, penalties: &PenaltyConfig) -> Self {
        let bands = model.problem.rules.fatigue;
        let num_nurses = model.num_nurses().max(1) as u32;

        let mut slots = 0u32;
        let mut weekend_slots = 0u32;
        let mut night_slots = 0u32;
        for (s, shift) in model.shifts.iter().enumerate() {
            slots += shift.headcount;
            if model.is_weekend[s] {
                weekend_slots += shift.headcount;
            }
            if model.is_night[s] {
                night_slots += shift.headcount;
            }
        }
        let avoids_night: Vec<bool> = model
            .nurses
            .iter()
            .map(|n| n.preferences.avoid_night)
            .collect();
        let night_takers = avoids_night.iter().filter(|&&a| !a).count().max(1) as u32;

        let unit = (0..model.num_shifts())
            .map(|s| {
                (0..model.num_nurses())
                    .map(|n| assignment_cost(model, &bands, penalties, n, s))
                    .collect()
            })
            .collect();

        Self {
            unit,
            avoids_night,
            fair: slots / num_nurses,
            fair_weekend: (weekend_slots / num_nurses).max(1),
            fair_night: (night_slots / night_takers).max(1),
            w_over: penalties.weight(PenaltyKey::Overwork),
            w_under: penalties.weight(PenaltyKey::Underutilization),
            w_weekend: penalties.weight(PenaltyKey::WeekendExcess),
            w_night: penalties.weight(PenaltyKey::NightExcess),
        }
    }

    /// Fair share of shifts per nurse.
    pub fn fair_share(&self) -> u32 {
        self.fair
    }

    /// Per-assignment cost of nurse `n` on shift `s`.
    pub fn unit_cost(&self, n: usize, s: usize) -> f64 {
        self.unit[s][n]
    }

    pub(crate) fn balance(&self, n: usize, load: Load) -> f64 {
        let mut cost = 0.0;
        cost += self.w_over * f64::from(load.shifts.saturating_sub(self.fair));
        cost += self.w_under * f64::from(self.fair.saturating_sub(load.shifts));
        cost += self.w_weekend * f64::from(load.weekends.saturating_sub(self.fair_weekend));
        if !self.avoids_night[n] {
            cost += self.w_night * f64::from(load.nights.saturating_sub(self.fair_night));
        }
        cost
    }

    pub(crate) fn load(model: &RosterModel<'_>, state: &AssignmentState, n: usize) -> Load {
        let mut load = Load::default();
        for &s in &state.by_nurse[n] {
            load.shifts += 1;
            load.weekends += u32::from(model.is_weekend[s]);
            load.nights += u32::from(model.is_night[s]);
        }
        load
    }

    /// Cost change of adding shift `s` to nurse `n`.
    pub fn marginal(
        &self,
        model: &RosterModel<'_>,
        state: &AssignmentState,
        n: usize,
        s: usize,
    ) -> f64 {
        let before = Self::load(model, state, n);
        let after = Load {
            shifts: before.shifts + 1,
            weekends: before.weekends + u32::from(model.is_weekend[s]),
            nights: before.nights + u32::from(model.is_night[s]),
        };
        self.unit[s][n] + self.balance(n, after) - self.balance(n, before)
    }

    /// Total cost of a (partial or complete) assignment.
    pub fn total(&self, model: &RosterModel<'_>, state: &AssignmentState) -> f64 {
        let units: f64 = state.pairs().map(|(n, s)| self.unit[s][n]).sum();
        let balance: f64 = (0..model.num_nurses())
            .map(|n| self.balance(n, Self::load(model, state, n)))
            .sum();
        units + balance
    }
}

fn assignment_cost(
    model: &RosterModel<'_>,
    bands: &FatigueBands,
    penalties: &PenaltyConfig,
    n: usize,
    s: usize,
) -> f64 {
    let nurse = model.nurses[n];
    let f = model.fatigue[n];
    let mut cost = 0.0;

    if f >= bands.high {
        cost += penalties.weight(PenaltyKey::FatigueHigh);
    } else if f >= bands.moderate {
        cost += penalties.weight(PenaltyKey::FatigueModerate);
    }
    if f >= bands.moderate {
        if model.is_weekend[s] {
            cost += penalties.weight(PenaltyKey::FatigueWeekend);
        }
        if model.is_night[s] {
            cost += penalties.weight(PenaltyKey::FatigueNight);
        }
    }
    if nurse.preferences.avoid_night && model.is_night[s] {
        cost += penalties.weight(PenaltyKey::AvoidNight);
    }
    if nurse.prefers_day(model.shifts[s].weekday()) {
        cost -= penalties.weight(PenaltyKey::PreferredDay);
    }
    cost
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ContractType, Nurse, NurseStats, SchedulingPeriod, SeniorityLevel, Shift, StatsSnapshot,
    };
    use crate::problem::RosterProblem;
    use chrono::{NaiveDate, NaiveDateTime, Weekday};

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn problem() -> RosterProblem {
        let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        RosterProblem::new("p", SchedulingPeriod::from_days(start, 7))
            // fatigue: streak 3 -> 0.30, weekends 4 -> 0.25 => 0.55 (moderate)
            .with_nurse(Nurse::new("A", SeniorityLevel::Mid, ContractType::FullTime))
            .with_nurse(
                Nurse::new("B", SeniorityLevel::Mid, ContractType::FullTime)
                    .avoiding_nights()
                    .with_preferred_day(Weekday::Mon),
            )
            .with_shift(Shift::new("mon-day", "Gen", at(6, 8), at(6, 16)))
            .with_shift(Shift::new("mon-night", "Gen", at(6, 20), at(7, 4)))
            .with_stats(StatsSnapshot::new().with(
                NurseStats::new("A")
                    .with_streak(3, NaiveDate::from_ymd_opt(2025, 1, 2).unwrap())
                    .with_weekends(4),
            ))
    }

    #[test]
    fn test_unit_costs() {
        let p = problem();
        let m = RosterModel::new(&p);
        let o = Objective::new(&m, &PenaltyConfig::base());

        // A: moderate band
        assert!((o.unit_cost(0, 0) - 25.0).abs() < 1e-10);
        // A on a night: moderate + fatigue_night
        assert!((o.unit_cost(0, 1) - 55.0).abs() < 1e-10);
        // B prefers Monday
        assert!((o.unit_cost(1, 0) + 5.0).abs() < 1e-10);
        // B avoids nights, still prefers Monday
        assert!((o.unit_cost(1, 1) - 45.0).abs() < 1e-10);
    }

    #[test]
    fn test_balance_terms() {
        let p = problem();
        let m = RosterModel::new(&p);
        let o = Objective::new(&m, &PenaltyConfig::base());
        assert_eq!(o.fair_share(), 1);

        let mut st = AssignmentState::new(&m);
        // empty roster: both nurses one shift under their share
        assert!((o.total(&m, &st) - 30.0).abs() < 1e-10);

        // A takes the day shift: cost 25, B still under by one
        let delta = o.marginal(&m, &st, 0, 0);
        assert!((delta - (25.0 - 15.0)).abs() < 1e-10);
        st.assign(&m, 0, 0);
        assert!((o.total(&m, &st) - 40.0).abs() < 1e-10);
    }

    #[test]
    fn test_zero_weights_are_free() {
        let p = problem();
        let m = RosterModel::new(&p);
        let o = Objective::new(&m, &PenaltyConfig::empty());
        let mut st = AssignmentState::new(&m);
        st.assign(&m, 0, 0);
        st.assign(&m, 1, 1);
        assert!(o.total(&m, &st).abs() < 1e-10);
    }
}
