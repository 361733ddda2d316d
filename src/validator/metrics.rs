//! Roster quality metrics.
//!
//! Computes per-nurse workload and roster-wide distribution indicators from
//! a roster and its problem.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Mean / variance of shifts, nights, weekends | Population statistics over all nurses |
//! | Preference rate | 1 - preference violations / preference checks |
//! | Projected fatigue | Fatigue formula on stats plus this roster's nights, weekends and run |
//! | Burnout count | Working nurses with projected fatigue at or above the burnout threshold |
//! | Empathy score | 1 - preference deduction - spread deduction - burnout deduction |
//!
//! Each assignment is checked once per stated preference: a night shift for
//! a nurse avoiding nights, and a day outside a non-empty preferred-day list.
//!
//! The empathy score deducts 0.02 per preference violation (max 0.3), 0.1
//! for a shift spread above 2 or 0.2 above 3, and 0.05 per burnout risk
//! (max 0.3). It is rounded to two decimals and floored at 0.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{fatigue_from_counts, longest_run, Roster};
use crate::problem::RosterProblem;

/// Workload of one nurse in one roster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NurseWorkload {
    pub nurse_id: String,
    pub shifts: u32,
    pub nights: u32,
    pub weekends: u32,
    pub hours: f64,
    /// Night shifts for a nurse avoiding nights plus shifts on non-preferred days.
    pub preference_violations: u32,
    /// Longest consecutive run, including any carried streak.
    pub longest_run: u32,
    /// Fatigue after working this roster.
    pub projected_fatigue: f64,
}

/// Roster-wide distribution and satisfaction indicators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RosterMetrics {
    /// Per-nurse workload in nurse-id order.
    pub workloads: Vec<NurseWorkload>,
    pub mean_shifts: f64,
    pub shift_variance: f64,
    pub mean_nights: f64,
    pub night_variance: f64,
    pub mean_weekends: f64,
    pub weekend_variance: f64,
    /// Fraction of preference-relevant assignments that honor preferences.
    pub preference_rate: f64,
    /// Max minus min shift count.
    pub shift_spread: u32,
    pub burnout_count: u32,
    pub empathy_score: f64,
}

impl RosterMetrics {
    /// Computes metrics for a roster.
    ///
    /// Assignments referencing unknown nurses or shifts are skipped; the
    /// compliance check reports them.
    pub fn calculate(problem: &RosterProblem, roster: &Roster) -> Self {
        let shifts = problem.shift_index();
        let rules = &problem.rules;

        let mut nurses: Vec<_> = problem.nurses.iter().collect();
        nurses.sort_by(|a, b| a.id.cmp(&b.id));

        let mut workloads = Vec::with_capacity(nurses.len());
        let mut relevant = 0u32;
        let mut violations = 0u32;
        let mut burnout_count = 0u32;

        for nurse in nurses {
            let mut own: Vec<_> = roster
                .shifts_for_nurse(&nurse.id)
                .into_iter()
                .filter_map(|id| shifts.get(id).copied())
                .collect();
            own.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));

            let mut w = NurseWorkload {
                nurse_id: nurse.id.clone(),
                ..NurseWorkload::default()
            };
            for s in &own {
                let night = s.is_night(&rules.night);
                w.shifts += 1;
                w.nights += u32::from(night);
                w.weekends += u32::from(s.is_weekend());
                w.hours += s.duration_hours();
                if nurse.preferences.avoid_night {
                    relevant += 1;
                    w.preference_violations += u32::from(night);
                }
                if !nurse.preferences.preferred_days.is_empty() {
                    relevant += 1;
                    w.preference_violations += u32::from(!nurse.prefers_day(s.weekday()));
                }
            }
            violations += w.preference_violations;

            let stats = problem.stats.get(&nurse.id);
            let dates: Vec<NaiveDate> = own.iter().map(|s| s.date()).collect();
            w.longest_run = longest_run(&dates, stats.and_then(|st| st.streak_carry()));
            w.projected_fatigue = fatigue_from_counts(
                w.longest_run,
                stats.map_or(0, |st| st.weekend_shifts_30d) + w.weekends,
                stats.map_or(0, |st| st.night_shifts_30d) + w.nights,
                stats.map_or(1.0, |st| st.preferences_honored_rate),
            );
            if w.shifts > 0 && w.projected_fatigue >= rules.fairness.burnout_fatigue {
                burnout_count += 1;
            }
            workloads.push(w);
        }

        let (mean_shifts, shift_variance) = mean_variance(workloads.iter().map(|w| w.shifts));
        let (mean_nights, night_variance) = mean_variance(workloads.iter().map(|w| w.nights));
        let (mean_weekends, weekend_variance) =
            mean_variance(workloads.iter().map(|w| w.weekends));

        let preference_rate = if relevant == 0 {
            1.0
        } else {
            1.0 - f64::from(violations) / f64::from(relevant)
        };
        let shift_spread = match (
            workloads.iter().map(|w| w.shifts).max(),
            workloads.iter().map(|w| w.shifts).min(),
        ) {
            (Some(max), Some(min)) => max - min,
            _ => 0,
        };

        let spread_deduction = if shift_spread > 3 {
            0.2
        } else if shift_spread > 2 {
            0.1
        } else {
            0.0
        };
        let raw = 1.0
            - (0.02 * f64::from(violations)).min(0.3)
            - spread_deduction
            - (0.05 * f64::from(burnout_count)).min(0.3);
        let empathy_score = ((raw * 100.0).round() / 100.0).max(0.0);

        Self {
            workloads,
            mean_shifts,
            shift_variance,
            mean_nights,
            night_variance,
            mean_weekends,
            weekend_variance,
            preference_rate,
            shift_spread,
            burnout_count,
            empathy_score,
        }
    }

    /// Workload of one nurse.
    pub fn workload(&self, nurse_id: &str) -> Option<&NurseWorkload> {
        self.workloads.iter().find(|w| w.nurse_id == nurse_id)
    }
}

/// Population mean and variance.
fn mean_variance(values: impl Iterator<Item = u32>) -> (f64, f64) {
    let values: Vec<f64> = values.map(f64::from).collect();
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ContractType, Nurse, NurseStats, SchedulingPeriod, SeniorityLevel, Shift, StatsSnapshot,
    };
    use chrono::NaiveDateTime;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn problem() -> RosterProblem {
        let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        RosterProblem::new("p", SchedulingPeriod::from_days(start, 7))
            .with_nurse(
                Nurse::new("A", SeniorityLevel::Mid, ContractType::FullTime).avoiding_nights(),
            )
            .with_nurse(Nurse::new("B", SeniorityLevel::Mid, ContractType::FullTime))
            .with_shift(Shift::new("mon-night", "Gen", at(6, 20), at(7, 4)))
            .with_shift(Shift::new("tue-day", "Gen", at(7, 8), at(7, 16)))
            .with_shift(Shift::new("sat-day", "Gen", at(11, 8), at(11, 16)))
            .with_stats(
                StatsSnapshot::new().with(NurseStats::new("B").with_nights(7).with_weekends(3)),
            )
    }

    #[test]
    fn test_workloads_and_distribution() {
        let p = problem();
        let roster = Roster::new("r", p.period)
            .with_assignment("A", "mon-night")
            .with_assignment("A", "tue-day")
            .with_assignment("B", "sat-day");
        let m = RosterMetrics::calculate(&p, &roster);

        let a = m.workload("A").unwrap();
        assert_eq!(a.shifts, 2);
        assert_eq!(a.nights, 1);
        assert_eq!(a.preference_violations, 1);
        assert_eq!(a.longest_run, 2);
        assert!((a.hours - 16.0).abs() < 1e-10);

        let b = m.workload("B").unwrap();
        assert_eq!(b.weekends, 1);
        // run 1 -> 0.1, weekends 4 -> 0.25, nights 7 -> 0.21875
        assert!((b.projected_fatigue - 0.57).abs() < 1e-10);

        assert!((m.mean_shifts - 1.5).abs() < 1e-10);
        assert!((m.shift_variance - 0.25).abs() < 1e-10);
        assert!((m.preference_rate - 0.5).abs() < 1e-10);
        assert_eq!(m.shift_spread, 1);
        assert_eq!(m.burnout_count, 0);
        assert!((m.empathy_score - 0.98).abs() < 1e-10);
    }

    #[test]
    fn test_non_preferred_days_count_as_violations() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let p = RosterProblem::new("p", SchedulingPeriod::from_days(start, 7))
            .with_nurse(
                Nurse::new("A", SeniorityLevel::Mid, ContractType::FullTime)
                    .with_preferred_day(chrono::Weekday::Mon),
            )
            .with_shift(Shift::new("mon-day", "Gen", at(6, 8), at(6, 16)))
            .with_shift(Shift::new("tue-day", "Gen", at(7, 8), at(7, 16)))
            .with_shift(Shift::new("wed-day", "Gen", at(8, 8), at(8, 16)));

        let off_days = Roster::new("r", p.period)
            .with_assignment("A", "tue-day")
            .with_assignment("A", "wed-day");
        let m = RosterMetrics::calculate(&p, &off_days);
        assert_eq!(m.workload("A").unwrap().preference_violations, 2);
        assert!((m.preference_rate - 0.0).abs() < 1e-10);
        assert!((m.empathy_score - 0.96).abs() < 1e-10);

        let mixed = Roster::new("r", p.period)
            .with_assignment("A", "mon-day")
            .with_assignment("A", "tue-day");
        let m = RosterMetrics::calculate(&p, &mixed);
        assert_eq!(m.workload("A").unwrap().preference_violations, 1);
        assert!((m.preference_rate - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_empty_roster() {
        let p = problem();
        let m = RosterMetrics::calculate(&p, &Roster::new("r", p.period));
        assert!((m.preference_rate - 1.0).abs() < 1e-10);
        assert!((m.mean_shifts - 0.0).abs() < 1e-10);
        assert!((m.empathy_score - 1.0).abs() < 1e-10);
        assert_eq!(m.workloads.len(), 2);
    }
}
