//! Fairness check: workload distribution and burnout risk.
//!
//! Works from [`RosterMetrics`] only. One issue per threshold breach; an
//! empty result means APPROVED.
//!
//! | Category | Breach |
//! |----------|--------|
//! | overwork | shifts > mean + max_shift_deviation |
//! | underutilization | shifts < mean - max_shift_deviation |
//! | fatigue_violation | working nurse with projected fatigue >= burnout_fatigue |
//! | night_concentration | nights > max_night_shifts |
//! | weekend_concentration | weekends > max_weekend_shifts |
//! | preference_violation | nurse with violations while preference rate < min_preference_rate |
//!
//! Roster-wide issues (no nurse) follow the per-nurse ones:
//!
//! | Category | Breach |
//! |----------|--------|
//! | overwork | shift_variance > max_shift_variance |
//! | night_concentration | night_variance > max_night_variance |
//! | weekend_concentration | weekend_variance > max_weekend_variance |

use super::metrics::RosterMetrics;
use super::report::{Issue, IssueCategory};
use crate::config::FairnessThresholds;

/// Checks distribution thresholds. Returns the breaches found.
pub fn check(thresholds: &FairnessThresholds, metrics: &RosterMetrics) -> Vec<Issue> {
    let mut issues = Vec::new();
    let upper = metrics.mean_shifts + thresholds.max_shift_deviation;
    let lower = metrics.mean_shifts - thresholds.max_shift_deviation;
    let low_satisfaction = metrics.preference_rate < thresholds.min_preference_rate;

    for w in &metrics.workloads {
        let shifts = f64::from(w.shifts);
        if shifts > upper {
            issues.push(
                Issue::fairness(
                    IssueCategory::Overwork,
                    format!("{} shifts against a mean of {:.2}", w.shifts, metrics.mean_shifts),
                )
                .for_nurse(&w.nurse_id),
            );
        }
        if shifts < lower {
            issues.push(
                Issue::fairness(
                    IssueCategory::Underutilization,
                    format!("{} shifts against a mean of {:.2}", w.shifts, metrics.mean_shifts),
                )
                .for_nurse(&w.nurse_id),
            );
        }
        if w.shifts > 0 && w.projected_fatigue >= thresholds.burnout_fatigue {
            issues.push(
                Issue::fairness(
                    IssueCategory::FatigueViolation,
                    format!("projected fatigue {:.2}", w.projected_fatigue),
                )
                .for_nurse(&w.nurse_id),
            );
        }
        if w.nights > thresholds.max_night_shifts {
            issues.push(
                Issue::fairness(
                    IssueCategory::NightConcentration,
                    format!(
                        "{} night shifts, maximum {}",
                        w.nights, thresholds.max_night_shifts
                    ),
                )
                .for_nurse(&w.nurse_id),
            );
        }
        if w.weekends > thresholds.max_weekend_shifts {
            issues.push(
                Issue::fairness(
                    IssueCategory::WeekendConcentration,
                    format!(
                        "{} weekend shifts, maximum {}",
                        w.weekends, thresholds.max_weekend_shifts
                    ),
                )
                .for_nurse(&w.nurse_id),
            );
        }
        if low_satisfaction && w.preference_violations > 0 {
            issues.push(
                Issue::fairness(
                    IssueCategory::PreferenceViolation,
                    format!(
                        "{} assignment(s) against stated preferences; roster rate {:.2}",
                        w.preference_violations, metrics.preference_rate
                    ),
                )
                .for_nurse(&w.nurse_id),
            );
        }
    }

    for (category, what, variance, max) in [
        (
            IssueCategory::Overwork,
            "shift",
            metrics.shift_variance,
            thresholds.max_shift_variance,
        ),
        (
            IssueCategory::NightConcentration,
            "night",
            metrics.night_variance,
            thresholds.max_night_variance,
        ),
        (
            IssueCategory::WeekendConcentration,
            "weekend",
            metrics.weekend_variance,
            thresholds.max_weekend_variance,
        ),
    ] {
        if variance > max {
            issues.push(Issue::fairness(
                category,
                format!("{what} count variance {variance:.2} above {max:.2}"),
            ));
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::metrics::NurseWorkload;

    fn workload(id: &str, shifts: u32) -> NurseWorkload {
        NurseWorkload {
            nurse_id: id.into(),
            shifts,
            ..NurseWorkload::default()
        }
    }

    #[test]
    fn test_balanced_is_approved() {
        let metrics = RosterMetrics {
            workloads: vec![workload("A", 3), workload("B", 4)],
            mean_shifts: 3.5,
            preference_rate: 1.0,
            ..RosterMetrics::default()
        };
        assert!(check(&FairnessThresholds::default(), &metrics).is_empty());
    }

    #[test]
    fn test_spread_flags_both_ends() {
        let metrics = RosterMetrics {
            workloads: vec![workload("A", 0), workload("B", 3), workload("C", 6)],
            mean_shifts: 3.0,
            preference_rate: 1.0,
            ..RosterMetrics::default()
        };
        let issues = check(&FairnessThresholds::default(), &metrics);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].category, IssueCategory::Underutilization);
        assert_eq!(issues[0].nurse_id.as_deref(), Some("A"));
        assert_eq!(issues[1].category, IssueCategory::Overwork);
        assert_eq!(issues[1].nurse_id.as_deref(), Some("C"));
    }

    #[test]
    fn test_concentration_fatigue_and_preferences() {
        let mut tired = workload("A", 4);
        tired.nights = 3;
        tired.weekends = 2;
        tired.projected_fatigue = 0.75;
        tired.preference_violations = 2;
        let metrics = RosterMetrics {
            workloads: vec![tired, workload("B", 4)],
            mean_shifts: 4.0,
            preference_rate: 0.5,
            ..RosterMetrics::default()
        };
        let cats: Vec<IssueCategory> = check(&FairnessThresholds::default(), &metrics)
            .into_iter()
            .map(|i| i.category)
            .collect();
        assert_eq!(
            cats,
            vec![
                IssueCategory::FatigueViolation,
                IssueCategory::NightConcentration,
                IssueCategory::WeekendConcentration,
                IssueCategory::PreferenceViolation,
            ]
        );
    }

    #[test]
    fn test_uneven_distribution_flags_variance() {
        let metrics = RosterMetrics {
            workloads: [("A", 0), ("B", 0), ("C", 0), ("D", 3), ("E", 3), ("F", 3)]
                .into_iter()
                .map(|(id, n)| workload(id, n))
                .collect(),
            mean_shifts: 1.5,
            shift_variance: 2.25,
            night_variance: 0.5,
            weekend_variance: 1.25,
            preference_rate: 1.0,
            ..RosterMetrics::default()
        };
        let issues = check(&FairnessThresholds::default(), &metrics);

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].category, IssueCategory::Overwork);
        assert!(issues[0].nurse_id.is_none());
        assert!(issues[0].detail.contains("2.25"));
        assert_eq!(issues[1].category, IssueCategory::WeekendConcentration);
        assert!(issues[1].nurse_id.is_none());

        let relaxed = FairnessThresholds {
            max_shift_variance: 3.0,
            max_weekend_variance: 2.0,
            ..FairnessThresholds::default()
        };
        assert!(check(&relaxed, &metrics).is_empty());
    }

    #[test]
    fn test_idle_fatigued_nurse_not_flagged() {
        let mut idle = workload("A", 0);
        idle.projected_fatigue = 0.9;
        let metrics = RosterMetrics {
            workloads: vec![idle],
            preference_rate: 1.0,
            ..RosterMetrics::default()
        };
        assert!(check(&FairnessThresholds::default(), &metrics).is_empty());
    }
}
