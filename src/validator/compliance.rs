//! Compliance check: regulatory and coverage rules.
//!
//! Evaluates every hard rule against a roster and returns one issue per
//! violation. An empty result means PASS.
//!
//! Issue order is deterministic: unknown references in roster order, then
//! per-shift rules in chronological shift order, then senior presence per
//! start time, then per-nurse rules in nurse-id order.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveDateTime};

use super::report::{Issue, IssueCategory};
use crate::models::{longest_run, Nurse, Roster, Shift};
use crate::problem::RosterProblem;

/// Checks every hard rule. Returns the violations found.
pub fn check(problem: &RosterProblem, roster: &Roster) -> Vec<Issue> {
    let rules = &problem.rules;
    let nurses = problem.nurse_index();
    let shifts = problem.shift_index();
    let mut issues = Vec::new();

    for a in &roster.assignments {
        if !nurses.contains_key(a.nurse_id.as_str()) {
            issues.push(
                Issue::compliance(
                    IssueCategory::InvalidReference,
                    format!("unknown nurse '{}'", a.nurse_id),
                )
                .for_nurse(&a.nurse_id)
                .for_shift(&a.shift_id),
            );
        } else if !shifts.contains_key(a.shift_id.as_str()) {
            issues.push(
                Issue::compliance(
                    IssueCategory::InvalidReference,
                    format!("unknown shift '{}'", a.shift_id),
                )
                .for_nurse(&a.nurse_id)
                .for_shift(&a.shift_id),
            );
        }
    }

    let mut ordered: Vec<&Shift> = problem.shifts.iter().collect();
    ordered.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));

    let mut by_shift: HashMap<&str, Vec<&Nurse>> = HashMap::new();
    for a in &roster.assignments {
        if let Some(&nurse) = nurses.get(a.nurse_id.as_str()) {
            by_shift.entry(a.shift_id.as_str()).or_default().push(nurse);
        }
    }

    for shift in &ordered {
        let assigned = by_shift.get(shift.id.as_str()).map_or(&[][..], Vec::as_slice);
        if assigned.len() != shift.headcount as usize {
            issues.push(
                Issue::compliance(
                    IssueCategory::ShiftCoverage,
                    format!(
                        "{} nurse(s) assigned, {} required",
                        assigned.len(),
                        shift.headcount
                    ),
                )
                .for_shift(&shift.id),
            );
        }
        for nurse in assigned {
            let missing = nurse.missing_certifications(&shift.required_certifications);
            if !missing.is_empty() {
                issues.push(
                    Issue::compliance(
                        IssueCategory::Certification,
                        format!("missing certification(s): {}", missing.join(", ")),
                    )
                    .for_nurse(&nurse.id)
                    .for_shift(&shift.id),
                );
            }
            if !shift.admits_level(nurse.seniority) {
                issues.push(
                    Issue::compliance(
                        IssueCategory::SeniorityLevel,
                        format!(
                            "{:?} nurse on a shift requiring {:?}",
                            nurse.seniority, shift.min_seniority
                        ),
                    )
                    .for_nurse(&nurse.id)
                    .for_shift(&shift.id),
                );
            }
            if nurse.is_unavailable_on(shift.date()) {
                issues.push(
                    Issue::compliance(
                        IssueCategory::Unavailability,
                        format!("scheduled on unavailable date {}", shift.date()),
                    )
                    .for_nurse(&nurse.id)
                    .for_shift(&shift.id),
                );
            }
        }
    }

    if rules.require_senior_presence {
        let mut groups: BTreeMap<NaiveDateTime, Vec<&Shift>> = BTreeMap::new();
        for shift in &ordered {
            groups.entry(shift.start).or_default().push(shift);
        }
        for (start, group) in groups {
            let senior_eligible = group.iter().any(|s| {
                problem.nurses.iter().any(|n| {
                    n.is_senior()
                        && n.has_certifications(&s.required_certifications)
                        && s.admits_level(n.seniority)
                        && !n.is_unavailable_on(s.date())
                })
            });
            let senior_assigned = group.iter().any(|s| {
                by_shift
                    .get(s.id.as_str())
                    .is_some_and(|ns| ns.iter().any(|n| n.is_senior()))
            });
            if senior_eligible && !senior_assigned {
                issues.push(
                    Issue::compliance(
                        IssueCategory::SeniorPresence,
                        format!("no senior nurse on duty for shifts starting {start}"),
                    )
                    .for_shift(&group[0].id),
                );
            }
        }
    }

    let mut ordered_nurses: Vec<&Nurse> = problem.nurses.iter().collect();
    ordered_nurses.sort_by(|a, b| a.id.cmp(&b.id));
    let min_rest = i64::from(rules.min_rest_hours) * 60;

    for nurse in ordered_nurses {
        let mut own: Vec<&Shift> = roster
            .shifts_for_nurse(&nurse.id)
            .into_iter()
            .filter_map(|id| shifts.get(id).copied())
            .collect();
        own.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));

        for (i, earlier) in own.iter().enumerate() {
            for later in &own[i + 1..] {
                if later.start >= earlier.end {
                    break;
                }
                issues.push(
                    Issue::compliance(
                        IssueCategory::DoubleBooking,
                        format!("overlaps shift '{}'", later.id),
                    )
                    .for_nurse(&nurse.id)
                    .for_shift(&earlier.id),
                );
            }
        }

        for pair in own.windows(2) {
            if let Some(rest) = pair[0].rest_minutes_between(pair[1]) {
                if rest < min_rest {
                    issues.push(
                        Issue::compliance(
                            IssueCategory::MinimumRest,
                            format!(
                                "{:.1} h rest before '{}', minimum {} h",
                                rest as f64 / 60.0,
                                pair[1].id,
                                rules.min_rest_hours
                            ),
                        )
                        .for_nurse(&nurse.id)
                        .for_shift(&pair[1].id),
                    );
                }
            }
        }

        let dates: Vec<NaiveDate> = own.iter().map(|s| s.date()).collect();
        let carry = problem.stats.get(&nurse.id).and_then(|st| st.streak_carry());
        let run = longest_run(&dates, carry);
        if run > rules.max_consecutive_shifts {
            issues.push(
                Issue::compliance(
                    IssueCategory::ConsecutiveShifts,
                    format!(
                        "{run} consecutive shifts, maximum {}",
                        rules.max_consecutive_shifts
                    ),
                )
                .for_nurse(&nurse.id),
            );
        }

        let cap = rules.hour_caps.minutes_for(nurse.contract);
        let mut weekly: BTreeMap<usize, i64> = BTreeMap::new();
        for s in &own {
            *weekly.entry(problem.period.week_index(s.date())).or_insert(0) += s.duration_minutes();
        }
        for (week, minutes) in weekly {
            if minutes > cap {
                issues.push(
                    Issue::compliance(
                        IssueCategory::WeeklyHours,
                        format!(
                            "{:.1} h in week {}, cap {} h",
                            minutes as f64 / 60.0,
                            week + 1,
                            rules.hour_caps.for_contract(nurse.contract)
                        ),
                    )
                    .for_nurse(&nurse.id),
                );
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContractType, NurseStats, SchedulingPeriod, SeniorityLevel, StatsSnapshot};

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn problem() -> RosterProblem {
        let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let mut p = RosterProblem::new("p", SchedulingPeriod::from_days(start, 7))
            .with_nurse(
                Nurse::new("S", SeniorityLevel::Senior, ContractType::FullTime)
                    .with_certification("ICU"),
            )
            .with_nurse(
                Nurse::new("J", SeniorityLevel::Junior, ContractType::Casual)
                    .with_unavailable_date(NaiveDate::from_ymd_opt(2025, 1, 9).unwrap()),
            );
        for day in 6..=10 {
            p = p.with_shift(Shift::new(format!("d{day}"), "Gen", at(day, 8), at(day, 16)));
        }
        p.with_shift(
            Shift::new("icu", "ICU", at(6, 20), at(7, 4))
                .requiring("ICU")
                .with_min_seniority(SeniorityLevel::Mid),
        )
    }

    fn categories(issues: &[Issue]) -> Vec<&str> {
        issues.iter().map(|i| i.category.as_str()).collect()
    }

    #[test]
    fn test_rest_and_senior_presence() {
        let p = problem();
        let roster = Roster::new("r", p.period)
            .with_assignment("S", "d6")
            .with_assignment("J", "d7")
            .with_assignment("S", "d8")
            .with_assignment("S", "d9")
            .with_assignment("S", "d10")
            .with_assignment("S", "icu");
        // S works d6 08-16 and icu 20-04: 4 h rest
        let issues = check(&p, &roster);
        assert_eq!(categories(&issues), vec!["senior_presence", "minimum_rest"]);
        assert_eq!(issues[0].shift_id.as_deref(), Some("d7"));
        assert_eq!(issues[1].nurse_id.as_deref(), Some("S"));
    }

    #[test]
    fn test_coverage_cert_seniority_unavailability() {
        let p = problem();
        let roster = Roster::new("r", p.period)
            .with_assignment("J", "icu")
            .with_assignment("J", "d9");
        let issues = check(&p, &roster);
        let cats = categories(&issues);

        assert!(cats.contains(&"shift_coverage"));
        assert!(cats.contains(&"certification"));
        assert!(cats.contains(&"seniority_level"));
        assert!(cats.contains(&"unavailability"));
        assert!(issues.iter().all(|i| i.severity >= 80));
    }

    #[test]
    fn test_double_booking_and_unknown_refs() {
        let mut p = problem();
        p.shifts.push(Shift::new("d6-overlap", "Gen", at(6, 12), at(6, 20)));
        let roster = Roster::new("r", p.period)
            .with_assignment("S", "d6")
            .with_assignment("S", "d6-overlap")
            .with_assignment("ghost", "d7")
            .with_assignment("J", "nowhere");
        let issues = check(&p, &roster);
        assert_eq!(issues[0].category, IssueCategory::InvalidReference);
        assert_eq!(issues[1].category, IssueCategory::InvalidReference);
        assert!(issues.iter().any(|i| {
            i.category == IssueCategory::DoubleBooking && i.shift_id.as_deref() == Some("d6")
        }));
    }

    #[test]
    fn test_consecutive_and_weekly_hours() {
        let p = problem().with_stats(StatsSnapshot::new().with(
            NurseStats::new("J").with_streak(2, NaiveDate::from_ymd_opt(2025, 1, 5).unwrap()),
        ));
        let roster = Roster::new("r", p.period)
            .with_assignment("J", "d6")
            .with_assignment("J", "d7")
            .with_assignment("J", "d8");
        let issues = check(&p, &roster);
        let cats = categories(&issues);
        // carried 2 + 3 = 5 > 3; casual 24 h > 20 h
        assert!(cats.contains(&"consecutive_shifts"));
        assert!(cats.contains(&"weekly_hours"));
    }
}
