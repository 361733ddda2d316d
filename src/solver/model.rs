//! Indexed rostering model and incremental hard-constraint state.
//!
//! [`RosterModel`] turns the id-keyed problem into dense indices: shifts in
//! chronological order (start, then id), nurses in id order. Every per-shift
//! and per-nurse fact the search needs is computed once here.
//!
//! [`AssignmentState`] holds a partial roster and answers "can nurse `n`
//! take shift `s` without breaking a hard rule?" in time proportional to the
//! nurse's own shift list.
//!
//! # Hard Rules
//!
//! | Rule | Checked by |
//! |------|-----------|
//! | Certification, seniority, unavailability, shift longer than the cap | `eligible` matrix |
//! | Double-booking, minimum rest | neighbor check on the nurse's sorted shifts |
//! | Weekly hour cap | per-week minute totals |
//! | Consecutive-shift cap | `longest_run` over the nurse's shift dates |
//! | Senior presence | per start-time group senior counts |

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::Infeasibility;
use crate::models::{longest_run, Nurse, Shift, StreakCarry};
use crate::problem::RosterProblem;

/// Dense, precomputed view of a [`RosterProblem`].
#[derive(Debug)]
pub struct RosterModel<'a> {
    pub(crate) problem: &'a RosterProblem,
    /// Nurses in id order.
    pub(crate) nurses: Vec<&'a Nurse>,
    /// Shifts in chronological order.
    pub(crate) shifts: Vec<&'a Shift>,
    /// `eligible[s][n]`: nurse `n` meets shift `s`'s static requirements.
    pub(crate) eligible: Vec<Vec<bool>>,
    pub(crate) is_night: Vec<bool>,
    pub(crate) is_weekend: Vec<bool>,
    pub(crate) minutes: Vec<i64>,
    pub(crate) dates: Vec<NaiveDate>,
    pub(crate) week: Vec<usize>,
    /// Start-time group of each shift.
    pub(crate) group: Vec<usize>,
    /// Whether a group must contain a senior nurse.
    pub(crate) group_needs_senior: Vec<bool>,
    pub(crate) fatigue: Vec<f64>,
    pub(crate) carry: Vec<Option<StreakCarry>>,
    pub(crate) cap_minutes: Vec<i64>,
    pub(crate) is_senior: Vec<bool>,
    pub(crate) min_rest_minutes: i64,
    pub(crate) max_consecutive: u32,
    pub(crate) num_weeks: usize,
}

impl<'a> RosterModel<'a> {
    /// Builds the indexed model.
    pub fn new(problem: &'a RosterProblem) -> Self {
        let rules = &problem.rules;

        let mut nurses: Vec<&Nurse> = problem.nurses.iter().collect();
        nurses.sort_by(|a, b| a.id.cmp(&b.id));

        let mut shifts: Vec<&Shift> = problem.shifts.iter().collect();
        shifts.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));

        let eligible = shifts
            .iter()
            .map(|s| {
                nurses
                    .iter()
                    .map(|n| {
                        n.has_certifications(&s.required_certifications)
                            && s.admits_level(n.seniority)
                            && !n.is_unavailable_on(s.date())
                            && s.duration_minutes() <= rules.hour_caps.minutes_for(n.contract)
                    })
                    .collect()
            })
            .collect::<Vec<Vec<bool>>>();

        let mut group_of_start: BTreeMap<NaiveDateTime, usize> = BTreeMap::new();
        let mut group = Vec::with_capacity(shifts.len());
        for s in &shifts {
            let next = group_of_start.len();
            group.push(*group_of_start.entry(s.start).or_insert(next));
        }
        let is_senior: Vec<bool> = nurses.iter().map(|n| n.is_senior()).collect();
        let mut group_needs_senior = vec![false; group_of_start.len()];
        if rules.require_senior_presence {
            for (si, row) in eligible.iter().enumerate() {
                if row.iter().zip(&is_senior).any(|(&e, &sen)| e && sen) {
                    group_needs_senior[group[si]] = true;
                }
            }
        }

        Self {
            problem,
            eligible,
            is_night: shifts.iter().map(|s| s.is_night(&rules.night)).collect(),
            is_weekend: shifts.iter().map(|s| s.is_weekend()).collect(),
            minutes: shifts.iter().map(|s| s.duration_minutes()).collect(),
            dates: shifts.iter().map(|s| s.date()).collect(),
            week: shifts
                .iter()
                .map(|s| problem.period.week_index(s.date()))
                .collect(),
            group,
            group_needs_senior,
            fatigue: nurses
                .iter()
                .map(|n| problem.stats.fatigue_score(&n.id))
                .collect(),
            carry: nurses
                .iter()
                .map(|n| problem.stats.get(&n.id).and_then(|st| st.streak_carry()))
                .collect(),
            cap_minutes: nurses
                .iter()
                .map(|n| rules.hour_caps.minutes_for(n.contract))
                .collect(),
            is_senior,
            min_rest_minutes: i64::from(rules.min_rest_hours) * 60,
            max_consecutive: rules.max_consecutive_shifts,
            num_weeks: problem.period.num_weeks(),
            nurses,
            shifts,
        }
    }

    /// Number of nurses.
    pub fn num_nurses(&self) -> usize {
        self.nurses.len()
    }

    /// Number of shifts.
    pub fn num_shifts(&self) -> usize {
        self.shifts.len()
    }

    /// Nurse indices eligible for a shift.
    pub fn eligible_nurses(&self, s: usize) -> Vec<usize> {
        self.eligible[s]
            .iter()
            .enumerate()
            .filter(|(_, &e)| e)
            .map(|(n, _)| n)
            .collect()
    }

    /// Rejects models where a shift has fewer eligible nurses than it needs.
    ///
    /// Catches the common infeasibilities (no certified nurse for a ward,
    /// everyone on leave) without searching.
    pub fn preflight(&self) -> Result<(), Infeasibility> {
        if self.nurses.is_empty() && !self.shifts.is_empty() {
            return Err(Infeasibility::global("no nurses available"));
        }
        for (si, shift) in self.shifts.iter().enumerate() {
            let eligible = self.eligible[si].iter().filter(|&&e| e).count();
            if eligible < shift.headcount as usize {
                let mut reason = format!(
                    "{eligible} eligible nurse(s) for headcount {}",
                    shift.headcount
                );
                if !shift.required_certifications.is_empty() {
                    let certs: Vec<&str> = shift
                        .required_certifications
                        .iter()
                        .map(String::as_str)
                        .collect();
                    reason.push_str(&format!(" (requires {})", certs.join(", ")));
                }
                return Err(Infeasibility::for_shift(&shift.id, reason));
            }
        }
        Ok(())
    }
}

/// A partial roster over a [`RosterModel`] with incremental bookkeeping.
#[derive(Debug, Clone)]
pub struct AssignmentState {
    /// Nurses per shift.
    pub(crate) by_shift: Vec<Vec<usize>>,
    /// Shifts per nurse, ascending (chronological).
    pub(crate) by_nurse: Vec<Vec<usize>>,
    week_minutes: Vec<Vec<i64>>,
    group_seniors: Vec<u32>,
}

impl AssignmentState {
    /// Creates an empty state.
    pub fn new(model: &RosterModel<'_>) -> Self {
        Self {
            by_shift: vec![Vec::new(); model.num_shifts()],
            by_nurse: vec![Vec::new(); model.num_nurses()],
            week_minutes: vec![vec![0; model.num_weeks.max(1)]; model.num_nurses()],
            group_seniors: vec![0; model.group_needs_senior.len()],
        }
    }

    /// Whether nurse `n` is assigned to shift `s`.
    pub fn is_assigned(&self, n: usize, s: usize) -> bool {
        self.by_nurse[n].binary_search(&s).is_ok()
    }

    /// Whether nurse `n` can take shift `s` without breaking a hard rule.
    pub fn can_assign(&self, model: &RosterModel<'_>, n: usize, s: usize) -> bool {
        if !model.eligible[s][n] {
            return false;
        }
        let own = &self.by_nurse[n];
        let pos = match own.binary_search(&s) {
            Ok(_) => return false,
            Err(pos) => pos,
        };

        let shift = model.shifts[s];
        // Neighbors are pairwise rest-separated, so only they can conflict.
        if pos > 0 && !rest_ok(model, model.shifts[own[pos - 1]], shift) {
            return false;
        }
        if pos < own.len() && !rest_ok(model, shift, model.shifts[own[pos]]) {
            return false;
        }

        let week = model.week[s].min(self.week_minutes[n].len() - 1);
        if self.week_minutes[n][week] + model.minutes[s] > model.cap_minutes[n] {
            return false;
        }

        let mut dates: Vec<NaiveDate> = own.iter().map(|&x| model.dates[x]).collect();
        dates.insert(pos, model.dates[s]);
        longest_run(&dates, model.carry[n]) <= model.max_consecutive
    }

    /// Records an assignment. The caller must have checked `can_assign`.
    pub fn assign(&mut self, model: &RosterModel<'_>, n: usize, s: usize) {
        if let Err(pos) = self.by_nurse[n].binary_search(&s) {
            self.by_nurse[n].insert(pos, s);
            self.by_shift[s].push(n);
            let week = model.week[s].min(self.week_minutes[n].len() - 1);
            self.week_minutes[n][week] += model.minutes[s];
            if model.is_senior[n] {
                self.group_seniors[model.group[s]] += 1;
            }
        }
    }

    /// Removes an assignment if present.
    pub fn unassign(&mut self, model: &RosterModel<'_>, n: usize, s: usize) {
        if let Ok(pos) = self.by_nurse[n].binary_search(&s) {
            self.by_nurse[n].remove(pos);
            self.by_shift[s].retain(|&x| x != n);
            let week = model.week[s].min(self.week_minutes[n].len() - 1);
            self.week_minutes[n][week] -= model.minutes[s];
            if model.is_senior[n] {
                self.group_seniors[model.group[s]] -= 1;
            }
        }
    }

    /// Whether a start-time group meets the senior presence rule.
    pub fn group_satisfied(&self, model: &RosterModel<'_>, group: usize) -> bool {
        !model.group_needs_senior[group] || self.group_seniors[group] > 0
    }

    /// Iterates `(nurse, shift)` pairs in shift order.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.by_shift
            .iter()
            .enumerate()
            .flat_map(|(s, ns)| ns.iter().map(move |&n| (n, s)))
    }
}

fn rest_ok(model: &RosterModel<'_>, earlier: &Shift, later: &Shift) -> bool {
    matches!(
        earlier.rest_minutes_between(later),
        Some(rest) if rest >= model.min_rest_minutes
    )
}
