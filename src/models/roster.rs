//! Roster (solution) model.
//!
//! A roster is an ordered set of nurse-shift assignments over a scheduling
//! period. Status transitions beyond `Draft` belong to the external approval
//! workflow; this crate only ever produces drafts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::SchedulingPeriod;

/// A nurse roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    /// Roster identifier.
    pub id: String,
    /// Period covered.
    pub period: SchedulingPeriod,
    /// Assignments, without duplicates, in the order they were added.
    pub assignments: Vec<Assignment>,
    /// Lifecycle status.
    pub status: RosterStatus,
}

/// A nurse-shift assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Assignment {
    /// Assigned nurse.
    pub nurse_id: String,
    /// Assigned shift.
    pub shift_id: String,
}

/// Roster lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterStatus {
    #[default]
    Draft,
    Finalized,
    Rejected,
    Archived,
}

impl Assignment {
    /// Creates an assignment.
    pub fn new(nurse_id: impl Into<String>, shift_id: impl Into<String>) -> Self {
        Self {
            nurse_id: nurse_id.into(),
            shift_id: shift_id.into(),
        }
    }
}

impl Roster {
    /// Creates an empty draft roster.
    pub fn new(id: impl Into<String>, period: SchedulingPeriod) -> Self {
        Self {
            id: id.into(),
            period,
            assignments: Vec::new(),
            status: RosterStatus::Draft,
        }
    }

    /// Adds an assignment. Returns `false` if it was already present.
    pub fn add_assignment(&mut self, assignment: Assignment) -> bool {
        if self.assignments.contains(&assignment) {
            return false;
        }
        self.assignments.push(assignment);
        true
    }

    /// Adds an assignment (builder form).
    pub fn with_assignment(mut self, nurse_id: &str, shift_id: &str) -> Self {
        self.add_assignment(Assignment::new(nurse_id, shift_id));
        self
    }

    /// Whether `nurse_id` is assigned to `shift_id`.
    pub fn is_assigned(&self, nurse_id: &str, shift_id: &str) -> bool {
        self.assignments
            .iter()
            .any(|a| a.nurse_id == nurse_id && a.shift_id == shift_id)
    }

    /// Shift ids assigned to a nurse, in roster order.
    pub fn shifts_for_nurse(&self, nurse_id: &str) -> Vec<&str> {
        self.assignments
            .iter()
            .filter(|a| a.nurse_id == nurse_id)
            .map(|a| a.shift_id.as_str())
            .collect()
    }

    /// Nurse ids assigned to a shift, in roster order.
    pub fn nurses_for_shift(&self, shift_id: &str) -> Vec<&str> {
        self.assignments
            .iter()
            .filter(|a| a.shift_id == shift_id)
            .map(|a| a.nurse_id.as_str())
            .collect()
    }

    /// Number of shifts assigned to a nurse.
    pub fn count_for_nurse(&self, nurse_id: &str) -> usize {
        self.assignments
            .iter()
            .filter(|a| a.nurse_id == nurse_id)
            .count()
    }

    /// Assignment counts per nurse (only nurses with assignments).
    pub fn counts_by_nurse(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for a in &self.assignments {
            *counts.entry(a.nurse_id.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of assignments.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }

    /// Whether the roster has no assignments.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_roster() -> Roster {
        let period = SchedulingPeriod::from_days(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(), 7);
        Roster::new("R1", period)
            .with_assignment("N1", "S1")
            .with_assignment("N2", "S1")
            .with_assignment("N1", "S2")
    }

    #[test]
    fn test_new_roster_is_draft() {
        let r = sample_roster();
        assert_eq!(r.status, RosterStatus::Draft);
        assert_eq!(r.assignment_count(), 3);
    }

    #[test]
    fn test_no_duplicate_assignments() {
        let mut r = sample_roster();
        assert!(!r.add_assignment(Assignment::new("N1", "S1")));
        assert_eq!(r.assignment_count(), 3);
    }

    #[test]
    fn test_queries() {
        let r = sample_roster();
        assert_eq!(r.shifts_for_nurse("N1"), vec!["S1", "S2"]);
        assert_eq!(r.nurses_for_shift("S1"), vec!["N1", "N2"]);
        assert_eq!(r.count_for_nurse("N1"), 2);
        assert_eq!(r.count_for_nurse("N9"), 0);
        assert!(r.is_assigned("N2", "S1"));
        assert!(!r.is_assigned("N2", "S2"));

        let counts = r.counts_by_nurse();
        assert_eq!(counts["N1"], 2);
        assert_eq!(counts["N2"], 1);
    }

    #[test]
    fn test_empty_roster() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let r = Roster::new("R0", SchedulingPeriod::from_days(day, 1));
        assert!(r.is_empty());
        assert!(r.counts_by_nurse().is_empty());
    }
}
