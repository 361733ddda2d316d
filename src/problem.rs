//! The frozen input snapshot of one refinement loop.
//!
//! A [`RosterProblem`] bundles the nurse set, shift set, statistics and
//! hard-rule thresholds. It is built once, checked once, and then only
//! borrowed: the solver and validator never see a mutable reference.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::RulesConfig;
use crate::models::{Nurse, SchedulingPeriod, Shift, StatsSnapshot};
use crate::validation::{validate_input, ValidationResult};

/// Inputs shared by every iteration of the loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterProblem {
    /// Problem identifier; roster ids are derived from it.
    pub id: String,
    /// Period being rostered.
    pub period: SchedulingPeriod,
    /// Nurses available for assignment.
    pub nurses: Vec<Nurse>,
    /// Shifts to staff.
    pub shifts: Vec<Shift>,
    /// Rolling statistics at loop start.
    #[serde(default)]
    pub stats: StatsSnapshot,
    /// Hard-rule and fairness thresholds.
    #[serde(default)]
    pub rules: RulesConfig,
}

impl RosterProblem {
    /// Creates a problem with no nurses, shifts or statistics.
    pub fn new(id: impl Into<String>, period: SchedulingPeriod) -> Self {
        Self {
            id: id.into(),
            period,
            nurses: Vec::new(),
            shifts: Vec::new(),
            stats: StatsSnapshot::new(),
            rules: RulesConfig::default(),
        }
    }

    /// Adds a nurse.
    pub fn with_nurse(mut self, nurse: Nurse) -> Self {
        self.nurses.push(nurse);
        self
    }

    /// Adds nurses.
    pub fn with_nurses(mut self, nurses: impl IntoIterator<Item = Nurse>) -> Self {
        self.nurses.extend(nurses);
        self
    }

    /// Adds a shift.
    pub fn with_shift(mut self, shift: Shift) -> Self {
        self.shifts.push(shift);
        self
    }

    /// Adds shifts.
    pub fn with_shifts(mut self, shifts: impl IntoIterator<Item = Shift>) -> Self {
        self.shifts.extend(shifts);
        self
    }

    /// Sets the statistics snapshot.
    pub fn with_stats(mut self, stats: StatsSnapshot) -> Self {
        self.stats = stats;
        self
    }

    /// Sets the rule thresholds.
    pub fn with_rules(mut self, rules: RulesConfig) -> Self {
        self.rules = rules;
        self
    }

    /// Runs the structural input checks.
    pub fn validate(&self) -> ValidationResult {
        validate_input(&self.period, &self.nurses, &self.shifts, &self.stats)
    }

    /// Looks up a nurse by id.
    pub fn nurse(&self, id: &str) -> Option<&Nurse> {
        self.nurses.iter().find(|n| n.id == id)
    }

    /// Looks up a shift by id.
    pub fn shift(&self, id: &str) -> Option<&Shift> {
        self.shifts.iter().find(|s| s.id == id)
    }

    /// Shift index by id, for repeated lookups.
    pub fn shift_index(&self) -> HashMap<&str, &Shift> {
        self.shifts.iter().map(|s| (s.id.as_str(), s)).collect()
    }

    /// Nurse index by id, for repeated lookups.
    pub fn nurse_index(&self) -> HashMap<&str, &Nurse> {
        self.nurses.iter().map(|n| (n.id.as_str(), n)).collect()
    }

    /// Total nurse slots over all shifts.
    pub fn total_slots(&self) -> usize {
        self.shifts.iter().map(|s| s.headcount as usize).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContractType, SeniorityLevel};
    use chrono::NaiveDate;

    #[test]
    fn test_builder_and_lookup() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let p = RosterProblem::new("week-2", SchedulingPeriod::from_days(day, 7))
            .with_nurse(Nurse::new("N1", SeniorityLevel::Mid, ContractType::FullTime))
            .with_shift(
                Shift::new(
                    "S1",
                    "ICU",
                    day.and_hms_opt(8, 0, 0).unwrap(),
                    day.and_hms_opt(16, 0, 0).unwrap(),
                )
                .with_headcount(2),
            );

        assert!(p.nurse("N1").is_some());
        assert!(p.nurse("N9").is_none());
        assert_eq!(p.shift("S1").map(|s| s.headcount), Some(2));
        assert_eq!(p.total_slots(), 2);
        assert!(p.validate().is_ok());
    }
}
