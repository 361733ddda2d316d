//! Input validation for rostering problems.
//!
//! Checks structural integrity of the frozen input snapshot before the
//! refinement loop starts. Detects:
//! - Duplicate nurse and shift IDs
//! - Shifts that end at or before their start
//! - Shifts requiring zero nurses
//! - Shifts starting outside the scheduling period
//! - Statistics for nurses that are not in the nurse set
//! - Preference-honored rates outside [0, 1]
//!
//! These are input defects, not roster defects: rule violations in a roster
//! are reported by [`crate::validator`].

use std::collections::HashSet;

use crate::models::{Nurse, SchedulingPeriod, Shift, StatsSnapshot};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A shift has a non-positive duration.
    EmptyShift,
    /// A shift requires no nurses.
    ZeroHeadcount,
    /// A shift starts outside the scheduling period.
    OutsidePeriod,
    /// Statistics reference a nurse that doesn't exist.
    UnknownNurse,
    /// A statistic is out of its valid range.
    InvalidStatistic,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the input snapshot for a rostering problem.
///
/// Checks:
/// 1. No duplicate nurse IDs
/// 2. No duplicate shift IDs
/// 3. Every shift ends after it starts
/// 4. Every shift requires at least one nurse
/// 5. Every shift starts inside the period
/// 6. Statistics only reference known nurses
/// 7. Preference-honored rates lie in [0, 1]
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(
    period: &SchedulingPeriod,
    nurses: &[Nurse],
    shifts: &[Shift],
    stats: &StatsSnapshot,
) -> ValidationResult {
    let mut errors = Vec::new();

    if period.end < period.start {
        errors.push(ValidationError::new(
            ValidationErrorKind::OutsidePeriod,
            format!("Period ends ({}) before it starts ({})", period.end, period.start),
        ));
    }

    let mut nurse_ids = HashSet::new();
    for n in nurses {
        if !nurse_ids.insert(n.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate nurse ID: {}", n.id),
            ));
        }
    }

    let mut shift_ids = HashSet::new();
    for s in shifts {
        if !shift_ids.insert(s.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate shift ID: {}", s.id),
            ));
        }

        if s.end <= s.start {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyShift,
                format!("Shift '{}' ends before it starts", s.id),
            ));
        }

        if s.headcount == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::ZeroHeadcount,
                format!("Shift '{}' requires no nurses", s.id),
            ));
        }

        if !period.contains(s.date()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::OutsidePeriod,
                format!(
                    "Shift '{}' starts on {} outside period {}..={}",
                    s.id,
                    s.date(),
                    period.start,
                    period.end
                ),
            ));
        }
    }

    for st in stats.iter() {
        if !nurse_ids.contains(st.nurse_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownNurse,
                format!("Statistics reference unknown nurse '{}'", st.nurse_id),
            ));
        }
        if !(0.0..=1.0).contains(&st.preferences_honored_rate) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidStatistic,
                format!(
                    "Nurse '{}' has preference-honored rate {} outside [0, 1]",
                    st.nurse_id, st.preferences_honored_rate
                ),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContractType, NurseStats, SeniorityLevel};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn period() -> SchedulingPeriod {
        SchedulingPeriod::from_days(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(), 7)
    }

    fn sample_nurses() -> Vec<Nurse> {
        vec![
            Nurse::new("N1", SeniorityLevel::Senior, ContractType::FullTime),
            Nurse::new("N2", SeniorityLevel::Mid, ContractType::PartTime),
        ]
    }

    fn sample_shifts() -> Vec<Shift> {
        vec![
            Shift::new("S1", "ICU", at(6, 8), at(6, 16)),
            Shift::new("S2", "ICU", at(6, 20), at(7, 4)),
        ]
    }

    #[test]
    fn test_valid_input() {
        let stats = StatsSnapshot::new().with(NurseStats::new("N1"));
        assert!(validate_input(&period(), &sample_nurses(), &sample_shifts(), &stats).is_ok());
    }

    #[test]
    fn test_duplicate_nurse_id() {
        let mut nurses = sample_nurses();
        nurses.push(Nurse::new("N1", SeniorityLevel::Junior, ContractType::Casual));

        let errors = validate_input(&period(), &nurses, &sample_shifts(), &StatsSnapshot::new())
            .unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.message.contains("nurse")));
    }

    #[test]
    fn test_duplicate_shift_id() {
        let mut shifts = sample_shifts();
        shifts.push(Shift::new("S1", "General", at(7, 8), at(7, 16)));

        let errors = validate_input(&period(), &sample_nurses(), &shifts, &StatsSnapshot::new())
            .unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.message.contains("shift")));
    }

    #[test]
    fn test_inverted_shift() {
        let shifts = vec![Shift::new("S1", "ICU", at(6, 16), at(6, 8))];
        let errors = validate_input(&period(), &sample_nurses(), &shifts, &StatsSnapshot::new())
            .unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::EmptyShift));
    }

    #[test]
    fn test_zero_headcount() {
        let shifts = vec![Shift::new("S1", "ICU", at(6, 8), at(6, 16)).with_headcount(0)];
        let errors = validate_input(&period(), &sample_nurses(), &shifts, &StatsSnapshot::new())
            .unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::ZeroHeadcount));
    }

    #[test]
    fn test_shift_outside_period() {
        let shifts = vec![Shift::new("S1", "ICU", at(20, 8), at(20, 16))];
        let errors = validate_input(&period(), &sample_nurses(), &shifts, &StatsSnapshot::new())
            .unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::OutsidePeriod));
    }

    #[test]
    fn test_stats_for_unknown_nurse() {
        let stats = StatsSnapshot::new().with(NurseStats::new("ghost"));
        let errors =
            validate_input(&period(), &sample_nurses(), &sample_shifts(), &stats).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::UnknownNurse));
    }

    #[test]
    fn test_multiple_errors() {
        let shifts = vec![Shift::new("S1", "ICU", at(6, 16), at(6, 8)).with_headcount(0)];
        let stats = StatsSnapshot::new().with(NurseStats::new("N1").with_honored_rate(1.5));

        let errors = validate_input(&period(), &sample_nurses(), &shifts, &stats).unwrap_err();
        assert!(errors.len() >= 3);
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidStatistic));
    }
}
