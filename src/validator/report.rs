//! Validation report, issues and issue categories.
//!
//! Issue categories form a closed set with one escape hatch:
//! [`IssueCategory::Unclassified`] carries any name an external validator
//! produced that this crate does not know. Categories serialize as their
//! snake_case name, so a report round-trips through JSON unchanged.
//!
//! # Category Table
//!
//! | Category | Check | Penalty keys |
//! |----------|-------|--------------|
//! | every compliance category | compliance | none |
//! | underutilization | fairness | underutilization |
//! | overwork | fairness | overwork |
//! | fatigue_violation | fairness | fatigue_high, fatigue_moderate |
//! | night_concentration | fairness | night_excess, fatigue_night |
//! | weekend_concentration | fairness | weekend_excess, fatigue_weekend |
//! | preference_violation | fairness | avoid_night, preferred_day |
//!
//! Compliance categories: certification, seniority_level, shift_coverage,
//! senior_presence, double_booking, minimum_rest, consecutive_shifts,
//! weekly_hours, unavailability, invalid_reference.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::metrics::RosterMetrics;
use crate::error::RosterError;
use crate::models::PenaltyKey;

/// Which sub-check produced an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Compliance,
    Fairness,
}

/// Classification of roster issues.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IssueCategory {
    /// Nurse lacks a certification the shift requires.
    Certification,
    /// Nurse is below the shift's minimum seniority.
    SeniorityLevel,
    /// Shift is under- or over-staffed.
    ShiftCoverage,
    /// A start-time period has no senior nurse although one was eligible.
    SeniorPresence,
    /// Nurse holds two overlapping shifts.
    DoubleBooking,
    /// Rest between two shifts is below the minimum.
    MinimumRest,
    /// Consecutive-shift run exceeds the cap.
    ConsecutiveShifts,
    /// Weekly hours exceed the contract cap.
    WeeklyHours,
    /// Nurse scheduled on an unavailable date.
    Unavailability,
    /// Assignment references an unknown nurse or shift.
    InvalidReference,
    /// Nurse works far fewer shifts than the mean.
    Underutilization,
    /// Nurse works far more shifts than the mean.
    Overwork,
    /// Projected fatigue reaches the burnout threshold.
    FatigueViolation,
    /// Too many night shifts on one nurse.
    NightConcentration,
    /// Too many weekend shifts on one nurse.
    WeekendConcentration,
    /// Preferences ignored while the roster-wide satisfaction rate is low.
    PreferenceViolation,
    /// A category this crate does not recognize.
    Unclassified(String),
}

impl IssueCategory {
    /// Stable snake_case name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Certification => "certification",
            Self::SeniorityLevel => "seniority_level",
            Self::ShiftCoverage => "shift_coverage",
            Self::SeniorPresence => "senior_presence",
            Self::DoubleBooking => "double_booking",
            Self::MinimumRest => "minimum_rest",
            Self::ConsecutiveShifts => "consecutive_shifts",
            Self::WeeklyHours => "weekly_hours",
            Self::Unavailability => "unavailability",
            Self::InvalidReference => "invalid_reference",
            Self::Underutilization => "underutilization",
            Self::Overwork => "overwork",
            Self::FatigueViolation => "fatigue_violation",
            Self::NightConcentration => "night_concentration",
            Self::WeekendConcentration => "weekend_concentration",
            Self::PreferenceViolation => "preference_violation",
            Self::Unclassified(name) => name,
        }
    }

    /// Parses a category name. Unknown names become `Unclassified`.
    pub fn parse(name: &str) -> Self {
        match name {
            "certification" => Self::Certification,
            "seniority_level" => Self::SeniorityLevel,
            "shift_coverage" => Self::ShiftCoverage,
            "senior_presence" => Self::SeniorPresence,
            "double_booking" => Self::DoubleBooking,
            "minimum_rest" => Self::MinimumRest,
            "consecutive_shifts" => Self::ConsecutiveShifts,
            "weekly_hours" => Self::WeeklyHours,
            "unavailability" => Self::Unavailability,
            "invalid_reference" => Self::InvalidReference,
            "underutilization" => Self::Underutilization,
            "overwork" => Self::Overwork,
            "fatigue_violation" => Self::FatigueViolation,
            "night_concentration" => Self::NightConcentration,
            "weekend_concentration" => Self::WeekendConcentration,
            "preference_violation" => Self::PreferenceViolation,
            other => Self::Unclassified(other.to_string()),
        }
    }

    /// The sub-check that owns a known category.
    pub fn check(&self) -> Option<CheckKind> {
        match self {
            Self::Certification
            | Self::SeniorityLevel
            | Self::ShiftCoverage
            | Self::SeniorPresence
            | Self::DoubleBooking
            | Self::MinimumRest
            | Self::ConsecutiveShifts
            | Self::WeeklyHours
            | Self::Unavailability
            | Self::InvalidReference => Some(CheckKind::Compliance),
            Self::Underutilization
            | Self::Overwork
            | Self::FatigueViolation
            | Self::NightConcentration
            | Self::WeekendConcentration
            | Self::PreferenceViolation => Some(CheckKind::Fairness),
            Self::Unclassified(_) => None,
        }
    }

    /// Penalty keys an unresolved issue of this category escalates.
    ///
    /// Hard-rule categories have no weight lever and return an empty slice.
    pub fn penalty_keys(&self) -> &'static [PenaltyKey] {
        match self {
            Self::Underutilization => &[PenaltyKey::Underutilization],
            Self::Overwork => &[PenaltyKey::Overwork],
            Self::FatigueViolation => &[PenaltyKey::FatigueHigh, PenaltyKey::FatigueModerate],
            Self::NightConcentration => &[PenaltyKey::NightExcess, PenaltyKey::FatigueNight],
            Self::WeekendConcentration => {
                &[PenaltyKey::WeekendExcess, PenaltyKey::FatigueWeekend]
            }
            Self::PreferenceViolation => &[PenaltyKey::AvoidNight, PenaltyKey::PreferredDay],
            _ => &[],
        }
    }

    /// Whether the category is unknown to this crate.
    pub fn is_unclassified(&self) -> bool {
        matches!(self, Self::Unclassified(_))
    }

    /// Default severity (0-100, higher = worse).
    pub fn default_severity(&self) -> i32 {
        match self {
            Self::Certification
            | Self::ShiftCoverage
            | Self::DoubleBooking
            | Self::InvalidReference => 100,
            Self::SeniorityLevel | Self::MinimumRest | Self::Unavailability => 90,
            Self::SeniorPresence | Self::ConsecutiveShifts | Self::WeeklyHours => 80,
            Self::FatigueViolation => 70,
            Self::Overwork => 60,
            Self::NightConcentration | Self::WeekendConcentration => 50,
            Self::Underutilization => 40,
            Self::PreferenceViolation => 30,
            Self::Unclassified(_) => 50,
        }
    }
}

impl From<String> for IssueCategory {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<IssueCategory> for String {
    fn from(category: IssueCategory) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single rule violation or threshold breach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue category.
    pub category: IssueCategory,
    /// Sub-check that raised it.
    pub source: CheckKind,
    /// Nurse at fault, when one is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nurse_id: Option<String>,
    /// Shift concerned, when one is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_id: Option<String>,
    /// Severity (0-100, higher = worse).
    pub severity: i32,
    /// Human-readable description.
    pub detail: String,
}

impl Issue {
    fn new(category: IssueCategory, source: CheckKind, detail: impl Into<String>) -> Self {
        Self {
            severity: category.default_severity(),
            category,
            source,
            nurse_id: None,
            shift_id: None,
            detail: detail.into(),
        }
    }

    /// Creates a compliance issue.
    pub fn compliance(category: IssueCategory, detail: impl Into<String>) -> Self {
        Self::new(category, CheckKind::Compliance, detail)
    }

    /// Creates a fairness issue.
    pub fn fairness(category: IssueCategory, detail: impl Into<String>) -> Self {
        Self::new(category, CheckKind::Fairness, detail)
    }

    /// Attributes the issue to a nurse.
    pub fn for_nurse(mut self, nurse_id: impl Into<String>) -> Self {
        self.nurse_id = Some(nurse_id.into());
        self
    }

    /// Attaches the shift concerned.
    pub fn for_shift(mut self, shift_id: impl Into<String>) -> Self {
        self.shift_id = Some(shift_id.into());
        self
    }

    /// Overrides the severity.
    pub fn with_severity(mut self, severity: i32) -> Self {
        self.severity = severity;
        self
    }
}

/// Compliance verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Pass,
    Fail,
}

/// Fairness verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FairnessStatus {
    Approved,
    Rejected,
}

/// Merged output of the compliance and fairness checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Roster the report describes.
    pub roster_id: String,
    /// Compliance verdict.
    pub compliance: ComplianceStatus,
    /// Fairness verdict.
    pub fairness: FairnessStatus,
    /// Compliance issues first, then fairness issues.
    #[serde(default)]
    pub issues: Vec<Issue>,
    /// Workload and satisfaction metrics.
    #[serde(default)]
    pub metrics: RosterMetrics,
}

impl ValidationReport {
    /// Merges the two sub-check results. Verdicts follow from the issue lists.
    pub fn merge(
        roster_id: impl Into<String>,
        compliance_issues: Vec<Issue>,
        fairness_issues: Vec<Issue>,
        metrics: RosterMetrics,
    ) -> Self {
        let compliance = if compliance_issues.is_empty() {
            ComplianceStatus::Pass
        } else {
            ComplianceStatus::Fail
        };
        let fairness = if fairness_issues.is_empty() {
            FairnessStatus::Approved
        } else {
            FairnessStatus::Rejected
        };
        let mut issues = compliance_issues;
        issues.extend(fairness_issues);
        Self {
            roster_id: roster_id.into(),
            compliance,
            fairness,
            issues,
            metrics,
        }
    }

    /// Overall pass: compliance passed and fairness approved.
    pub fn is_pass(&self) -> bool {
        self.compliance == ComplianceStatus::Pass && self.fairness == FairnessStatus::Approved
    }

    /// Number of issues.
    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    /// Issues raised by one sub-check.
    pub fn issues_from(&self, check: CheckKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.source == check)
    }

    /// Parses and checks a report produced by an external validator.
    pub fn from_json(json: &str) -> Result<Self, RosterError> {
        let report: Self = serde_json::from_str(json)?;
        report.ensure_well_formed()?;
        Ok(report)
    }

    /// Serializes the report.
    pub fn to_json(&self) -> Result<String, RosterError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Rejects reports whose verdicts contradict their issues.
    ///
    /// A report is malformed when a verdict fails with no issue from its
    /// check, passes with one, an issue's severity lies outside 0-100, or a
    /// compliance issue follows a fairness issue.
    pub fn ensure_well_formed(&self) -> Result<(), RosterError> {
        let compliance_issues = self.issues_from(CheckKind::Compliance).count();
        let fairness_issues = self.issues_from(CheckKind::Fairness).count();

        match (self.compliance, compliance_issues) {
            (ComplianceStatus::Fail, 0) => {
                return Err(malformed(&self.roster_id, "compliance FAIL without issues"))
            }
            (ComplianceStatus::Pass, n) if n > 0 => {
                return Err(malformed(&self.roster_id, "compliance PASS with issues"))
            }
            _ => {}
        }
        match (self.fairness, fairness_issues) {
            (FairnessStatus::Rejected, 0) => {
                return Err(malformed(&self.roster_id, "fairness REJECTED without issues"))
            }
            (FairnessStatus::Approved, n) if n > 0 => {
                return Err(malformed(&self.roster_id, "fairness APPROVED with issues"))
            }
            _ => {}
        }
        if let Some(issue) = self.issues.iter().find(|i| !(0..=100).contains(&i.severity)) {
            return Err(malformed(
                &self.roster_id,
                &format!("severity {} out of range for {}", issue.severity, issue.category),
            ));
        }
        let first_fairness = self
            .issues
            .iter()
            .position(|i| i.source == CheckKind::Fairness)
            .unwrap_or(self.issues.len());
        if self.issues[first_fairness..]
            .iter()
            .any(|i| i.source == CheckKind::Compliance)
        {
            return Err(malformed(
                &self.roster_id,
                "compliance issue listed after a fairness issue",
            ));
        }
        Ok(())
    }
}

fn malformed(roster_id: &str, reason: &str) -> RosterError {
    RosterError::ValidationParse(format!("report for roster '{roster_id}': {reason}"))
}
