//! Feedback analysis: from a failing report to the next penalty weights.
//!
//! Every issue category maps to a fixed set of penalty keys (see
//! [`IssueCategory::penalty_keys`]). For each key:
//!
//! | Key state | Next weight |
//! |-----------|-------------|
//! | touched by an issue | `min(prev * escalation_factor, base * max_multiplier)` |
//! | untouched | `max(base, prev * decay_factor)` |
//!
//! Base weights are the loop's initial configuration. Issues with an
//! unknown category go to an unclassified bucket and change nothing.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::FeedbackConfig;
use crate::models::{PenaltyConfig, PenaltyKey};
use crate::validator::{Issue, ValidationReport};

/// Outcome of analyzing one iteration's report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackState {
    /// Iteration whose report was analyzed.
    pub iteration: u32,
    /// Number of issues read from the report.
    pub issues_consumed: usize,
    /// Keys escalated, in key order.
    pub escalated: Vec<PenaltyKey>,
    /// Issues whose category is unknown.
    pub unclassified: Vec<Issue>,
    /// Weights for the next attempt.
    pub penalties: PenaltyConfig,
}

/// Derives the next penalty configuration from a failing report.
#[derive(Debug, Clone)]
pub struct FeedbackAnalyzer {
    config: FeedbackConfig,
    base: PenaltyConfig,
}

impl FeedbackAnalyzer {
    /// Creates an analyzer that decays toward `base`.
    pub fn new(config: FeedbackConfig, base: PenaltyConfig) -> Self {
        Self { config, base }
    }

    /// Base weights.
    pub fn base(&self) -> &PenaltyConfig {
        &self.base
    }

    /// Analyzes `report`, produced under `previous`.
    pub fn analyze(
        &self,
        iteration: u32,
        report: &ValidationReport,
        previous: &PenaltyConfig,
    ) -> FeedbackState {
        let mut touched = BTreeSet::new();
        let mut unclassified = Vec::new();

        for issue in &report.issues {
            if issue.category.is_unclassified() {
                warn!(
                    iteration,
                    category = %issue.category,
                    nurse_id = issue.nurse_id.as_deref().unwrap_or("-"),
                    "unclassified issue category; no penalty adjusted"
                );
                unclassified.push(issue.clone());
                continue;
            }
            touched.extend(issue.category.penalty_keys().iter().copied());
        }

        let mut penalties = previous.clone();
        for key in PenaltyKey::ALL {
            let prev = previous.weight(key);
            let base = self.base.weight(key);
            let next = if touched.contains(&key) {
                (prev * self.config.escalation_factor).min(base * self.config.max_multiplier)
            } else {
                base.max(prev * self.config.decay_factor)
            };
            penalties.set(key, next);
        }

        debug!(
            iteration,
            escalated = touched.len(),
            unclassified = unclassified.len(),
            "penalties updated"
        );

        FeedbackState {
            iteration,
            issues_consumed: report.issues.len(),
            escalated: touched.into_iter().collect(),
            unclassified,
            penalties,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{IssueCategory, RosterMetrics};

    fn report(issues: Vec<Issue>) -> ValidationReport {
        ValidationReport::merge("r", vec![], issues, RosterMetrics::default())
    }

    fn analyzer() -> FeedbackAnalyzer {
        FeedbackAnalyzer::new(FeedbackConfig::default(), PenaltyConfig::base())
    }

    #[test]
    fn test_escalates_touched_keys() {
        let r = report(vec![
            Issue::fairness(IssueCategory::Underutilization, "0 shifts").for_nurse("X"),
            Issue::fairness(IssueCategory::NightConcentration, "4 nights").for_nurse("Y"),
        ]);
        let state = analyzer().analyze(1, &r, &PenaltyConfig::base());

        assert!((state.penalties.weight(PenaltyKey::Underutilization) - 22.5).abs() < 1e-10);
        assert!((state.penalties.weight(PenaltyKey::NightExcess) - 45.0).abs() < 1e-10);
        assert!((state.penalties.weight(PenaltyKey::FatigueNight) - 45.0).abs() < 1e-10);
        assert!((state.penalties.weight(PenaltyKey::Overwork) - 10.0).abs() < 1e-10);
        assert_eq!(
            state.escalated,
            vec![
                PenaltyKey::FatigueNight,
                PenaltyKey::Underutilization,
                PenaltyKey::NightExcess
            ]
        );
        assert_eq!(state.issues_consumed, 2);
    }

    #[test]
    fn test_escalation_capped() {
        let r = report(vec![Issue::fairness(IssueCategory::Overwork, "9 shifts")]);
        let prev = PenaltyConfig::base().with_weight(PenaltyKey::Overwork, 35.0);
        let state = analyzer().analyze(3, &r, &prev);
        // 35 * 1.5 = 52.5 capped at 4 * 10
        assert!((state.penalties.weight(PenaltyKey::Overwork) - 40.0).abs() < 1e-10);
    }

    #[test]
    fn test_untouched_keys_decay_to_base() {
        let r = report(vec![Issue::fairness(IssueCategory::Overwork, "9 shifts")]);
        let prev = PenaltyConfig::base()
            .with_weight(PenaltyKey::NightExcess, 60.0)
            .with_weight(PenaltyKey::WeekendExcess, 35.0);
        let state = analyzer().analyze(2, &r, &prev);
        assert!((state.penalties.weight(PenaltyKey::NightExcess) - 45.0).abs() < 1e-10);
        // 35 * 0.75 < 30: floors at base
        assert!((state.penalties.weight(PenaltyKey::WeekendExcess) - 30.0).abs() < 1e-10);
    }

    #[test]
    fn test_unclassified_changes_nothing() {
        let r = report(vec![Issue::fairness(
            IssueCategory::Unclassified("morale".into()),
            "low morale",
        )]);
        let state = analyzer().analyze(1, &r, &PenaltyConfig::base());
        assert_eq!(state.unclassified.len(), 1);
        assert!(state.escalated.is_empty());
        assert_eq!(state.penalties, PenaltyConfig::base());
    }

    #[test]
    fn test_hard_rule_issues_have_no_lever() {
        let r = ValidationReport::merge(
            "r",
            vec![Issue::compliance(IssueCategory::MinimumRest, "6 h rest")],
            vec![],
            RosterMetrics::default(),
        );
        let state = analyzer().analyze(1, &r, &PenaltyConfig::base());
        assert!(state.escalated.is_empty());
        assert!(state.unclassified.is_empty());
        assert_eq!(state.penalties, PenaltyConfig::base());
    }
}
