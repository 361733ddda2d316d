//! Rolling nurse statistics and fatigue scoring.
//!
//! Statistics are a read-only snapshot owned by an external history
//! collaborator. The fatigue score is never stored; it is recomputed from
//! the counts every time it is needed.
//!
//! # Fatigue Formula
//!
//! | Factor | Saturates at | Weight |
//! |--------|-------------|--------|
//! | Current consecutive streak | 3 shifts | 0.30 |
//! | Weekend shifts (30 d) | 4 | 0.25 |
//! | Night shifts (30 d) | 8 | 0.25 |
//! | Preferences not honored | rate 0.0 | 0.20 |
//!
//! The sum is rounded to two decimals and clamped to [0, 1].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::StreakCarry;

/// 30-day rolling statistics for one nurse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NurseStats {
    /// Nurse identifier.
    pub nurse_id: String,
    /// Shifts worked in the last 30 days.
    #[serde(default)]
    pub shifts_30d: u32,
    /// Weekend shifts worked in the last 30 days.
    #[serde(default)]
    pub weekend_shifts_30d: u32,
    /// Night shifts worked in the last 30 days.
    #[serde(default)]
    pub night_shifts_30d: u32,
    /// Length of the consecutive-shift streak ending at `last_shift_date`.
    #[serde(default)]
    pub consecutive_shifts_current: u32,
    /// Date of the most recent shift worked.
    #[serde(default)]
    pub last_shift_date: Option<NaiveDate>,
    /// Fraction of preferences honored (0.0..=1.0).
    #[serde(default = "default_honored_rate")]
    pub preferences_honored_rate: f64,
}

fn default_honored_rate() -> f64 {
    1.0
}

impl NurseStats {
    /// Creates fresh statistics (no history, all preferences honored).
    pub fn new(nurse_id: impl Into<String>) -> Self {
        Self {
            nurse_id: nurse_id.into(),
            shifts_30d: 0,
            weekend_shifts_30d: 0,
            night_shifts_30d: 0,
            consecutive_shifts_current: 0,
            last_shift_date: None,
            preferences_honored_rate: 1.0,
        }
    }

    /// Sets the 30-day shift count.
    pub fn with_shifts(mut self, count: u32) -> Self {
        self.shifts_30d = count;
        self
    }

    /// Sets the 30-day weekend count.
    pub fn with_weekends(mut self, count: u32) -> Self {
        self.weekend_shifts_30d = count;
        self
    }

    /// Sets the 30-day night count.
    pub fn with_nights(mut self, count: u32) -> Self {
        self.night_shifts_30d = count;
        self
    }

    /// Sets the current streak and the date it ended on.
    pub fn with_streak(mut self, streak: u32, last_shift_date: NaiveDate) -> Self {
        self.consecutive_shifts_current = streak;
        self.last_shift_date = Some(last_shift_date);
        self
    }

    /// Sets the preference-honored rate.
    pub fn with_honored_rate(mut self, rate: f64) -> Self {
        self.preferences_honored_rate = rate;
        self
    }

    /// Fatigue score in [0, 1]; higher = greater burnout risk.
    pub fn fatigue_score(&self) -> f64 {
        fatigue_from_counts(
            self.consecutive_shifts_current,
            self.weekend_shifts_30d,
            self.night_shifts_30d,
            self.preferences_honored_rate,
        )
    }

    /// Streak carried into a new period, if any.
    pub fn streak_carry(&self) -> Option<StreakCarry> {
        self.last_shift_date.map(|date| StreakCarry {
            last_shift_date: date,
            streak: self.consecutive_shifts_current,
        })
    }
}

/// Fatigue score from raw counts.
///
/// Shared by the stored-stats score and the projected score the fairness
/// check computes after adding a roster's workload.
pub fn fatigue_from_counts(streak: u32, weekends: u32, nights: u32, honored_rate: f64) -> f64 {
    let consecutive = (f64::from(streak) / 3.0).min(1.0) * 0.30;
    let weekend = (f64::from(weekends) / 4.0).min(1.0) * 0.25;
    let night = (f64::from(nights) / 8.0).min(1.0) * 0.25;
    let preference = (1.0 - honored_rate.clamp(0.0, 1.0)) * 0.20;

    let raw = consecutive + weekend + night + preference;
    ((raw * 100.0).round() / 100.0).clamp(0.0, 1.0)
}

/// Immutable statistics snapshot keyed by nurse id.
///
/// Nurses with no entry are treated as having fresh statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatsSnapshot {
    entries: BTreeMap<String, NurseStats>,
}

impl StatsSnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds statistics (replacing any existing entry for the nurse).
    pub fn with(mut self, stats: NurseStats) -> Self {
        self.insert(stats);
        self
    }

    /// Inserts statistics.
    pub fn insert(&mut self, stats: NurseStats) {
        self.entries.insert(stats.nurse_id.clone(), stats);
    }

    /// Statistics for a nurse, if recorded.
    pub fn get(&self, nurse_id: &str) -> Option<&NurseStats> {
        self.entries.get(nurse_id)
    }

    /// Fatigue score for a nurse (0.0 when no statistics are recorded).
    pub fn fatigue_score(&self, nurse_id: &str) -> f64 {
        self.get(nurse_id).map_or(0.0, NurseStats::fatigue_score)
    }

    /// Iterates entries in nurse-id order.
    pub fn iter(&self) -> impl Iterator<Item = &NurseStats> {
        self.entries.values()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<NurseStats> for StatsSnapshot {
    fn from_iter<I: IntoIterator<Item = NurseStats>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for stats in iter {
            snapshot.insert(stats);
        }
        snapshot
    }
}
