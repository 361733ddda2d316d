//! Shift model.
//!
//! A shift is a ward time slot that needs `headcount` nurses holding the
//! required certifications at or above a minimum seniority level.
//!
//! # Time Model
//! Timestamps are ward-local wall-clock `NaiveDateTime`s. A shift's end may
//! fall on the following day (overnight shifts). Shift intervals are
//! half-open: `[start, end)`.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::SeniorityLevel;

/// A shift to be staffed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shift {
    /// Unique shift identifier.
    pub id: String,
    /// Ward name (e.g., "ICU", "Emergency").
    pub ward: String,
    /// Shift start (inclusive).
    pub start: NaiveDateTime,
    /// Shift end (exclusive).
    pub end: NaiveDateTime,
    /// Certifications every assigned nurse must hold.
    #[serde(default)]
    pub required_certifications: BTreeSet<String>,
    /// Minimum seniority of every assigned nurse.
    pub min_seniority: SeniorityLevel,
    /// Number of nurses required (default: 1).
    #[serde(default = "default_headcount")]
    pub headcount: u32,
}

fn default_headcount() -> u32 {
    1
}

/// Hours of the day that classify a shift start as a night shift.
///
/// A start hour `h` is a night start iff `h >= start_hour || h < end_hour`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NightWindow {
    /// First night hour (default: 20).
    pub start_hour: u32,
    /// First hour after the night window (default: 6).
    pub end_hour: u32,
}

impl Default for NightWindow {
    fn default() -> Self {
        Self {
            start_hour: 20,
            end_hour: 6,
        }
    }
}

impl NightWindow {
    /// Whether an hour of day falls in the night window.
    #[inline]
    pub fn contains_hour(&self, hour: u32) -> bool {
        hour >= self.start_hour || hour < self.end_hour
    }
}

impl Shift {
    /// Creates a single-nurse shift with no certification requirement.
    pub fn new(
        id: impl Into<String>,
        ward: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            ward: ward.into(),
            start,
            end,
            required_certifications: BTreeSet::new(),
            min_seniority: SeniorityLevel::Junior,
            headcount: 1,
        }
    }

    /// Adds a required certification.
    pub fn requiring(mut self, cert: impl Into<String>) -> Self {
        self.required_certifications.insert(cert.into());
        self
    }

    /// Sets the minimum seniority.
    pub fn with_min_seniority(mut self, level: SeniorityLevel) -> Self {
        self.min_seniority = level;
        self
    }

    /// Sets the number of nurses required.
    pub fn with_headcount(mut self, headcount: u32) -> Self {
        self.headcount = headcount;
        self
    }

    /// Duration in minutes.
    #[inline]
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Duration in hours.
    #[inline]
    pub fn duration_hours(&self) -> f64 {
        self.duration_minutes() as f64 / 60.0
    }

    /// Calendar date the shift starts on.
    #[inline]
    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    /// Weekday the shift starts on.
    #[inline]
    pub fn weekday(&self) -> Weekday {
        self.start.weekday()
    }

    /// Whether the shift starts on a Saturday or Sunday.
    pub fn is_weekend(&self) -> bool {
        matches!(self.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// Whether the shift starts inside the night window.
    pub fn is_night(&self, window: &NightWindow) -> bool {
        window.contains_hour(self.start.hour())
    }

    /// Whether two shifts overlap in time.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Rest between two non-overlapping shifts, in minutes.
    ///
    /// Returns `None` if the shifts overlap.
    pub fn rest_minutes_between(&self, other: &Self) -> Option<i64> {
        if self.overlaps(other) {
            return None;
        }
        let (earlier, later) = if self.start <= other.start {
            (self, other)
        } else {
            (other, self)
        };
        Some((later.start - earlier.end).num_minutes())
    }

    /// Whether a nurse at `level` meets the minimum seniority.
    #[inline]
    pub fn admits_level(&self, level: SeniorityLevel) -> bool {
        level >= self.min_seniority
    }
}
