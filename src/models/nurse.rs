//! Nurse model.
//!
//! Nurses are the resources a roster assigns to shifts. Each nurse has a
//! certification set, a seniority level, a contract type that bounds weekly
//! hours, and personal preferences.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A nurse that can be assigned to shifts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nurse {
    /// Unique nurse identifier.
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Certifications held (e.g., "ICU", "ACLS", "BLS").
    #[serde(default)]
    pub certifications: BTreeSet<String>,
    /// Seniority level.
    pub seniority: SeniorityLevel,
    /// Contract type (determines the weekly hour cap).
    pub contract: ContractType,
    /// Scheduling preferences.
    #[serde(default)]
    pub preferences: NursePreferences,
}

/// Seniority level, ordered `Junior < Mid < Senior`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeniorityLevel {
    Junior,
    Mid,
    Senior,
}

/// Employment contract type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    FullTime,
    PartTime,
    Casual,
}

impl ContractType {
    /// Weekly hour cap used when no rules override is configured.
    pub fn default_max_weekly_hours(self) -> u32 {
        match self {
            Self::FullTime => 40,
            Self::PartTime => 30,
            Self::Casual => 20,
        }
    }
}

/// Personal scheduling preferences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NursePreferences {
    /// Prefers not to work night shifts (soft).
    #[serde(default)]
    pub avoid_night: bool,
    /// Days the nurse prefers to work (soft). Empty = no preference.
    #[serde(default)]
    pub preferred_days: Vec<Weekday>,
    /// Ad-hoc time-off dates (hard: never scheduled on these dates).
    #[serde(default)]
    pub unavailable_dates: BTreeSet<NaiveDate>,
}

impl Nurse {
    /// Creates a nurse with no certifications and no preferences.
    pub fn new(id: impl Into<String>, seniority: SeniorityLevel, contract: ContractType) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            certifications: BTreeSet::new(),
            seniority,
            contract,
            preferences: NursePreferences::default(),
        }
    }

    /// Sets the nurse name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a certification.
    pub fn with_certification(mut self, cert: impl Into<String>) -> Self {
        self.certifications.insert(cert.into());
        self
    }

    /// Marks the nurse as preferring to avoid night shifts.
    pub fn avoiding_nights(mut self) -> Self {
        self.preferences.avoid_night = true;
        self
    }

    /// Adds a preferred working day.
    pub fn with_preferred_day(mut self, day: Weekday) -> Self {
        if !self.preferences.preferred_days.contains(&day) {
            self.preferences.preferred_days.push(day);
        }
        self
    }

    /// Adds an ad-hoc unavailable date.
    pub fn with_unavailable_date(mut self, date: NaiveDate) -> Self {
        self.preferences.unavailable_dates.insert(date);
        self
    }

    /// Whether the nurse holds every certification in `required`.
    pub fn has_certifications(&self, required: &BTreeSet<String>) -> bool {
        required.is_subset(&self.certifications)
    }

    /// Certifications in `required` that the nurse lacks.
    pub fn missing_certifications<'a>(&'a self, required: &'a BTreeSet<String>) -> Vec<&'a str> {
        required
            .difference(&self.certifications)
            .map(String::as_str)
            .collect()
    }

    /// Whether the nurse is unavailable on `date`.
    pub fn is_unavailable_on(&self, date: NaiveDate) -> bool {
        self.preferences.unavailable_dates.contains(&date)
    }

    /// Whether `day` is one of the nurse's preferred days.
    pub fn prefers_day(&self, day: Weekday) -> bool {
        self.preferences.preferred_days.contains(&day)
    }

    /// Whether the nurse is senior.
    #[inline]
    pub fn is_senior(&self) -> bool {
        self.seniority == SeniorityLevel::Senior
    }
}
