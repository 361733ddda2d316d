//! Penalty weights for the solver objective.
//!
//! Each soft-constraint term of the objective is scaled by a weight looked
//! up by [`PenaltyKey`]. The feedback analyzer rewrites the weights between
//! iterations; nothing else mutates them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Soft-constraint term of the objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyKey {
    /// Any shift for a nurse in the high fatigue band.
    FatigueHigh,
    /// Any shift for a nurse in the moderate fatigue band.
    FatigueModerate,
    /// Weekend shift for a fatigued nurse.
    FatigueWeekend,
    /// Night shift for a fatigued nurse.
    FatigueNight,
    /// Each shift below a nurse's fair share.
    Underutilization,
    /// Each shift above a nurse's fair share.
    Overwork,
    /// Each weekend shift above the fair weekend share.
    WeekendExcess,
    /// Each night shift above the fair night share.
    NightExcess,
    /// Night shift for a nurse who avoids nights.
    AvoidNight,
    /// Shift on a nurse's preferred day (bonus, subtracted from cost).
    PreferredDay,
}

impl PenaltyKey {
    /// All keys, in declaration order.
    pub const ALL: [PenaltyKey; 10] = [
        Self::FatigueHigh,
        Self::FatigueModerate,
        Self::FatigueWeekend,
        Self::FatigueNight,
        Self::Underutilization,
        Self::Overwork,
        Self::WeekendExcess,
        Self::NightExcess,
        Self::AvoidNight,
        Self::PreferredDay,
    ];

    /// Stable snake_case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FatigueHigh => "fatigue_high",
            Self::FatigueModerate => "fatigue_moderate",
            Self::FatigueWeekend => "fatigue_weekend",
            Self::FatigueNight => "fatigue_night",
            Self::Underutilization => "underutilization",
            Self::Overwork => "overwork",
            Self::WeekendExcess => "weekend_excess",
            Self::NightExcess => "night_excess",
            Self::AvoidNight => "avoid_night",
            Self::PreferredDay => "preferred_day",
        }
    }

    /// Whether the term rewards rather than penalizes.
    pub fn is_bonus(self) -> bool {
        matches!(self, Self::PreferredDay)
    }

    /// Base weight.
    pub fn base_weight(self) -> f64 {
        match self {
            Self::FatigueHigh => 50.0,
            Self::FatigueModerate => 25.0,
            Self::FatigueWeekend => 30.0,
            Self::FatigueNight => 30.0,
            Self::Underutilization => 15.0,
            Self::Overwork => 10.0,
            Self::WeekendExcess => 30.0,
            Self::NightExcess => 30.0,
            Self::AvoidNight => 50.0,
            Self::PreferredDay => 5.0,
        }
    }
}

impl fmt::Display for PenaltyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping from penalty key to weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PenaltyConfig {
    weights: BTreeMap<PenaltyKey, f64>,
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self::base()
    }
}

impl PenaltyConfig {
    /// Base weights for every key.
    pub fn base() -> Self {
        Self {
            weights: PenaltyKey::ALL
                .iter()
                .map(|&k| (k, k.base_weight()))
                .collect(),
        }
    }

    /// A configuration with no weights (every term contributes zero).
    pub fn empty() -> Self {
        Self {
            weights: BTreeMap::new(),
        }
    }

    /// Sets a weight (builder form).
    pub fn with_weight(mut self, key: PenaltyKey, weight: f64) -> Self {
        self.set(key, weight);
        self
    }

    /// Weight for a key (0.0 when unset).
    #[inline]
    pub fn weight(&self, key: PenaltyKey) -> f64 {
        self.weights.get(&key).copied().unwrap_or(0.0)
    }

    /// Sets a weight. Negative and non-finite weights are stored as 0.0.
    pub fn set(&mut self, key: PenaltyKey, weight: f64) {
        let weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
        self.weights.insert(key, weight);
    }

    /// Iterates weights in key order.
    pub fn iter(&self) -> impl Iterator<Item = (PenaltyKey, f64)> + '_ {
        self.weights.iter().map(|(&k, &w)| (k, w))
    }

    /// Keys whose weight differs from `other` by more than `epsilon`.
    pub fn changed_keys(&self, other: &Self, epsilon: f64) -> Vec<PenaltyKey> {
        PenaltyKey::ALL
            .iter()
            .copied()
            .filter(|&k| (self.weight(k) - other.weight(k)).abs() > epsilon)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_weights() {
        let p = PenaltyConfig::base();
        assert!((p.weight(PenaltyKey::FatigueHigh) - 50.0).abs() < 1e-10);
        assert!((p.weight(PenaltyKey::Underutilization) - 15.0).abs() < 1e-10);
        assert!((p.weight(PenaltyKey::PreferredDay) - 5.0).abs() < 1e-10);
        assert_eq!(p.iter().count(), PenaltyKey::ALL.len());
    }

    #[test]
    fn test_set_sanitizes() {
        let mut p = PenaltyConfig::empty();
        p.set(PenaltyKey::Overwork, -3.0);
        p.set(PenaltyKey::NightExcess, f64::NAN);
        assert!((p.weight(PenaltyKey::Overwork) - 0.0).abs() < 1e-10);
        assert!((p.weight(PenaltyKey::NightExcess) - 0.0).abs() < 1e-10);
        assert!((p.weight(PenaltyKey::FatigueHigh) - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_changed_keys() {
        let a = PenaltyConfig::base();
        let b = PenaltyConfig::base().with_weight(PenaltyKey::Overwork, 15.0);
        assert_eq!(a.changed_keys(&b, 1e-9), vec![PenaltyKey::Overwork]);
        assert!(a.changed_keys(&a, 1e-9).is_empty());
    }

    #[test]
    fn test_serializes_as_named_map() {
        let p = PenaltyConfig::empty().with_weight(PenaltyKey::NightExcess, 45.0);
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#"{"night_excess":45.0}"#);

        let back: PenaltyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
