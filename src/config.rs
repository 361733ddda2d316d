//! Configuration.
//!
//! Hard-rule thresholds ([`RulesConfig`]) are part of the frozen input
//! snapshot. Loop behavior ([`LoopConfig`]) covers the iteration cap, solver
//! budget, and feedback tuning. Every struct has defaults and accepts
//! partial TOML documents.
//!
//! ```
//! use u_roster::config::LoopConfig;
//!
//! let config = LoopConfig::from_toml_str(r#"
//!     max_iterations = 5
//!
//!     [feedback]
//!     decay_factor = 0.5
//! "#).unwrap();
//! assert_eq!(config.max_iterations, 5);
//! assert_eq!(config.solver.timeout_ms, 5_000);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::RosterError;
use crate::models::{ContractType, NightWindow};

/// Hard-rule and fairness thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Maximum shifts in one consecutive run.
    pub max_consecutive_shifts: u32,
    /// Minimum rest between two shifts of the same nurse (hours).
    pub min_rest_hours: u32,
    /// Weekly hour caps by contract type.
    pub hour_caps: HourCaps,
    /// Every start-time period needs a senior nurse when one is eligible.
    pub require_senior_presence: bool,
    /// Night shift classification.
    pub night: NightWindow,
    /// Fatigue bands used by the objective.
    pub fatigue: FatigueBands,
    /// Fairness check thresholds.
    pub fairness: FairnessThresholds,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            max_consecutive_shifts: 3,
            min_rest_hours: 10,
            hour_caps: HourCaps::default(),
            require_senior_presence: true,
            night: NightWindow::default(),
            fatigue: FatigueBands::default(),
            fairness: FairnessThresholds::default(),
        }
    }
}

/// Weekly hour caps per contract type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HourCaps {
    pub full_time: u32,
    pub part_time: u32,
    pub casual: u32,
}

impl Default for HourCaps {
    fn default() -> Self {
        Self {
            full_time: ContractType::FullTime.default_max_weekly_hours(),
            part_time: ContractType::PartTime.default_max_weekly_hours(),
            casual: ContractType::Casual.default_max_weekly_hours(),
        }
    }
}

impl HourCaps {
    /// Cap for a contract type, in hours.
    pub fn for_contract(&self, contract: ContractType) -> u32 {
        match contract {
            ContractType::FullTime => self.full_time,
            ContractType::PartTime => self.part_time,
            ContractType::Casual => self.casual,
        }
    }

    /// Cap for a contract type, in minutes.
    #[inline]
    pub fn minutes_for(&self, contract: ContractType) -> i64 {
        i64::from(self.for_contract(contract)) * 60
    }
}

/// Fatigue score bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FatigueBands {
    /// Lower bound of the high band.
    pub high: f64,
    /// Lower bound of the moderate band.
    pub moderate: f64,
}

impl Default for FatigueBands {
    fn default() -> Self {
        Self {
            high: 0.8,
            moderate: 0.5,
        }
    }
}

/// Thresholds checked by the fairness pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FairnessThresholds {
    /// Allowed distance of a nurse's shift count from the mean.
    pub max_shift_deviation: f64,
    /// Night shifts per nurse above which nights are concentrated.
    pub max_night_shifts: u32,
    /// Weekend shifts per nurse above which weekends are concentrated.
    pub max_weekend_shifts: u32,
    /// Projected fatigue at or above which a working nurse is at burnout risk.
    pub burnout_fatigue: f64,
    /// Minimum roster-wide preference satisfaction rate.
    pub min_preference_rate: f64,
    /// Population variance of shift counts above which the roster is uneven.
    pub max_shift_variance: f64,
    /// Population variance of night counts above which nights are uneven.
    pub max_night_variance: f64,
    /// Population variance of weekend counts above which weekends are uneven.
    pub max_weekend_variance: f64,
}

impl Default for FairnessThresholds {
    fn default() -> Self {
        Self {
            max_shift_deviation: 2.0,
            max_night_shifts: 2,
            max_weekend_shifts: 1,
            burnout_fatigue: 0.7,
            min_preference_rate: 0.8,
            max_shift_variance: 2.0,
            max_night_variance: 1.0,
            max_weekend_variance: 1.0,
        }
    }
}

/// Penalty adjustment between iterations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Multiplier for weights touched by an unresolved issue.
    pub escalation_factor: f64,
    /// Multiplier pulling untouched weights back toward their base.
    pub decay_factor: f64,
    /// Ceiling as a multiple of the base weight.
    pub max_multiplier: f64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            escalation_factor: 1.5,
            decay_factor: 0.75,
            max_multiplier: 4.0,
        }
    }
}

/// Solver budget and search parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Wall-clock budget per solve (ms).
    pub timeout_ms: u64,
    /// Search node budget for the feasibility phase.
    pub max_nodes: u64,
    /// Seed for the randomized improvement phase.
    pub seed: u64,
    /// Maximum reassignment sweeps.
    pub improvement_passes: u32,
    /// Random swap attempts after the sweeps.
    pub swap_attempts: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            max_nodes: 500_000,
            seed: 0x5EED,
            improvement_passes: 8,
            swap_attempts: 2_000,
        }
    }
}

/// Refinement loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Iteration cap.
    pub max_iterations: u32,
    /// Solve retries after a timeout within one iteration.
    pub timeout_retries: u32,
    /// Run the compliance and fairness checks on separate threads.
    pub parallel_validation: bool,
    /// Solver parameters.
    pub solver: SolverConfig,
    /// Feedback tuning.
    pub feedback: FeedbackConfig,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            timeout_retries: 1,
            parallel_validation: true,
            solver: SolverConfig::default(),
            feedback: FeedbackConfig::default(),
        }
    }
}

impl RulesConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, RosterError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects inconsistent thresholds.
    pub fn validate(&self) -> Result<(), RosterError> {
        if self.max_consecutive_shifts == 0 {
            return Err(RosterError::Config(
                "max_consecutive_shifts must be at least 1".into(),
            ));
        }
        if self.night.start_hour > 23 || self.night.end_hour > 23 {
            return Err(RosterError::Config("night window hours must be 0..=23".into()));
        }
        let bands = self.fatigue;
        if !(0.0..=1.0).contains(&bands.moderate)
            || !(0.0..=1.0).contains(&bands.high)
            || bands.moderate > bands.high
        {
            return Err(RosterError::Config(format!(
                "fatigue bands must satisfy 0 <= moderate ({}) <= high ({}) <= 1",
                bands.moderate, bands.high
            )));
        }
        let f = self.fairness;
        if f.max_shift_deviation < 0.0 {
            return Err(RosterError::Config("max_shift_deviation must be >= 0".into()));
        }
        if [f.max_shift_variance, f.max_night_variance, f.max_weekend_variance]
            .iter()
            .any(|v| *v < 0.0)
        {
            return Err(RosterError::Config("variance thresholds must be >= 0".into()));
        }
        if !(0.0..=1.0).contains(&f.burnout_fatigue)
            || !(0.0..=1.0).contains(&f.min_preference_rate)
        {
            return Err(RosterError::Config(
                "burnout_fatigue and min_preference_rate must lie in [0, 1]".into(),
            ));
        }
        Ok(())
    }
}

impl LoopConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, RosterError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects inconsistent settings.
    pub fn validate(&self) -> Result<(), RosterError> {
        if self.max_iterations == 0 {
            return Err(RosterError::Config("max_iterations must be at least 1".into()));
        }
        if self.solver.timeout_ms == 0 {
            return Err(RosterError::Config("solver.timeout_ms must be positive".into()));
        }
        let fb = self.feedback;
        if fb.escalation_factor < 1.0 {
            return Err(RosterError::Config(format!(
                "escalation_factor must be >= 1.0, got {}",
                fb.escalation_factor
            )));
        }
        if !(fb.decay_factor > 0.0 && fb.decay_factor <= 1.0) {
            return Err(RosterError::Config(format!(
                "decay_factor must lie in (0, 1], got {}",
                fb.decay_factor
            )));
        }
        if fb.max_multiplier < 1.0 {
            return Err(RosterError::Config(format!(
                "max_multiplier must be >= 1.0, got {}",
                fb.max_multiplier
            )));
        }
        Ok(())
    }
}
