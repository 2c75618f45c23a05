//! Versioned engine tuning.
//!
//! Every constant table (category weights, multipliers, thresholds, score
//! weights) lives here and is passed into the engine explicitly, so two
//! tunings can be evaluated side by side. All sections default to the
//! production values and deserialize from partial TOML/JSON.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::category::TaskCategory;
use crate::error::EngineError;
use crate::time::parse_timezone;

pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub version: u32,
    /// IANA timezone used for "due today" and digest week boundaries.
    pub timezone: String,
    pub weights: WeightConfig,
    pub load: LoadConfig,
    pub scoring: ScoringWeights,
    pub rotation: RotationConfig,
    pub availability: AvailabilityConfig,
    pub reassignment: ReassignConfig,
    pub alerts: AlertConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            timezone: "UTC".to_string(),
            weights: WeightConfig::default(),
            load: LoadConfig::default(),
            scoring: ScoringWeights::default(),
            rotation: RotationConfig::default(),
            availability: AvailabilityConfig::default(),
            reassignment: ReassignConfig::default(),
            alerts: AlertConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Household timezone; falls back to UTC when the name does not parse
    /// (`validate` reports that case).
    pub fn tz(&self) -> Tz {
        parse_timezone(&self.timezone).unwrap_or(Tz::UTC)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.version != CONFIG_VERSION {
            return Err(EngineError::InvalidConfig(format!(
                "unsupported config version {} (expected {CONFIG_VERSION})",
                self.version
            )));
        }
        parse_timezone(&self.timezone)?;
        self.weights.validate()?;
        self.load.validate()?;
        self.scoring.validate()?;
        self.rotation.validate()?;
        self.availability.validate()?;
        self.reassignment.validate()?;
        self.alerts.validate()?;
        Ok(())
    }
}

fn positive(name: &str, value: f64) -> Result<(), EngineError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidConfig(format!("{name} must be positive, got {value}")))
    }
}

fn non_negative(name: &str, value: f64) -> Result<(), EngineError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidConfig(format!("{name} must be >= 0, got {value}")))
    }
}

/// Base weight per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryWeights {
    pub education: f64,
    pub health: f64,
    pub administrative: f64,
    pub daily: f64,
    pub social: f64,
    pub activities: f64,
    pub logistics: f64,
    pub other: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            education: 4.0,
            health: 4.0,
            administrative: 3.0,
            daily: 1.0,
            social: 2.0,
            activities: 2.0,
            logistics: 2.0,
            other: 1.0,
        }
    }
}

impl CategoryWeights {
    pub fn get(&self, category: TaskCategory) -> f64 {
        match category {
            TaskCategory::Education => self.education,
            TaskCategory::Health => self.health,
            TaskCategory::Administrative => self.administrative,
            TaskCategory::Daily => self.daily,
            TaskCategory::Social => self.social,
            TaskCategory::Activities => self.activities,
            TaskCategory::Logistics => self.logistics,
            TaskCategory::Other => self.other,
        }
    }
}

/// Weight model tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightConfig {
    pub base: CategoryWeights,
    pub priority_high: f64,
    pub priority_normal: f64,
    pub priority_low: f64,
    pub critical: f64,
    pub coordination: f64,
    pub recurrence_daily: f64,
    pub recurrence_weekly: f64,
    pub recurrence_other: f64,
    pub deadline_overdue: f64,
    pub deadline_due_today: f64,
    pub deadline_pressure: f64,
    pub deadline_none: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            base: CategoryWeights::default(),
            priority_high: 1.5,
            priority_normal: 1.0,
            priority_low: 0.7,
            critical: 2.0,
            coordination: 1.2,
            recurrence_daily: 0.6,
            recurrence_weekly: 0.8,
            recurrence_other: 0.9,
            deadline_overdue: 1.5,
            deadline_due_today: 1.3,
            deadline_pressure: 1.15,
            deadline_none: 1.0,
        }
    }
}

impl WeightConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        for category in TaskCategory::ALL {
            positive(&format!("weights.base.{category}"), self.base.get(category))?;
        }
        for (name, value) in [
            ("weights.priority_high", self.priority_high),
            ("weights.priority_normal", self.priority_normal),
            ("weights.priority_low", self.priority_low),
            ("weights.critical", self.critical),
            ("weights.coordination", self.coordination),
            ("weights.recurrence_daily", self.recurrence_daily),
            ("weights.recurrence_weekly", self.recurrence_weekly),
            ("weights.recurrence_other", self.recurrence_other),
            ("weights.deadline_none", self.deadline_none),
        ] {
            positive(name, value)?;
        }
        let ordered = self.deadline_overdue > self.deadline_due_today
            && self.deadline_due_today > self.deadline_pressure
            && self.deadline_pressure > self.deadline_none;
        if !ordered {
            return Err(EngineError::InvalidConfig(
                "deadline multipliers must strictly decrease: overdue > due_today > pressure > none"
                    .to_string(),
            ));
        }
        let discounts = self.recurrence_daily <= self.recurrence_weekly
            && self.recurrence_weekly <= self.recurrence_other
            && self.recurrence_other <= 1.0;
        if !discounts {
            return Err(EngineError::InvalidConfig(
                "recurrence discounts must satisfy daily <= weekly <= other <= 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    /// Age at which an entry reaches the floor.
    pub max_age_days: f64,
    pub floor: f64,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            max_age_days: 30.0,
            floor: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Relative change between window halves that counts as a trend.
    pub threshold: f64,
    pub min_data_points: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            threshold: 0.15,
            min_data_points: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FatigueConfig {
    pub window_days: f64,
    /// Daily load a member can sustain; a ratio of 1.0 maps to fatigue 50.
    pub sustainable_daily_load: f64,
    pub rested_below: f64,
    pub normal_below: f64,
    pub tired_below: f64,
    pub burnout_above: f64,
}

impl Default for FatigueConfig {
    fn default() -> Self {
        Self {
            window_days: 7.0,
            sustainable_daily_load: 3.0,
            rested_below: 20.0,
            normal_below: 50.0,
            tired_below: 70.0,
            burnout_above: 85.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub decay: DecayConfig,
    pub trend: TrendConfig,
    pub fatigue: FatigueConfig,
}

impl LoadConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        positive("load.decay.max_age_days", self.decay.max_age_days)?;
        if !(self.decay.floor > 0.0 && self.decay.floor <= 1.0) {
            return Err(EngineError::InvalidConfig(format!(
                "load.decay.floor must be in (0, 1], got {}",
                self.decay.floor
            )));
        }
        non_negative("load.trend.threshold", self.trend.threshold)?;
        positive("load.fatigue.window_days", self.fatigue.window_days)?;
        positive("load.fatigue.sustainable_daily_load", self.fatigue.sustainable_daily_load)?;
        let f = &self.fatigue;
        if !(f.rested_below < f.normal_below
            && f.normal_below < f.tired_below
            && f.tired_below <= f.burnout_above
            && f.burnout_above <= 100.0)
        {
            return Err(EngineError::InvalidConfig(
                "fatigue zones must be ordered rested < normal < tired <= burnout <= 100".to_string(),
            ));
        }
        Ok(())
    }
}

/// Weights of the six assignment score components. Must sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub load_balance: f64,
    pub category_preference: f64,
    pub skill_match: f64,
    pub availability: f64,
    pub rotation: f64,
    pub fatigue_avoidance: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            load_balance: 0.30,
            category_preference: 0.10,
            skill_match: 0.15,
            availability: 0.20,
            rotation: 0.15,
            fatigue_avoidance: 0.10,
        }
    }
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.load_balance
            + self.category_preference
            + self.skill_match
            + self.availability
            + self.rotation
            + self.fatigue_avoidance
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        positive("scoring.load_balance", self.load_balance)?;
        positive("scoring.category_preference", self.category_preference)?;
        positive("scoring.skill_match", self.skill_match)?;
        positive("scoring.availability", self.availability)?;
        positive("scoring.rotation", self.rotation)?;
        positive("scoring.fatigue_avoidance", self.fatigue_avoidance)?;
        let sum = self.sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(EngineError::InvalidConfig(format!(
                "scoring weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Maximum penalty for having just been picked for the category.
    pub recency_penalty: f64,
    /// Hours after which the recency penalty has fully worn off.
    pub recency_window_hours: f64,
    /// Maximum penalty for holding every pick of the category in this run.
    pub frequency_penalty: f64,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            recency_penalty: 60.0,
            recency_window_hours: 168.0,
            frequency_penalty: 40.0,
        }
    }
}

impl RotationConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        non_negative("rotation.recency_penalty", self.recency_penalty)?;
        non_negative("rotation.frequency_penalty", self.frequency_penalty)?;
        positive("rotation.recency_window_hours", self.recency_window_hours)?;
        if self.recency_penalty + self.frequency_penalty > 100.0 {
            return Err(EngineError::InvalidConfig(
                "rotation penalties must not exceed 100 combined".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvailabilityConfig {
    /// Share of capacity left free at which the availability score saturates.
    pub saturation: f64,
    /// Score for tasks outside the member's preferred categories.
    pub neutral_preference: f64,
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            saturation: 0.5,
            neutral_preference: 50.0,
        }
    }
}

impl AvailabilityConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.saturation > 0.0 && self.saturation <= 1.0) {
            return Err(EngineError::InvalidConfig(format!(
                "availability.saturation must be in (0, 1], got {}",
                self.saturation
            )));
        }
        if !(0.0..=100.0).contains(&self.neutral_preference) {
            return Err(EngineError::InvalidConfig(
                "availability.neutral_preference must be in [0, 100]".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReassignConfig {
    /// Load-point gap between most and least loaded member that triggers suggestions.
    pub imbalance_threshold: f64,
    pub max_suggestions: usize,
}

impl Default for ReassignConfig {
    fn default() -> Self {
        Self {
            imbalance_threshold: 5.0,
            max_suggestions: 5,
        }
    }
}

impl ReassignConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        non_negative("reassignment.imbalance_threshold", self.imbalance_threshold)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Balance score bands, descending.
    pub balanced_min: f64,
    pub mild_imbalance_min: f64,
    pub imbalance_min: f64,
    pub fatigue_warning: f64,
    pub fatigue_critical: f64,
    /// Minimum relative increase for a "sustained increase" alert.
    pub rising_trend_min_change: f64,
    /// Share above `fair share x factor` marks a load outlier.
    pub outlier_share_factor: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            balanced_min: 70.0,
            mild_imbalance_min: 50.0,
            imbalance_min: 30.0,
            fatigue_warning: 70.0,
            fatigue_critical: 85.0,
            rising_trend_min_change: 0.25,
            outlier_share_factor: 1.5,
        }
    }
}

impl AlertConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.balanced_min <= 100.0
            && self.balanced_min > self.mild_imbalance_min
            && self.mild_imbalance_min > self.imbalance_min
            && self.imbalance_min >= 0.0)
        {
            return Err(EngineError::InvalidConfig(
                "balance bands must be ordered 100 >= balanced > mild > imbalance >= 0".to_string(),
            ));
        }
        if self.fatigue_warning > self.fatigue_critical {
            return Err(EngineError::InvalidConfig(
                "fatigue_warning must not exceed fatigue_critical".to_string(),
            ));
        }
        if self.outlier_share_factor <= 1.0 {
            return Err(EngineError::InvalidConfig(
                "outlier_share_factor must be greater than 1".to_string(),
            ));
        }
        non_negative("alerts.rising_trend_min_change", self.rising_trend_min_change)
    }
}
