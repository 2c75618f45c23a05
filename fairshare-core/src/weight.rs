//! Weight model: converts a task into a comparable load weight.
//!
//! `adjusted = base(category) x priority x critical x coordination x
//! recurrence x deadline`. Every multiplier is its own pure function; the
//! explanation lists the non-neutral ones in that same order.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::config::WeightConfig;
use crate::task::{RecurrencePattern, TaskPriority, TaskWeightInput};
use crate::time::local_day;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightResult {
    pub base_weight: f64,
    /// Full precision; use `display_weight` for UI.
    pub adjusted_weight: f64,
    pub explanation: Vec<String>,
}

impl WeightResult {
    /// Adjusted weight rounded to one decimal.
    pub fn display_weight(&self) -> f64 {
        (self.adjusted_weight * 10.0).round() / 10.0
    }
}

/// Urgency bucket of a task relative to `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeadlinePressure {
    Overdue,
    DueToday,
    Pressure,
    None,
}

impl DeadlinePressure {
    pub fn classify(task: &TaskWeightInput, now: DateTime<Utc>, tz: Tz) -> Self {
        if let Some(deadline) = task.deadline {
            if deadline < now {
                return DeadlinePressure::Overdue;
            }
            if local_day(deadline, tz) == local_day(now, tz) {
                return DeadlinePressure::DueToday;
            }
        }
        if task.has_deadline_pressure {
            DeadlinePressure::Pressure
        } else {
            DeadlinePressure::None
        }
    }

    fn label(&self) -> &'static str {
        match self {
            DeadlinePressure::Overdue => "overdue",
            DeadlinePressure::DueToday => "due today",
            DeadlinePressure::Pressure => "approaching",
            DeadlinePressure::None => "none",
        }
    }
}

pub fn priority_multiplier(priority: TaskPriority, cfg: &WeightConfig) -> f64 {
    match priority {
        TaskPriority::High => cfg.priority_high,
        TaskPriority::Normal => cfg.priority_normal,
        TaskPriority::Low => cfg.priority_low,
    }
}

pub fn critical_multiplier(is_critical: bool, cfg: &WeightConfig) -> f64 {
    if is_critical { cfg.critical } else { 1.0 }
}

pub fn coordination_multiplier(requires_coordination: bool, cfg: &WeightConfig) -> f64 {
    if requires_coordination { cfg.coordination } else { 1.0 }
}

/// Established routines cost less per occurrence.
pub fn recurrence_multiplier(
    is_recurring: bool,
    pattern: Option<RecurrencePattern>,
    cfg: &WeightConfig,
) -> f64 {
    if !is_recurring {
        return 1.0;
    }
    match pattern {
        Some(RecurrencePattern::Daily) => cfg.recurrence_daily,
        Some(RecurrencePattern::Weekly) => cfg.recurrence_weekly,
        _ => cfg.recurrence_other,
    }
}

pub fn deadline_multiplier(pressure: DeadlinePressure, cfg: &WeightConfig) -> f64 {
    match pressure {
        DeadlinePressure::Overdue => cfg.deadline_overdue,
        DeadlinePressure::DueToday => cfg.deadline_due_today,
        DeadlinePressure::Pressure => cfg.deadline_pressure,
        DeadlinePressure::None => cfg.deadline_none,
    }
}

/// Signed percentage label, e.g. 1.5 -> "+50%", 0.7 -> "-30%".
fn pct(multiplier: f64) -> String {
    let delta = ((multiplier - 1.0) * 100.0).round() as i64;
    if delta >= 0 {
        format!("+{delta}%")
    } else {
        format!("{delta}%")
    }
}

fn is_neutral(multiplier: f64) -> bool {
    (multiplier - 1.0).abs() < 1e-9
}

/// Compute the load weight of a task. Pure: same task and `now` always give
/// the same result.
pub fn compute_weight(
    task: &TaskWeightInput,
    now: DateTime<Utc>,
    cfg: &WeightConfig,
    tz: Tz,
) -> WeightResult {
    let base_weight = cfg.base.get(task.category);
    let mut adjusted = base_weight;
    let mut explanation = Vec::new();

    let m = priority_multiplier(task.priority, cfg);
    adjusted *= m;
    if !is_neutral(m) {
        explanation.push(format!("Priority: {} ({})", task.priority.label(), pct(m)));
    }

    let m = critical_multiplier(task.is_critical, cfg);
    adjusted *= m;
    if !is_neutral(m) {
        explanation.push(format!("Critical ({})", pct(m)));
    }

    let m = coordination_multiplier(task.requires_coordination, cfg);
    adjusted *= m;
    if !is_neutral(m) {
        explanation.push(format!("Coordination required ({})", pct(m)));
    }

    let m = recurrence_multiplier(task.is_recurring, task.recurrence, cfg);
    adjusted *= m;
    if !is_neutral(m) {
        let label = task.recurrence.map(|p| p.label()).unwrap_or("recurring");
        explanation.push(format!("Recurring: {label} ({})", pct(m)));
    }

    let pressure = DeadlinePressure::classify(task, now, tz);
    let m = deadline_multiplier(pressure, cfg);
    adjusted *= m;
    if !is_neutral(m) {
        explanation.push(format!("Deadline: {} ({})", pressure.label(), pct(m)));
    }

    WeightResult {
        base_weight,
        adjusted_weight: adjusted,
        explanation,
    }
}
