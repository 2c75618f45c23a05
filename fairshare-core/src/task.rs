//! Task description consumed by the weight model and the optimizer.
//!
//! Storage rows are mapped into `TaskWeightInput` by the caller. The engine
//! never mutates a task; builders return new values.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::TaskCategory;
use crate::error::EngineError;

/// Task priority as stored by the product: 1 = high, 2 = normal, 3 = low.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "PriorityRepr")]
pub enum TaskPriority {
    High = 1,
    #[default]
    Normal = 2,
    Low = 3,
}

impl TaskPriority {
    /// Map a numeric level, clamping anything outside 1..=3.
    pub fn from_level(level: i64) -> Self {
        match level {
            i64::MIN..=1 => TaskPriority::High,
            2 => TaskPriority::Normal,
            _ => TaskPriority::Low,
        }
    }

    pub fn level(&self) -> u8 {
        *self as u8
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskPriority::High => "high",
            TaskPriority::Normal => "normal",
            TaskPriority::Low => "low",
        }
    }
}

/// Storage rows carry either the numeric level or a name.
#[derive(Deserialize)]
#[serde(untagged)]
enum PriorityRepr {
    Level(i64),
    Name(String),
}

impl From<PriorityRepr> for TaskPriority {
    fn from(repr: PriorityRepr) -> Self {
        match repr {
            PriorityRepr::Level(level) => TaskPriority::from_level(level),
            PriorityRepr::Name(name) => match name.trim().to_lowercase().as_str() {
                "high" | "haute" | "urgent" => TaskPriority::High,
                "low" | "basse" => TaskPriority::Low,
                _ => TaskPriority::Normal,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Yearly,
    Custom,
}

impl RecurrencePattern {
    pub fn label(&self) -> &'static str {
        match self {
            RecurrencePattern::Daily => "daily",
            RecurrencePattern::Weekly => "weekly",
            RecurrencePattern::Biweekly => "biweekly",
            RecurrencePattern::Monthly => "monthly",
            RecurrencePattern::Yearly => "yearly",
            RecurrencePattern::Custom => "custom",
        }
    }
}

/// Immutable description of one task for weighting and assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskWeightInput {
    pub id: String,
    pub title: String,
    pub category: TaskCategory,

    #[serde(default)]
    pub priority: TaskPriority,

    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub is_critical: bool,
    #[serde(default)]
    pub requires_coordination: bool,
    #[serde(default)]
    pub has_deadline_pressure: bool,

    #[serde(default)]
    pub recurrence: Option<RecurrencePattern>,

    /// Optional hard deadline (UTC).
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,

    /// Skills a member needs; empty means anyone can do it.
    #[serde(default)]
    pub required_skills: BTreeSet<String>,
}

impl TaskWeightInput {
    pub fn new(id: impl Into<String>, title: impl Into<String>, category: TaskCategory) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category,
            priority: TaskPriority::Normal,
            is_recurring: false,
            is_critical: false,
            requires_coordination: false,
            has_deadline_pressure: false,
            recurrence: None,
            deadline: None,
            required_skills: BTreeSet::new(),
        }
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn critical(mut self) -> Self {
        self.is_critical = true;
        self
    }

    pub fn with_coordination(mut self) -> Self {
        self.requires_coordination = true;
        self
    }

    pub fn with_deadline_pressure(mut self) -> Self {
        self.has_deadline_pressure = true;
        self
    }

    pub fn recurring(mut self, pattern: RecurrencePattern) -> Self {
        self.is_recurring = true;
        self.recurrence = Some(pattern);
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_required_skill(mut self, skill: impl Into<String>) -> Self {
        self.required_skills.insert(skill.into());
        self
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.id.trim().is_empty() {
            return Err(EngineError::EmptyIdentifier("task id"));
        }
        Ok(())
    }
}
