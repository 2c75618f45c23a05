//! Historical load log supplied by the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::TaskCategory;
use crate::error::{EngineError, check_weight};

/// One task event for a member. The weight is already resolved by the
/// caller (usually the stored output of the weight model).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalLoadEntry {
    pub date: DateTime<Utc>,
    pub member_id: String,
    pub task_id: String,
    pub category: TaskCategory,
    pub weight: f64,
    #[serde(default = "completed_by_default")]
    pub completed: bool,
}

fn completed_by_default() -> bool {
    true
}

impl HistoricalLoadEntry {
    pub fn new(
        date: DateTime<Utc>,
        member_id: impl Into<String>,
        task_id: impl Into<String>,
        category: TaskCategory,
        weight: f64,
    ) -> Self {
        Self {
            date,
            member_id: member_id.into(),
            task_id: task_id.into(),
            category,
            weight,
            completed: true,
        }
    }

    pub fn pending(mut self) -> Self {
        self.completed = false;
        self
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.member_id.trim().is_empty() {
            return Err(EngineError::EmptyIdentifier("history member_id"));
        }
        check_weight(self.weight, || {
            format!("history entry {} of member {}", self.task_id, self.member_id)
        })
    }
}

/// Validate a whole log, failing on the first malformed entry.
pub fn validate_history(entries: &[HistoricalLoadEntry]) -> Result<(), EngineError> {
    entries.iter().try_for_each(HistoricalLoadEntry::validate)
}
