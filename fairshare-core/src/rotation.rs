//! Rotation tracker: per-run memory of who took each category.
//!
//! The tracker only feeds the rotation component of the assignment score;
//! eligibility never reads it. It is plain data and not internally
//! synchronized, so use one tracker per concurrent planning run. Callers who
//! want rotation to survive between runs serialize it and hand it back.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::TaskCategory;
use crate::config::RotationConfig;
use crate::member::MemberAvailability;
use crate::time::hours_between;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRotation {
    pub last_member: String,
    pub last_at: DateTime<Utc>,
    /// Picks per member within this run.
    pub picks: BTreeMap<String, u32>,
}

impl CategoryRotation {
    pub fn total_picks(&self) -> u32 {
        self.picks.values().sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationTracker {
    categories: BTreeMap<TaskCategory, CategoryRotation>,
}

impl RotationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `member_id` was assigned a task of `category` at `at`.
    pub fn record(&mut self, category: TaskCategory, member_id: &str, at: DateTime<Utc>) {
        let slot = self
            .categories
            .entry(category)
            .or_insert_with(|| CategoryRotation {
                last_member: member_id.to_string(),
                last_at: at,
                picks: BTreeMap::new(),
            });
        slot.last_member = member_id.to_string();
        slot.last_at = at;
        *slot.picks.entry(member_id.to_string()).or_default() += 1;
    }

    pub fn get(&self, category: TaskCategory) -> Option<&CategoryRotation> {
        self.categories.get(&category)
    }

    pub fn last_assignee(&self, category: TaskCategory) -> Option<&str> {
        self.categories.get(&category).map(|c| c.last_member.as_str())
    }

    pub fn picks(&self, category: TaskCategory, member_id: &str) -> u32 {
        self.categories
            .get(&category)
            .and_then(|c| c.picks.get(member_id).copied())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Forget everything; used between planning cycles.
    pub fn reset(&mut self) {
        self.categories.clear();
    }

    /// Rotation score in [0, 100]: 100 unless the member was the tracker's
    /// last pick for this category or holds a share of its picks.
    ///
    /// Recency penalty falls linearly to zero over `recency_window_hours`.
    /// Without a tracker record, the member's durable `last_assigned`
    /// timestamp supplies the recency term.
    pub fn score(
        &self,
        member: &MemberAvailability,
        category: TaskCategory,
        now: DateTime<Utc>,
        cfg: &RotationConfig,
    ) -> f64 {
        let recency = |since: DateTime<Utc>| {
            let elapsed = hours_between(since, now) / cfg.recency_window_hours;
            cfg.recency_penalty * (1.0 - elapsed).clamp(0.0, 1.0)
        };

        let penalty = match self.categories.get(&category) {
            Some(rotation) => {
                let recency_part = if rotation.last_member == member.id {
                    recency(rotation.last_at)
                } else {
                    0.0
                };
                let total = rotation.total_picks();
                let frequency_part = if total > 0 {
                    let mine = rotation.picks.get(&member.id).copied().unwrap_or(0);
                    cfg.frequency_penalty * f64::from(mine) / f64::from(total)
                } else {
                    0.0
                };
                recency_part + frequency_part
            }
            None => member
                .last_assigned
                .get(&category)
                .map(|at| recency(*at))
                .unwrap_or(0.0),
        };

        (100.0 - penalty).clamp(0.0, 100.0)
    }
}
