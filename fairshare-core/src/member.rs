//! Assignment-time member profiles.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::TaskCategory;
use crate::error::EngineError;
use crate::load::{HouseholdMember, UserLoadSummary};

/// A date range during which a member takes no new assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl ExclusionPeriod {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Inclusive on both ends.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberAvailability {
    pub id: String,
    pub name: String,
    /// Includes pending assigned-but-incomplete tasks.
    pub current_load: f64,
    pub max_weekly_load: f64,
    #[serde(default)]
    pub preferred_categories: BTreeSet<TaskCategory>,
    #[serde(default)]
    pub blocked_categories: BTreeSet<TaskCategory>,
    #[serde(default)]
    pub skills: BTreeSet<String>,
    #[serde(default)]
    pub exclusion_periods: Vec<ExclusionPeriod>,
    /// Durable rotation memory re-supplied by the caller.
    #[serde(default)]
    pub last_assigned: BTreeMap<TaskCategory, DateTime<Utc>>,
    /// 0-100.
    #[serde(default)]
    pub fatigue_level: f64,
}

impl MemberAvailability {
    pub fn new(id: impl Into<String>, name: impl Into<String>, current_load: f64, max_weekly_load: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            current_load,
            max_weekly_load,
            preferred_categories: BTreeSet::new(),
            blocked_categories: BTreeSet::new(),
            skills: BTreeSet::new(),
            exclusion_periods: Vec::new(),
            last_assigned: BTreeMap::new(),
            fatigue_level: 0.0,
        }
    }

    pub fn prefers(mut self, category: TaskCategory) -> Self {
        self.preferred_categories.insert(category);
        self
    }

    pub fn blocks(mut self, category: TaskCategory) -> Self {
        self.blocked_categories.insert(category);
        self
    }

    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.skills.insert(skill.into());
        self
    }

    pub fn with_exclusion(mut self, period: ExclusionPeriod) -> Self {
        self.exclusion_periods.push(period);
        self
    }

    pub fn with_fatigue(mut self, level: f64) -> Self {
        self.fatigue_level = level;
        self
    }

    pub fn with_last_assigned(mut self, category: TaskCategory, at: DateTime<Utc>) -> Self {
        self.last_assigned.insert(category, at);
        self
    }

    /// Refresh load and fatigue from a freshly computed summary.
    pub fn with_summary(mut self, summary: &UserLoadSummary) -> Self {
        self.current_load = summary.current_load;
        self.fatigue_level = summary.fatigue_level;
        self
    }

    pub fn household_member(&self) -> HouseholdMember {
        HouseholdMember::new(self.id.clone(), self.name.clone())
    }

    pub fn active_exclusion(&self, at: DateTime<Utc>) -> Option<&ExclusionPeriod> {
        self.exclusion_periods.iter().find(|p| p.contains(at))
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.id.trim().is_empty() {
            return Err(EngineError::EmptyIdentifier("member id"));
        }
        let field = |field: &'static str, value: f64| EngineError::InvalidMemberField {
            member_id: self.id.clone(),
            field,
            value,
        };
        if !(self.current_load.is_finite() && self.current_load >= 0.0) {
            return Err(field("current_load", self.current_load));
        }
        if !(self.max_weekly_load.is_finite() && self.max_weekly_load > 0.0) {
            return Err(field("max_weekly_load", self.max_weekly_load));
        }
        if !(0.0..=100.0).contains(&self.fatigue_level) {
            return Err(field("fatigue_level", self.fatigue_level));
        }
        if let Some(category) = self
            .preferred_categories
            .intersection(&self.blocked_categories)
            .next()
        {
            return Err(EngineError::OverlappingCategories {
                member_id: self.id.clone(),
                category: category.to_string(),
            });
        }
        if self.exclusion_periods.iter().any(|p| p.end < p.start) {
            return Err(EngineError::InvertedExclusion {
                member_id: self.id.clone(),
            });
        }
        Ok(())
    }
}

/// Validate every member and reject duplicate ids.
pub fn validate_roster(roster: &[MemberAvailability]) -> Result<(), EngineError> {
    let mut seen = HashSet::new();
    for m in roster {
        m.validate()?;
        if !seen.insert(m.id.as_str()) {
            return Err(EngineError::DuplicateMember(m.id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    #[test]
    fn exclusion_bounds_are_inclusive() {
        let p = ExclusionPeriod::new(now(), now() + Duration::days(2)).with_reason("travel");
        assert!(p.contains(now()));
        assert!(p.contains(now() + Duration::days(2)));
        assert!(!p.contains(now() + Duration::days(3)));
    }

    #[test]
    fn preferred_and_blocked_must_be_disjoint() {
        let m = MemberAvailability::new("alex", "Alex", 0.0, 20.0)
            .prefers(TaskCategory::Daily)
            .blocks(TaskCategory::Daily);
        assert!(matches!(m.validate(), Err(EngineError::OverlappingCategories { .. })));
    }

    #[test]
    fn numeric_fields_are_checked() {
        let negative = MemberAvailability::new("alex", "Alex", -1.0, 20.0);
        assert!(negative.validate().is_err());
        let no_capacity = MemberAvailability::new("alex", "Alex", 0.0, 0.0);
        assert!(no_capacity.validate().is_err());
        let nan_fatigue = MemberAvailability::new("alex", "Alex", 0.0, 10.0).with_fatigue(f64::NAN);
        assert!(nan_fatigue.validate().is_err());
    }

    #[test]
    fn inverted_exclusion_is_rejected() {
        let m = MemberAvailability::new("alex", "Alex", 0.0, 20.0)
            .with_exclusion(ExclusionPeriod::new(now(), now() - Duration::days(1)));
        assert_eq!(
            m.validate(),
            Err(EngineError::InvertedExclusion { member_id: "alex".to_string() })
        );
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let roster = vec![
            MemberAvailability::new("alex", "Alex", 0.0, 20.0),
            MemberAvailability::new("alex", "Alexandra", 0.0, 20.0),
        ];
        assert_eq!(validate_roster(&roster), Err(EngineError::DuplicateMember("alex".to_string())));
    }

    #[test]
    fn category_sets_parse_from_french_labels() {
        let m: MemberAvailability = serde_json::from_str(
            r#"{"id":"kim","name":"Kim","current_load":3,"max_weekly_load":20,
                "blocked_categories":["administratif"],"preferred_categories":["quotidien"]}"#,
        )
        .unwrap();
        assert!(m.blocked_categories.contains(&TaskCategory::Administrative));
        assert!(m.preferred_categories.contains(&TaskCategory::Daily));
        m.validate().unwrap();
    }
}
