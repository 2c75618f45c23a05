//! Household engine: one validated config wired to every engine operation.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::alerts::{BalanceStatus, analyze};
use crate::config::EngineConfig;
use crate::digest::{WeeklyDigest, weekly_digest};
use crate::error::EngineError;
use crate::history::HistoricalLoadEntry;
use crate::load::{HouseholdMember, UserLoadSummary, summarize_household};
use crate::member::MemberAvailability;
use crate::optimizer::{
    AssignmentDecision, AssignmentRequest, BatchOutcome, assign_batch, find_optimal_assignee,
};
use crate::reassign::{CurrentAssignment, ReassignmentSuggestion, suggest_reassignments};
use crate::rotation::RotationTracker;
use crate::task::TaskWeightInput;
use crate::weight::{WeightResult, compute_weight};

/// Stateless apart from its config; safe to share across threads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HouseholdEngine {
    config: EngineConfig,
}

impl HouseholdEngine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        debug!(version = config.version, timezone = %config.timezone, "engine configured");
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn weigh(&self, task: &TaskWeightInput, now: DateTime<Utc>) -> WeightResult {
        compute_weight(task, now, &self.config.weights, self.config.tz())
    }

    pub fn summarize(
        &self,
        roster: &[HouseholdMember],
        history: &[HistoricalLoadEntry],
        now: DateTime<Utc>,
    ) -> Result<Vec<UserLoadSummary>, EngineError> {
        summarize_household(roster, history, now, &self.config.load)
    }

    /// Refresh each member's load and fatigue from history, keeping the
    /// profile fields the caller supplied.
    pub fn refresh_roster(
        &self,
        roster: &[MemberAvailability],
        history: &[HistoricalLoadEntry],
        now: DateTime<Utc>,
    ) -> Result<Vec<MemberAvailability>, EngineError> {
        let ids: Vec<HouseholdMember> = roster.iter().map(|m| m.household_member()).collect();
        let summaries = self.summarize(&ids, history, now)?;
        Ok(roster
            .iter()
            .zip(&summaries)
            .map(|(m, s)| m.clone().with_summary(s))
            .collect())
    }

    pub fn assign(
        &self,
        task: &TaskWeightInput,
        roster: &[MemberAvailability],
        tracker: &RotationTracker,
        forced: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<AssignmentDecision, EngineError> {
        find_optimal_assignee(task, roster, tracker, forced, now, &self.config)
    }

    pub fn assign_batch(
        &self,
        requests: &[AssignmentRequest],
        roster: &[MemberAvailability],
        tracker: RotationTracker,
        now: DateTime<Utc>,
    ) -> Result<BatchOutcome, EngineError> {
        assign_batch(requests, roster, tracker, now, &self.config)
    }

    pub fn suggest_reassignments(
        &self,
        assignments: &[CurrentAssignment],
        roster: &[MemberAvailability],
        now: DateTime<Utc>,
    ) -> Result<Vec<ReassignmentSuggestion>, EngineError> {
        suggest_reassignments(assignments, roster, now, &self.config)
    }

    pub fn analyze(&self, summaries: &[UserLoadSummary]) -> BalanceStatus {
        analyze(summaries, &self.config.alerts)
    }

    pub fn weekly_digest(
        &self,
        summaries: &[UserLoadSummary],
        previous_score: Option<f64>,
        now: DateTime<Utc>,
    ) -> WeeklyDigest {
        weekly_digest(summaries, previous_score, now, self.config.tz(), &self.config.alerts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::TaskCategory;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut cfg = EngineConfig::default();
        cfg.scoring.rotation = 0.5;
        assert!(HouseholdEngine::new(cfg).is_err());
        let mut cfg = EngineConfig::default();
        cfg.timezone = "Mars/Olympus".to_string();
        assert!(HouseholdEngine::new(cfg).is_err());
    }

    #[test]
    fn test_refresh_roster_keeps_profile_fields() {
        let engine = HouseholdEngine::default();
        let roster = vec![
            MemberAvailability::new("a", "A", 0.0, 30.0).prefers(TaskCategory::Health),
            MemberAvailability::new("b", "B", 0.0, 30.0),
        ];
        let history = vec![HistoricalLoadEntry::new(
            now() - Duration::days(1),
            "a",
            "t1",
            TaskCategory::Health,
            4.0,
        )];
        let refreshed = engine.refresh_roster(&roster, &history, now()).unwrap();

        assert!(refreshed[0].current_load > 3.8);
        assert!(refreshed[0].fatigue_level > 0.0);
        assert!(refreshed[0].preferred_categories.contains(&TaskCategory::Health));
        assert_eq!(refreshed[1].current_load, 0.0);
    }

    #[test]
    fn test_engine_weigh_uses_config() {
        let mut cfg = EngineConfig::default();
        cfg.weights.base.daily = 2.0;
        let engine = HouseholdEngine::new(cfg).unwrap();
        let task = TaskWeightInput::new("t", "Dishes", TaskCategory::Daily);
        assert_eq!(engine.weigh(&task, now()).adjusted_weight, 2.0);
    }
}
