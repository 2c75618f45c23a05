//! fairshare-core: load weighting, fairness and assignment engine for household tasks

pub mod alerts;
pub mod category;
pub mod config;
pub mod digest;
pub mod engine;
pub mod error;
pub mod fairness;
pub mod history;
pub mod load;
pub mod member;
pub mod optimizer;
pub mod reassign;
pub mod rotation;
pub mod task;
pub mod time;
pub mod weight;

pub use alerts::{
    AlertKind, AlertSeverity, BalanceAlert, BalanceLevel, BalanceStatus, TrendNarrative,
    BANNED_TERMS, analyze, contains_banned_term, trend_narrative,
};
pub use category::TaskCategory;
pub use config::{
    AlertConfig, AvailabilityConfig, CategoryWeights, DecayConfig, EngineConfig, FatigueConfig,
    LoadConfig, ReassignConfig, RotationConfig, ScoringWeights, TrendConfig, WeightConfig,
    CONFIG_VERSION,
};
pub use digest::{DigestLine, WeeklyDigest, weekly_digest};
pub use engine::HouseholdEngine;
pub use error::EngineError;
pub use fairness::{FairnessReport, balance_score, fairness_report, gini};
pub use history::{HistoricalLoadEntry, validate_history};
pub use load::{
    FatigueZone, HouseholdMember, LoadAggregate, LoadTrend, UserLoadSummary, aggregate,
    decay_factor, summarize_household,
};
pub use member::{ExclusionPeriod, MemberAvailability, validate_roster};
pub use optimizer::{
    AssignmentDecision, AssignmentRequest, AssignmentScore, BatchOutcome, Eligibility,
    IneligibilityReason, IneligibleCandidate, UnassignedTask, assign_batch, check_eligibility,
    find_optimal_assignee,
};
pub use reassign::{CurrentAssignment, ReassignmentSuggestion, suggest_reassignments};
pub use rotation::{CategoryRotation, RotationTracker};
pub use task::{RecurrencePattern, TaskPriority, TaskWeightInput};
pub use weight::{DeadlinePressure, WeightResult, compute_weight};
