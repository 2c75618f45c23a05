//! Assignment optimizer.
//!
//! Per planning run: Filter -> Score -> Rank -> (optional) Force -> Commit.
//!
//! - **Filter** (hard constraints): active exclusion period, blocked
//!   category, no overlap with required skills, projected load over capacity.
//!   An ineligible member is never scored or ranked.
//! - **Score** (soft constraints): six components in [0, 100] combined with
//!   `ScoringWeights`.
//! - **Rank**: total desc, then current load asc, then member id asc.
//! - **Force**: a caller-chosen assignee wins regardless of score; the
//!   decision is annotated, never rejected.
//! - **Commit** (batch only): the assignee's working load and the rotation
//!   tracker are updated before the next task is considered. Greedy, not
//!   globally optimal.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::category::TaskCategory;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::member::{MemberAvailability, validate_roster};
use crate::rotation::RotationTracker;
use crate::task::TaskWeightInput;
use crate::weight::{WeightResult, compute_weight};

/// Why a member cannot take a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IneligibilityReason {
    Excluded {
        until: DateTime<Utc>,
        reason: Option<String>,
    },
    BlockedCategory {
        category: TaskCategory,
    },
    MissingSkills {
        required: Vec<String>,
    },
    OverCapacity {
        current_load: f64,
        task_weight: f64,
        projected: f64,
        capacity: f64,
    },
}

impl IneligibilityReason {
    pub fn kind(&self) -> &'static str {
        match self {
            IneligibilityReason::Excluded { .. } => "excluded",
            IneligibilityReason::BlockedCategory { .. } => "blocked category",
            IneligibilityReason::MissingSkills { .. } => "missing skills",
            IneligibilityReason::OverCapacity { .. } => "over capacity",
        }
    }

    pub fn describe(&self) -> String {
        match self {
            IneligibilityReason::Excluded { until, reason } => match reason {
                Some(r) => format!("unavailable until {} ({r})", until.format("%Y-%m-%d")),
                None => format!("unavailable until {}", until.format("%Y-%m-%d")),
            },
            IneligibilityReason::BlockedCategory { category } => {
                format!("does not take {category} tasks")
            }
            IneligibilityReason::MissingSkills { required } => {
                format!("has none of the required skills ({})", required.join(", "))
            }
            IneligibilityReason::OverCapacity {
                current_load,
                task_weight,
                capacity,
                ..
            } => format!(
                "current load {current_load:.1} + task {task_weight:.1} exceeds capacity {capacity:.1}"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Eligibility {
    pub eligible: bool,
    pub reasons: Vec<IneligibilityReason>,
}

/// Hard-constraint filter. Every failing constraint is reported.
pub fn check_eligibility(
    member: &MemberAvailability,
    category: TaskCategory,
    required_skills: &BTreeSet<String>,
    task_weight: f64,
    now: DateTime<Utc>,
) -> Eligibility {
    let mut reasons = Vec::new();

    if let Some(period) = member.active_exclusion(now) {
        reasons.push(IneligibilityReason::Excluded {
            until: period.end,
            reason: period.reason.clone(),
        });
    }
    if member.blocked_categories.contains(&category) {
        reasons.push(IneligibilityReason::BlockedCategory { category });
    }
    if !required_skills.is_empty() && required_skills.is_disjoint(&member.skills) {
        reasons.push(IneligibilityReason::MissingSkills {
            required: required_skills.iter().cloned().collect(),
        });
    }
    let projected = member.current_load + task_weight;
    if projected > member.max_weekly_load {
        reasons.push(IneligibilityReason::OverCapacity {
            current_load: member.current_load,
            task_weight,
            projected,
            capacity: member.max_weekly_load,
        });
    }

    Eligibility {
        eligible: reasons.is_empty(),
        reasons,
    }
}

/// Higher for members furthest below the household average.
pub fn load_balance_score(current_load: f64, household_average: f64) -> f64 {
    let scale = household_average.max(1.0);
    (50.0 + 50.0 * (household_average - current_load) / scale).clamp(0.0, 100.0)
}

/// 100 for a preferred category, neutral otherwise; never a penalty.
pub fn category_preference_score(member: &MemberAvailability, category: TaskCategory, neutral: f64) -> f64 {
    if member.preferred_categories.contains(&category) {
        100.0
    } else {
        neutral
    }
}

/// Fraction of required skills held, as a percentage.
pub fn skill_match_score(member: &MemberAvailability, required_skills: &BTreeSet<String>) -> f64 {
    if required_skills.is_empty() {
        return 100.0;
    }
    let held = required_skills.intersection(&member.skills).count();
    100.0 * held as f64 / required_skills.len() as f64
}

/// Remaining headroom after the task, saturating once `saturation` of the
/// capacity stays free.
pub fn availability_score(member: &MemberAvailability, task_weight: f64, saturation: f64) -> f64 {
    let headroom = member.max_weekly_load - member.current_load - task_weight;
    if headroom <= 0.0 {
        return 0.0;
    }
    100.0 * (headroom / (member.max_weekly_load * saturation)).min(1.0)
}

pub fn fatigue_avoidance_score(member: &MemberAvailability) -> f64 {
    (100.0 - member.fatigue_level).clamp(0.0, 100.0)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssignmentScore {
    pub member_id: String,
    pub current_load: f64,
    pub load_balance: f64,
    pub category_preference: f64,
    pub skill_match: f64,
    pub availability: f64,
    pub rotation: f64,
    pub fatigue_avoidance: f64,
    /// Weighted sum, in [0, 100].
    pub total: f64,
    pub eligible: bool,
}

/// Score one member for one task. Assumes the caller already knows the
/// eligibility result; it is only recorded here.
#[allow(clippy::too_many_arguments)]
pub fn score_candidate(
    member: &MemberAvailability,
    task: &TaskWeightInput,
    task_weight: f64,
    household_average: f64,
    tracker: &RotationTracker,
    eligible: bool,
    now: DateTime<Utc>,
    cfg: &EngineConfig,
) -> AssignmentScore {
    let w = &cfg.scoring;
    let load_balance = load_balance_score(member.current_load, household_average);
    let category_preference =
        category_preference_score(member, task.category, cfg.availability.neutral_preference);
    let skill_match = skill_match_score(member, &task.required_skills);
    let availability = availability_score(member, task_weight, cfg.availability.saturation);
    let rotation = tracker.score(member, task.category, now, &cfg.rotation);
    let fatigue_avoidance = fatigue_avoidance_score(member);

    let total = w.load_balance * load_balance
        + w.category_preference * category_preference
        + w.skill_match * skill_match
        + w.availability * availability
        + w.rotation * rotation
        + w.fatigue_avoidance * fatigue_avoidance;

    AssignmentScore {
        member_id: member.id.clone(),
        current_load: member.current_load,
        load_balance,
        category_preference,
        skill_match,
        availability,
        rotation,
        fatigue_avoidance,
        total,
        eligible,
    }
}

fn rank(scores: &mut [AssignmentScore]) {
    scores.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.current_load.total_cmp(&b.current_load))
            .then_with(|| a.member_id.cmp(&b.member_id))
    });
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IneligibleCandidate {
    pub member_id: String,
    pub member_name: String,
    pub reasons: Vec<IneligibilityReason>,
}

/// Filter and score the roster: ranked eligible scores plus the excluded.
pub fn evaluate_candidates(
    task: &TaskWeightInput,
    task_weight: f64,
    roster: &[MemberAvailability],
    tracker: &RotationTracker,
    now: DateTime<Utc>,
    cfg: &EngineConfig,
) -> (Vec<AssignmentScore>, Vec<IneligibleCandidate>) {
    let household_average = household_average(roster);
    let mut ranked = Vec::new();
    let mut ineligible = Vec::new();

    for member in roster {
        let eligibility =
            check_eligibility(member, task.category, &task.required_skills, task_weight, now);
        if !eligibility.eligible {
            debug!(task_id = %task.id, member_id = %member.id, "candidate filtered out");
            ineligible.push(IneligibleCandidate {
                member_id: member.id.clone(),
                member_name: member.name.clone(),
                reasons: eligibility.reasons,
            });
            continue;
        }
        let score = score_candidate(
            member,
            task,
            task_weight,
            household_average,
            tracker,
            true,
            now,
            cfg,
        );
        debug!(task_id = %task.id, member_id = %member.id, total = score.total, "candidate scored");
        ranked.push(score);
    }

    rank(&mut ranked);
    (ranked, ineligible)
}

fn household_average(roster: &[MemberAvailability]) -> f64 {
    if roster.is_empty() {
        0.0
    } else {
        roster.iter().map(|m| m.current_load).sum::<f64>() / roster.len() as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentDecision {
    pub task_id: String,
    pub task_category: TaskCategory,
    pub task_weight: f64,
    pub weight_explanation: Vec<String>,
    pub assignee: Option<String>,
    pub was_forced: bool,
    /// Score of the chosen member (also present for an ineligible forced pick).
    pub selected: Option<AssignmentScore>,
    /// Eligible candidates only, best first.
    pub ranked: Vec<AssignmentScore>,
    pub ineligible: Vec<IneligibleCandidate>,
    pub explanation: Vec<String>,
    pub unassigned_reason: Option<String>,
}

impl AssignmentDecision {
    pub fn is_assigned(&self) -> bool {
        self.assignee.is_some()
    }
}

fn member_name<'a>(roster: &'a [MemberAvailability], id: &'a str) -> &'a str {
    roster
        .iter()
        .find(|m| m.id == id)
        .map(|m| m.name.as_str())
        .unwrap_or(id)
}

fn unassigned_reason(roster: &[MemberAvailability], ineligible: &[IneligibleCandidate]) -> String {
    if roster.is_empty() {
        return "no eligible member: roster is empty".to_string();
    }
    let mut kinds: Vec<&'static str> = Vec::new();
    for candidate in ineligible {
        for reason in &candidate.reasons {
            if !kinds.contains(&reason.kind()) {
                kinds.push(reason.kind());
            }
        }
    }
    format!("no eligible member: {}", kinds.join(", "))
}

/// Core decision once inputs are validated and the weight is known.
fn decide(
    task: &TaskWeightInput,
    weight: WeightResult,
    roster: &[MemberAvailability],
    tracker: &RotationTracker,
    forced: Option<&str>,
    now: DateTime<Utc>,
    cfg: &EngineConfig,
) -> AssignmentDecision {
    let task_weight = weight.adjusted_weight;
    let (ranked, ineligible) = evaluate_candidates(task, task_weight, roster, tracker, now, cfg);
    let average = household_average(roster);
    let mut explanation = Vec::new();

    let forced_member = match forced {
        Some(id) => {
            let found = roster.iter().find(|m| m.id == id);
            if found.is_none() {
                warn!(task_id = %task.id, forced = id, "forced assignee not in roster; ignoring");
                explanation.push(format!(
                    "Forced assignee {id} is not in the household; ranking by score instead"
                ));
            }
            found
        }
        None => None,
    };

    let (assignee, was_forced, selected) = if let Some(member) = forced_member {
        let eligibility =
            check_eligibility(member, task.category, &task.required_skills, task_weight, now);
        let score = score_candidate(
            member,
            task,
            task_weight,
            average,
            tracker,
            eligibility.eligible,
            now,
            cfg,
        );
        explanation.push(format!(
            "Forced assignment to {} (score {:.1})",
            member.name, score.total
        ));
        if !eligibility.eligible {
            let why: Vec<String> = eligibility.reasons.iter().map(|r| r.describe()).collect();
            explanation.push(format!("{} would otherwise be skipped: {}", member.name, why.join("; ")));
        }
        (Some(member.id.clone()), true, Some(score))
    } else if let Some(best) = ranked.first() {
        let name = member_name(roster, &best.member_id);
        explanation.push(format!("Selected {name} (score {:.1})", best.total));
        if best.current_load < average {
            explanation.push(format!(
                "{name}: current load {:.1} is below the household average {average:.1}",
                best.current_load
            ));
        } else {
            explanation.push(format!(
                "{name}: current load {:.1}, household average {average:.1}",
                best.current_load
            ));
        }
        if best.category_preference >= 100.0 {
            explanation.push(format!("{name} prefers {} tasks", task.category));
        }
        if best.rotation >= 100.0 && tracker.get(task.category).is_some() {
            explanation.push(format!("{name} has not taken a recent {} task", task.category));
        }
        if let Some(runner_up) = ranked.get(1) {
            explanation.push(format!(
                "Next best: {} (score {:.1}, current load {:.1})",
                member_name(roster, &runner_up.member_id),
                runner_up.total,
                runner_up.current_load
            ));
        }
        (Some(best.member_id.clone()), false, Some(best.clone()))
    } else {
        (None, false, None)
    };

    for candidate in &ineligible {
        let why: Vec<String> = candidate.reasons.iter().map(|r| r.describe()).collect();
        explanation.push(format!("{} not eligible: {}", candidate.member_name, why.join("; ")));
    }

    let unassigned = if assignee.is_none() {
        let reason = unassigned_reason(roster, &ineligible);
        warn!(task_id = %task.id, %reason, "task left unassigned");
        Some(reason)
    } else {
        None
    };

    AssignmentDecision {
        task_id: task.id.clone(),
        task_category: task.category,
        task_weight,
        weight_explanation: weight.explanation,
        assignee,
        was_forced,
        selected,
        ranked,
        ineligible,
        explanation,
        unassigned_reason: unassigned,
    }
}

/// Pick the best member for one task. Does not commit anything: the tracker
/// is only read.
pub fn find_optimal_assignee(
    task: &TaskWeightInput,
    roster: &[MemberAvailability],
    tracker: &RotationTracker,
    forced: Option<&str>,
    now: DateTime<Utc>,
    cfg: &EngineConfig,
) -> Result<AssignmentDecision, EngineError> {
    task.validate()?;
    validate_roster(roster)?;
    let weight = compute_weight(task, now, &cfg.weights, cfg.tz());
    Ok(decide(task, weight, roster, tracker, forced, now, cfg))
}

/// One task of a batch, optionally with a forced assignee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRequest {
    pub task: TaskWeightInput,
    #[serde(default)]
    pub forced_assignee: Option<String>,
}

impl AssignmentRequest {
    pub fn new(task: TaskWeightInput) -> Self {
        Self {
            task,
            forced_assignee: None,
        }
    }

    pub fn forced_to(mut self, member_id: impl Into<String>) -> Self {
        self.forced_assignee = Some(member_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnassignedTask {
    pub task_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub decisions: Vec<AssignmentDecision>,
    pub unassigned: Vec<UnassignedTask>,
    /// Roster with working loads after every assignment.
    pub members: Vec<MemberAvailability>,
    pub tracker: RotationTracker,
}

/// Assign tasks in order. Each assignment raises the assignee's working
/// load and updates rotation before the next task is scored. Inputs are
/// left untouched; the updated roster and tracker are returned.
pub fn assign_batch(
    requests: &[AssignmentRequest],
    roster: &[MemberAvailability],
    tracker: RotationTracker,
    now: DateTime<Utc>,
    cfg: &EngineConfig,
) -> Result<BatchOutcome, EngineError> {
    validate_roster(roster)?;
    for request in requests {
        request.task.validate()?;
    }

    let tz = cfg.tz();
    let mut members = roster.to_vec();
    let mut tracker = tracker;
    let mut decisions = Vec::with_capacity(requests.len());
    let mut unassigned = Vec::new();

    for request in requests {
        let task = &request.task;
        let weight = compute_weight(task, now, &cfg.weights, tz);
        let decision = decide(
            task,
            weight,
            &members,
            &tracker,
            request.forced_assignee.as_deref(),
            now,
            cfg,
        );

        match decision.assignee.as_deref() {
            Some(member_id) => {
                if let Some(member) = members.iter_mut().find(|m| m.id == member_id) {
                    member.current_load += decision.task_weight;
                    member.last_assigned.insert(task.category, now);
                }
                tracker.record(task.category, member_id, now);
                debug!(task_id = %task.id, member_id, weight = decision.task_weight, "assignment committed");
            }
            None => unassigned.push(UnassignedTask {
                task_id: task.id.clone(),
                reason: decision
                    .unassigned_reason
                    .clone()
                    .unwrap_or_else(|| "no eligible member".to_string()),
            }),
        }
        decisions.push(decision);
    }

    info!(
        tasks = requests.len(),
        assigned = requests.len() - unassigned.len(),
        unassigned = unassigned.len(),
        "batch assignment finished"
    );

    Ok(BatchOutcome {
        decisions,
        unassigned,
        members,
        tracker,
    })
}
