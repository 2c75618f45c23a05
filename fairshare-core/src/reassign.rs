//! Advisory reassignment suggestions for an already-planned week.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, check_weight};
use crate::fairness::balance_score;
use crate::member::{MemberAvailability, validate_roster};
use crate::optimizer::check_eligibility;
use crate::task::TaskWeightInput;
use crate::weight::compute_weight;

/// A task currently held by a member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentAssignment {
    pub task: TaskWeightInput,
    pub assignee_id: String,
    /// Computed from the task when absent.
    #[serde(default)]
    pub weight: Option<f64>,
}

impl CurrentAssignment {
    pub fn new(task: TaskWeightInput, assignee_id: impl Into<String>) -> Self {
        Self {
            task,
            assignee_id: assignee_id.into(),
            weight: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReassignmentSuggestion {
    pub task_id: String,
    pub from_member: String,
    pub to_member: String,
    pub weight: f64,
    pub reason: String,
    pub balance_before: f64,
    pub balance_after: f64,
}

fn extremes(loads: &BTreeMap<String, f64>) -> Option<((&str, f64), (&str, f64))> {
    let mut iter = loads.iter();
    let (first_id, first_load) = iter.next()?;
    let mut high = (first_id.as_str(), *first_load);
    let mut low = high;
    for (id, load) in iter {
        if *load > high.1 {
            high = (id.as_str(), *load);
        }
        if *load < low.1 {
            low = (id.as_str(), *load);
        }
    }
    Some((high, low))
}

fn gap(loads: &BTreeMap<String, f64>) -> f64 {
    extremes(loads).map(|((_, hi), (_, lo))| hi - lo).unwrap_or(0.0)
}

/// Sum of squared deviations from the mean load. Any handover of `w` from a
/// member carrying `h` to one carrying `l` lowers it exactly when `w < h - l`.
fn dispersion(loads: &BTreeMap<String, f64>) -> f64 {
    if loads.is_empty() {
        return 0.0;
    }
    let mean = loads.values().sum::<f64>() / loads.len() as f64;
    loads.values().map(|l| (l - mean).powi(2)).sum()
}

/// Members ordered by working load, heaviest first when `descending`; ties
/// break on id.
fn by_load<'a>(
    roster: &'a [MemberAvailability],
    loads: &BTreeMap<String, f64>,
    descending: bool,
) -> Vec<&'a MemberAvailability> {
    let mut members: Vec<&MemberAvailability> = roster.iter().collect();
    members.sort_by(|a, b| {
        let ord = loads[&a.id].total_cmp(&loads[&b.id]);
        let ord = if descending { ord.reverse() } else { ord };
        ord.then_with(|| a.id.cmp(&b.id))
    });
    members
}

struct Move {
    idx: usize,
    from_id: String,
    to_id: String,
    weight: f64,
    trial: BTreeMap<String, f64>,
}

/// Greedy rebalancing: while the gap between the most and least loaded
/// member exceeds the threshold, hand the heaviest movable task of the most
/// loaded member that has one to the lightest eligible member, provided the
/// move lowers the spread of loads around the mean. Tied extremes therefore
/// still make progress. Nothing is applied; the inputs are only read.
pub fn suggest_reassignments(
    assignments: &[CurrentAssignment],
    roster: &[MemberAvailability],
    now: DateTime<Utc>,
    cfg: &EngineConfig,
) -> Result<Vec<ReassignmentSuggestion>, EngineError> {
    validate_roster(roster)?;
    let tz = cfg.tz();
    let limits = &cfg.reassignment;

    let mut holdings: Vec<(usize, String, f64)> = Vec::new();
    for (idx, assignment) in assignments.iter().enumerate() {
        assignment.task.validate()?;
        let weight = match assignment.weight {
            Some(w) => {
                check_weight(w, || format!("assignment {}", assignment.task.id))?;
                w
            }
            None => compute_weight(&assignment.task, now, &cfg.weights, tz).adjusted_weight,
        };
        if roster.iter().all(|m| m.id != assignment.assignee_id) {
            warn!(task_id = %assignment.task.id, assignee = %assignment.assignee_id, "assignee not in roster; task skipped");
            continue;
        }
        holdings.push((idx, assignment.assignee_id.clone(), weight));
    }

    let mut loads: BTreeMap<String, f64> = roster
        .iter()
        .map(|m| (m.id.clone(), m.current_load))
        .collect();
    let name_of = |id: &str| {
        roster
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.name.clone())
            .unwrap_or_else(|| id.to_string())
    };

    let mut moved: BTreeSet<usize> = BTreeSet::new();
    let mut suggestions = Vec::new();

    while suggestions.len() < limits.max_suggestions {
        let current_gap = gap(&loads);
        if current_gap <= limits.imbalance_threshold {
            break;
        }
        let current_spread = dispersion(&loads);
        let receivers = by_load(roster, &loads, false);

        let mut chosen = None;
        'donors: for donor in by_load(roster, &loads, true) {
            let mut movable: Vec<&(usize, String, f64)> = holdings
                .iter()
                .filter(|(idx, holder, _)| *holder == donor.id && !moved.contains(idx))
                .collect();
            movable.sort_by(|a, b| {
                b.2.total_cmp(&a.2)
                    .then_with(|| assignments[a.0].task.id.cmp(&assignments[b.0].task.id))
            });

            for (idx, _, weight) in movable {
                let task = &assignments[*idx].task;
                for receiver in receivers.iter().filter(|r| r.id != donor.id) {
                    let mut working = (*receiver).clone();
                    working.current_load = loads[&receiver.id];
                    if !check_eligibility(&working, task.category, &task.required_skills, *weight, now)
                        .eligible
                    {
                        continue;
                    }
                    let mut trial = loads.clone();
                    *trial.entry(donor.id.clone()).or_default() -= weight;
                    *trial.entry(receiver.id.clone()).or_default() += weight;
                    if dispersion(&trial) < current_spread {
                        chosen = Some(Move {
                            idx: *idx,
                            from_id: donor.id.clone(),
                            to_id: receiver.id.clone(),
                            weight: *weight,
                            trial,
                        });
                        break 'donors;
                    }
                }
            }
        }

        let Some(Move {
            idx,
            from_id,
            to_id,
            weight,
            trial,
        }) = chosen
        else {
            debug!(gap = current_gap, "no move evens out the loads");
            break;
        };

        let before: Vec<f64> = loads.values().copied().collect();
        let after: Vec<f64> = trial.values().copied().collect();
        let (balance_before, balance_after) = (balance_score(&before), balance_score(&after));
        let task = &assignments[idx].task;
        let (from_load, to_load) = (loads[&from_id], loads[&to_id]);
        suggestions.push(ReassignmentSuggestion {
            task_id: task.id.clone(),
            from_member: from_id.clone(),
            to_member: to_id.clone(),
            weight,
            reason: format!(
                "{} carries {from_load:.1} and {} carries {to_load:.1}; handing over \"{}\" ({weight:.1}) lifts household balance from {balance_before:.0} to {balance_after:.0}",
                name_of(&from_id),
                name_of(&to_id),
                task.title,
            ),
            balance_before,
            balance_after,
        });

        moved.insert(idx);
        if let Some(holding) = holdings.iter_mut().find(|h| h.0 == idx) {
            holding.1 = to_id;
        }
        loads = trial;
    }

    Ok(suggestions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::TaskCategory;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn held(id: &str, category: TaskCategory, who: &str, weight: f64) -> CurrentAssignment {
        CurrentAssignment::new(TaskWeightInput::new(id, id, category), who).with_weight(weight)
    }

    #[test]
    fn test_moves_heaviest_tasks_until_gap_closes() {
        let roster = vec![
            MemberAvailability::new("a", "A", 20.0, 40.0),
            MemberAvailability::new("b", "B", 2.0, 40.0),
        ];
        let assignments = vec![
            held("light", TaskCategory::Daily, "a", 1.0),
            held("heavy1", TaskCategory::Education, "a", 4.0),
            held("heavy2", TaskCategory::Health, "a", 4.0),
        ];
        let out = suggest_reassignments(&assignments, &roster, now(), &EngineConfig::default()).unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].task_id, "heavy1");
        assert_eq!(out[1].task_id, "heavy2");
        assert!(out.iter().all(|s| s.from_member == "a" && s.to_member == "b"));
        assert!(out[0].balance_after > out[0].balance_before);
        assert!(out[1].balance_after > out[1].balance_before);
        assert!(out[0].reason.contains("A carries 20.0"));
    }

    #[test]
    fn test_never_suggests_ineligible_receiver() {
        let roster = vec![
            MemberAvailability::new("a", "A", 20.0, 40.0),
            MemberAvailability::new("b", "B", 0.0, 40.0).blocks(TaskCategory::Education),
            MemberAvailability::new("c", "C", 6.0, 40.0),
        ];
        let assignments = vec![held("homework", TaskCategory::Education, "a", 4.0)];
        let out = suggest_reassignments(&assignments, &roster, now(), &EngineConfig::default()).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].to_member, "c");
    }

    #[test]
    fn test_balanced_household_gets_nothing() {
        let roster = vec![
            MemberAvailability::new("a", "A", 10.0, 40.0),
            MemberAvailability::new("b", "B", 8.0, 40.0),
        ];
        let assignments = vec![held("t", TaskCategory::Daily, "a", 1.0)];
        let out = suggest_reassignments(&assignments, &roster, now(), &EngineConfig::default()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_respects_max_suggestions() {
        let roster = vec![
            MemberAvailability::new("a", "A", 30.0, 60.0),
            MemberAvailability::new("b", "B", 0.0, 60.0),
        ];
        let assignments: Vec<_> = (0..10)
            .map(|i| held(&format!("t{i}"), TaskCategory::Daily, "a", 1.0))
            .collect();
        let mut cfg = EngineConfig::default();
        cfg.reassignment.max_suggestions = 3;
        let out = suggest_reassignments(&assignments, &roster, now(), &cfg).unwrap();
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_move_that_would_widen_gap_is_skipped() {
        // Moving 12 from a (20) to b (10) flips the gap to 14: larger than 10.
        let roster = vec![
            MemberAvailability::new("a", "A", 20.0, 40.0),
            MemberAvailability::new("b", "B", 10.0, 40.0),
        ];
        let assignments = vec![held("big", TaskCategory::Other, "a", 12.0)];
        let out = suggest_reassignments(&assignments, &roster, now(), &EngineConfig::default()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_tied_extremes_still_get_advice() {
        let roster = vec![
            MemberAvailability::new("a", "A", 20.0, 40.0),
            MemberAvailability::new("b", "B", 20.0, 40.0),
            MemberAvailability::new("c", "C", 0.0, 40.0),
            MemberAvailability::new("d", "D", 0.0, 40.0),
        ];
        let assignments: Vec<_> = (0..10)
            .map(|i| {
                let who = if i % 2 == 0 { "a" } else { "b" };
                held(&format!("t{i}"), TaskCategory::Daily, who, 4.0)
            })
            .collect();
        let out = suggest_reassignments(&assignments, &roster, now(), &EngineConfig::default()).unwrap();

        let moves: Vec<(&str, &str)> = out
            .iter()
            .map(|s| (s.from_member.as_str(), s.to_member.as_str()))
            .collect();
        assert_eq!(moves, vec![("a", "c"), ("b", "d"), ("a", "c"), ("b", "d")]);
        assert!(out.iter().all(|s| s.balance_after > s.balance_before));
        assert!(out[0].reason.contains("lifts household balance from 50"));
    }

    #[test]
    fn test_invalid_assignment_weight_is_rejected() {
        let roster = vec![MemberAvailability::new("a", "A", 0.0, 10.0)];
        let assignments = vec![held("t", TaskCategory::Daily, "a", -2.0)];
        assert!(matches!(
            suggest_reassignments(&assignments, &roster, now(), &EngineConfig::default()),
            Err(EngineError::InvalidWeight { .. })
        ));
    }
}
