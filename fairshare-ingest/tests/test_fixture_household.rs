use fairshare_core::{HouseholdEngine, TaskCategory};
use fairshare_ingest::{load_snapshot, parse_history_csv};
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn test_history_fixture_parses() {
    let entries = parse_history_csv(fixture("history.csv")).unwrap();
    assert_eq!(entries.len(), 8);
    assert_eq!(entries[4].category, TaskCategory::Health);
    assert_eq!(entries[5].category, TaskCategory::Logistics);
    assert_eq!(entries.iter().filter(|e| !e.completed).count(), 1);
}

#[test]
fn test_snapshot_merges_history_csv() {
    let snapshot = load_snapshot(fixture("household.json")).unwrap();
    assert_eq!(snapshot.members.len(), 2);
    assert_eq!(snapshot.history.len(), 8);
    assert_eq!(snapshot.tasks.len(), 4);
    assert_eq!(snapshot.previous_score, Some(82.0));
    assert!(snapshot.members[1].blocked_categories.contains(&TaskCategory::Administrative));
}

/// Real-data regression: a full planning pass over the fixture household.
#[test]
fn test_fixture_household_plan() {
    let snapshot = load_snapshot(fixture("household.json")).unwrap();
    let now = snapshot.now.unwrap();
    let engine = HouseholdEngine::default();

    let roster = engine
        .refresh_roster(&snapshot.members, &snapshot.history, now)
        .unwrap();
    // Alex did most of the week.
    assert!(roster[0].current_load > roster[1].current_load);

    let outcome = engine
        .assign_batch(&snapshot.tasks, &roster, snapshot.tracker(), now)
        .unwrap();
    assert!(outcome.unassigned.is_empty());

    let vaccine = &outcome.decisions[0];
    assert_eq!(vaccine.assignee.as_deref(), Some("sam"));

    let tax = &outcome.decisions[3];
    assert_eq!(tax.assignee.as_deref(), Some("alex"));
    assert!(tax.was_forced);

    let summaries = engine.summarize(&snapshot.roster(), &snapshot.history, now).unwrap();
    let status = engine.analyze(&summaries);
    let digest = engine.weekly_digest(&summaries, snapshot.previous_score, now);
    assert_eq!(digest.status, status.status);
    assert_eq!(digest.lines[0].pending, 1);

    let suggestions = engine
        .suggest_reassignments(&snapshot.assignments, &roster, now)
        .unwrap();
    assert!(suggestions.iter().all(|s| s.from_member == "alex" && s.to_member == "sam"));
}
