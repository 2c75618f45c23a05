use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use fairshare_core::time::week_start;
use fairshare_core::{
    AssignmentDecision, BalanceStatus, HouseholdEngine, MemberAvailability, WeeklyDigest,
    WeightResult,
};
use fairshare_ingest::{HouseholdSnapshot, load_snapshot};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::{DigestState, read_digest_state, write_digest_state};

/// Shared inputs of every household command.
pub struct Session {
    pub engine: HouseholdEngine,
    pub snapshot: HouseholdSnapshot,
    pub now: DateTime<Utc>,
    pub json: bool,
}

impl Session {
    pub fn open(engine: HouseholdEngine, snapshot_path: &Path, json: bool) -> Result<Self> {
        let snapshot = load_snapshot(snapshot_path)?;
        let now = snapshot.now_or(Utc::now());
        Ok(Self {
            engine,
            snapshot,
            now,
            json,
        })
    }

    /// Members with load and fatigue recomputed from history, when any.
    fn roster(&self) -> Result<Vec<MemberAvailability>> {
        if self.snapshot.history.is_empty() {
            return Ok(self.snapshot.members.clone());
        }
        Ok(self
            .engine
            .refresh_roster(&self.snapshot.members, &self.snapshot.history, self.now)?)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct WeighedTask<'a> {
    task_id: &'a str,
    title: &'a str,
    #[serde(flatten)]
    weight: WeightResult,
}

pub fn weigh(session: &Session) -> Result<()> {
    let weighed: Vec<WeighedTask> = session
        .snapshot
        .tasks
        .iter()
        .map(|r| WeighedTask {
            task_id: &r.task.id,
            title: &r.task.title,
            weight: session.engine.weigh(&r.task, session.now),
        })
        .collect();

    if session.json {
        return print_json(&weighed);
    }
    for w in &weighed {
        println!("{:>5.1}  {} ({})", w.weight.display_weight(), w.title, w.task_id);
        for line in &w.weight.explanation {
            println!("       - {line}");
        }
    }
    Ok(())
}

fn print_decision(d: &AssignmentDecision) {
    match &d.assignee {
        Some(who) => println!(
            "{} ({:.1}) -> {}{}",
            d.task_id,
            d.task_weight,
            who,
            if d.was_forced { " [forced]" } else { "" }
        ),
        None => println!("{} ({:.1}) -> unassigned", d.task_id, d.task_weight),
    }
    for line in &d.explanation {
        println!("    {line}");
    }
}

pub fn plan(session: &Session, save_tracker: Option<PathBuf>) -> Result<()> {
    let roster = session.roster()?;
    let outcome = session.engine.assign_batch(
        &session.snapshot.tasks,
        &roster,
        session.snapshot.tracker(),
        session.now,
    )?;

    if let Some(path) = save_tracker {
        let json = serde_json::to_string_pretty(&outcome.tracker)?;
        fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
        tracing::info!(path = %path.display(), "rotation tracker saved");
    }

    if session.json {
        return print_json(&outcome);
    }

    println!("# Plan ({} tasks)\n", outcome.decisions.len());
    for d in &outcome.decisions {
        print_decision(d);
    }
    println!("\n## Loads after planning\n");
    for m in &outcome.members {
        println!("- {}: {:.1} / {:.1}", m.name, m.current_load, m.max_weekly_load);
    }
    if !outcome.unassigned.is_empty() {
        println!("\n## Unassigned\n");
        for u in &outcome.unassigned {
            println!("- {}: {}", u.task_id, u.reason);
        }
    }
    Ok(())
}

pub fn rebalance(session: &Session) -> Result<()> {
    let roster = session.roster()?;
    let suggestions =
        session
            .engine
            .suggest_reassignments(&session.snapshot.assignments, &roster, session.now)?;

    if session.json {
        return print_json(&suggestions);
    }
    if suggestions.is_empty() {
        println!("No reassignment needed.");
        return Ok(());
    }
    for s in &suggestions {
        println!(
            "- {}: {} -> {} (balance {:.0} -> {:.0})",
            s.task_id, s.from_member, s.to_member, s.balance_before, s.balance_after
        );
        println!("    {}", s.reason);
    }
    Ok(())
}

fn print_status(status: &BalanceStatus) {
    println!(
        "Balance: {:.0}/100 ({}), gini {:.2}",
        status.balance_score,
        status.status.label(),
        status.gini
    );
    println!("{}\n", status.narrative);
    for a in &status.alerts {
        println!("[{:?}] {}", a.severity, a.message);
    }
    for t in &status.trend_narratives {
        println!("- {}", t.text);
    }
    if !status.positives.is_empty() {
        println!("\nGoing well:");
        for p in &status.positives {
            println!("- {p}");
        }
    }
    if !status.recommendations.is_empty() {
        println!("\nSuggestions:");
        for r in &status.recommendations {
            println!("- {r}");
        }
    }
}

pub fn analyze(session: &Session) -> Result<()> {
    let summaries =
        session
            .engine
            .summarize(&session.snapshot.roster(), &session.snapshot.history, session.now)?;
    let status = session.engine.analyze(&summaries);
    if session.json {
        return print_json(&status);
    }
    print_status(&status);
    Ok(())
}

fn print_digest(d: &WeeklyDigest) {
    println!("# {}\n", d.narrative);
    for l in &d.lines {
        println!(
            "- {}: {:.1} ({:.0}%), {} done, {} pending, {}",
            l.member_name,
            l.weekly_load,
            l.share,
            l.completed,
            l.pending,
            l.fatigue_zone.label()
        );
    }
    if !d.highlights.is_empty() {
        println!();
        for h in &d.highlights {
            println!("* {h}");
        }
    }
    if !d.recommendations.is_empty() {
        println!("\nFor next week:");
        for r in &d.recommendations {
            println!("- {r}");
        }
    }
}

/// Digest for the snapshot, compared against the snapshot's
/// `previous_score` or else the baseline stored under `home`.
pub fn build_digest(session: &Session, home: &Path, save: bool) -> Result<WeeklyDigest> {
    let summaries =
        session
            .engine
            .summarize(&session.snapshot.roster(), &session.snapshot.history, session.now)?;

    let week = week_start(session.now, session.engine.config().tz());
    let stored = read_digest_state(home)?;
    let previous = session
        .snapshot
        .previous_score
        .or_else(|| stored.as_ref().and_then(|s| s.baseline_for(week)));
    let digest = session.engine.weekly_digest(&summaries, previous, session.now);

    if save {
        let next = DigestState::advance(stored.as_ref(), digest.week_start, digest.balance_score);
        write_digest_state(home, &next)?;
        tracing::info!(week = %next.week_start, score = next.balance_score, "digest baseline saved");
    }
    Ok(digest)
}

pub fn digest(session: &Session, home: &Path, save: bool) -> Result<()> {
    let digest = build_digest(session, home, save)?;
    if session.json {
        return print_json(&digest);
    }
    print_digest(&digest);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fairshare_core::RotationTracker;

    fn fixture() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../fairshare-ingest/tests/fixtures/household.json")
    }

    fn session() -> Session {
        Session::open(HouseholdEngine::default(), &fixture(), false).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn test_plan_saves_rotation_tracker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        plan(&session(), Some(path.clone())).unwrap();

        let saved: RotationTracker =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(!saved.is_empty());
        assert_eq!(
            saved.last_assignee(fairshare_core::TaskCategory::Administrative),
            Some("alex")
        );
    }

    #[test]
    fn test_digest_rerun_in_same_week_keeps_baseline() {
        let home = tempfile::tempdir().unwrap();
        write_digest_state(
            home.path(),
            &DigestState {
                week_start: day(12),
                balance_score: 70.0,
                previous_week_score: None,
            },
        )
        .unwrap();
        let mut session = session();
        session.snapshot.previous_score = None;

        let first = build_digest(&session, home.path(), true).unwrap();
        assert_eq!(first.week_start, day(19));
        let expected = first.balance_score - 70.0;
        assert!((first.score_change.unwrap() - expected).abs() < 1e-9);

        let second = build_digest(&session, home.path(), true).unwrap();
        assert!((second.score_change.unwrap() - expected).abs() < 1e-9);

        let stored = read_digest_state(home.path()).unwrap().unwrap();
        assert_eq!(stored.week_start, day(19));
        assert_eq!(stored.previous_week_score, Some(70.0));
    }

    #[test]
    fn test_snapshot_score_wins_and_no_save_leaves_home_untouched() {
        let home = tempfile::tempdir().unwrap();
        let d = build_digest(&session(), home.path(), false).unwrap();
        assert!((d.score_change.unwrap() - (d.balance_score - 82.0)).abs() < 1e-9);
        assert_eq!(read_digest_state(home.path()).unwrap(), None);
    }
}
