//! Household snapshot: everything one planning run needs, as JSON.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use fairshare_core::{
    AssignmentRequest, CurrentAssignment, HistoricalLoadEntry, HouseholdMember,
    MemberAvailability, RotationTracker, validate_history, validate_roster,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::history_csv::parse_history_csv;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdSnapshot {
    /// Evaluation instant; the caller's clock when absent.
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
    pub members: Vec<MemberAvailability>,
    /// Tasks waiting for an assignee.
    #[serde(default)]
    pub tasks: Vec<AssignmentRequest>,
    #[serde(default)]
    pub history: Vec<HistoricalLoadEntry>,
    /// Extra history in CSV form, relative to the snapshot file.
    #[serde(default)]
    pub history_csv: Option<PathBuf>,
    /// Tasks already held, for rebalancing.
    #[serde(default)]
    pub assignments: Vec<CurrentAssignment>,
    #[serde(default)]
    pub tracker: Option<RotationTracker>,
    /// Balance score of the previous weekly digest.
    #[serde(default)]
    pub previous_score: Option<f64>,
}

impl HouseholdSnapshot {
    pub fn validate(&self) -> Result<()> {
        validate_roster(&self.members).context("invalid members")?;
        validate_history(&self.history).context("invalid history")?;
        for request in &self.tasks {
            request.task.validate().context("invalid task")?;
        }
        for assignment in &self.assignments {
            assignment.task.validate().context("invalid assignment")?;
        }
        Ok(())
    }

    pub fn roster(&self) -> Vec<HouseholdMember> {
        self.members.iter().map(|m| m.household_member()).collect()
    }

    pub fn now_or(&self, fallback: DateTime<Utc>) -> DateTime<Utc> {
        self.now.unwrap_or(fallback)
    }

    pub fn tracker(&self) -> RotationTracker {
        self.tracker.clone().unwrap_or_default()
    }
}

/// Parse a snapshot from JSON text without touching the filesystem.
pub fn parse_snapshot(json: &str) -> Result<HouseholdSnapshot> {
    let snapshot: HouseholdSnapshot =
        serde_json::from_str(json).context("malformed household snapshot")?;
    snapshot.validate()?;
    Ok(snapshot)
}

/// Load and validate a snapshot file, merging any referenced history CSV.
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<HouseholdSnapshot> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut snapshot: HouseholdSnapshot = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", path.display()))?;

    if let Some(csv_path) = snapshot.history_csv.clone() {
        let resolved = match path.parent() {
            Some(dir) if csv_path.is_relative() => dir.join(&csv_path),
            _ => csv_path,
        };
        let extra = parse_history_csv(&resolved)?;
        debug!(rows = extra.len(), file = %resolved.display(), "merged history csv");
        snapshot.history.extend(extra);
    }

    snapshot
        .validate()
        .with_context(|| format!("validating {}", path.display()))?;
    info!(
        members = snapshot.members.len(),
        tasks = snapshot.tasks.len(),
        history = snapshot.history.len(),
        "snapshot loaded"
    );
    Ok(snapshot)
}
