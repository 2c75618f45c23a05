use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// `$FAIRSHARE_HOME`, or `~/.fairshare`.
pub fn fairshare_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("FAIRSHARE_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set (or set FAIRSHARE_HOME)")?;
    Ok(PathBuf::from(home).join(".fairshare"))
}

pub fn ensure_fairshare_home() -> Result<PathBuf> {
    let dir = fairshare_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Last published digest. `previous_week_score` is the score of the week
/// before `week_start`, kept so reruns within a week compare against it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DigestState {
    pub week_start: NaiveDate,
    pub balance_score: f64,
    #[serde(default)]
    pub previous_week_score: Option<f64>,
}

impl DigestState {
    /// Score to compare the digest of `week` against.
    pub fn baseline_for(&self, week: NaiveDate) -> Option<f64> {
        if self.week_start < week {
            Some(self.balance_score)
        } else if self.week_start == week {
            self.previous_week_score
        } else {
            None
        }
    }

    /// State after publishing `score` for `week`.
    pub fn advance(previous: Option<&DigestState>, week: NaiveDate, score: f64) -> DigestState {
        let previous_week_score = previous.and_then(|p| p.baseline_for(week));
        DigestState {
            week_start: week,
            balance_score: score,
            previous_week_score,
        }
    }
}

fn digest_state_path(home: &Path) -> PathBuf {
    home.join("digest.json")
}

pub fn read_digest_state(home: &Path) -> Result<Option<DigestState>> {
    let p = digest_state_path(home);
    if !p.exists() {
        return Ok(None);
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    let state = serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))?;
    Ok(Some(state))
}

pub fn write_digest_state(home: &Path, state: &DigestState) -> Result<()> {
    fs::create_dir_all(home).with_context(|| format!("create {}", home.display()))?;
    let p = digest_state_path(home);
    let json = serde_json::to_string_pretty(state)?;
    fs::write(&p, json).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn test_baseline_depends_on_stored_week() {
        let state = DigestState {
            week_start: day(12),
            balance_score: 70.0,
            previous_week_score: Some(60.0),
        };
        assert_eq!(state.baseline_for(day(19)), Some(70.0));
        assert_eq!(state.baseline_for(day(12)), Some(60.0));
        assert_eq!(state.baseline_for(day(5)), None);
    }

    #[test]
    fn test_rerun_within_week_keeps_last_weeks_baseline() {
        let last_week = DigestState::advance(None, day(12), 70.0);
        assert_eq!(last_week.previous_week_score, None);

        let first = DigestState::advance(Some(&last_week), day(19), 80.0);
        assert_eq!(first.previous_week_score, Some(70.0));

        let rerun = DigestState::advance(Some(&first), day(19), 85.0);
        assert_eq!(rerun.balance_score, 85.0);
        assert_eq!(rerun.baseline_for(day(19)), Some(70.0));
        assert_eq!(rerun.baseline_for(day(26)), Some(85.0));
    }

    #[test]
    fn test_state_round_trips_through_home_dir() {
        let home = tempfile::tempdir().unwrap();
        assert_eq!(read_digest_state(home.path()).unwrap(), None);

        let state = DigestState::advance(None, day(19), 77.5);
        write_digest_state(home.path(), &state).unwrap();
        assert_eq!(read_digest_state(home.path()).unwrap(), Some(state));
    }

    #[test]
    fn test_state_without_previous_week_score_still_parses() {
        let state: DigestState =
            serde_json::from_str(r#"{"week_start":"2026-10-12","balance_score":64.0}"#).unwrap();
        assert_eq!(state.previous_week_score, None);
        assert_eq!(state.baseline_for(day(19)), Some(64.0));
    }
}
