//! Weekly digest for the household.
//!
//! The digest is keyed by the household-local Monday, but member loads and
//! shares are the rolling seven days up to `now`, as reported by the load
//! aggregator. Completed and pending counts cover the whole supplied log.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::alerts::{BalanceLevel, analyze};
use crate::config::AlertConfig;
use crate::load::{FatigueZone, UserLoadSummary};
use crate::time::{local_day, week_start};

/// Score movement below this many points reads as "about the same".
const STEADY_SCORE_DELTA: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigestLine {
    pub member_id: String,
    pub member_name: String,
    /// Raw load over the seven days up to the digest's `window_end`.
    pub weekly_load: f64,
    /// Share of the household's rolling seven-day load, 0-100.
    pub share: f64,
    pub completed: usize,
    pub pending: usize,
    pub fatigue_zone: FatigueZone,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyDigest {
    /// Monday of the week, household-local.
    pub week_start: NaiveDate,
    /// Household-local day of `now`; the load window ends here.
    pub window_end: NaiveDate,
    pub balance_score: f64,
    /// Change against the previous digest's score, when known.
    pub score_change: Option<f64>,
    pub status: BalanceLevel,
    pub lines: Vec<DigestLine>,
    pub highlights: Vec<String>,
    pub recommendations: Vec<String>,
    pub narrative: String,
}

pub fn weekly_digest(
    summaries: &[UserLoadSummary],
    previous_score: Option<f64>,
    now: DateTime<Utc>,
    tz: Tz,
    cfg: &AlertConfig,
) -> WeeklyDigest {
    let status = analyze(summaries, cfg);
    let week = week_start(now, tz);
    let window_end = local_day(now, tz);

    let week_total: f64 = summaries.iter().map(|s| s.weekly_load).sum();
    let lines: Vec<DigestLine> = summaries
        .iter()
        .map(|s| DigestLine {
            member_id: s.member_id.clone(),
            member_name: s.member_name.clone(),
            weekly_load: s.weekly_load,
            share: if week_total > 0.0 {
                s.weekly_load / week_total * 100.0
            } else {
                0.0
            },
            completed: s.completed_tasks,
            pending: s.pending_tasks,
            fatigue_zone: s.fatigue_zone,
        })
        .collect();

    let score_change = previous_score.map(|prev| status.balance_score - prev);

    let mut highlights = Vec::new();
    let completed_total: usize = lines.iter().map(|l| l.completed).sum();
    if completed_total > 0 {
        highlights.push(format!("{completed_total} tasks completed together."));
    }
    if let Some(top) = lines
        .iter()
        .filter(|l| l.completed > 0)
        .max_by(|a, b| a.completed.cmp(&b.completed).then_with(|| b.member_id.cmp(&a.member_id)))
    {
        highlights.push(format!(
            "Thanks to {} for completing {} tasks.",
            top.member_name, top.completed
        ));
    }
    match score_change {
        Some(delta) if delta >= STEADY_SCORE_DELTA => {
            highlights.push(format!("Balance improved by {delta:.0} points since last week."))
        }
        Some(delta) if delta <= -STEADY_SCORE_DELTA => highlights.push(format!(
            "Balance slipped by {:.0} points since last week.",
            delta.abs()
        )),
        Some(_) => highlights.push("Balance held steady since last week.".to_string()),
        None => {}
    }
    highlights.extend(status.positives.iter().cloned());

    let mut narrative = format!(
        "Week of {} (loads over the seven days to {}): balance {:.0}/100 ({}).",
        week.format("%Y-%m-%d"),
        window_end.format("%Y-%m-%d"),
        status.balance_score,
        status.status.label()
    );
    narrative.push(' ');
    narrative.push_str(&status.narrative);

    WeeklyDigest {
        week_start: week,
        window_end,
        balance_score: status.balance_score,
        score_change,
        status: status.status,
        lines,
        highlights,
        recommendations: status.recommendations,
        narrative,
    }
}
