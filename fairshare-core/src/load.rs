//! Load aggregator: time-decayed load, trend and fatigue per member.
//!
//! Everything is recomputed from the caller's history slice on each call;
//! nothing is cached between calls.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::category::TaskCategory;
use crate::config::{DecayConfig, FatigueConfig, LoadConfig, TrendConfig};
use crate::error::EngineError;
use crate::history::HistoricalLoadEntry;
use crate::time::age_in_days;

const WEEK_DAYS: f64 = 7.0;
const MONTH_DAYS: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadTrend {
    Increasing,
    Stable,
    Decreasing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FatigueZone {
    Rested,
    Normal,
    Tired,
    Exhausted,
    Burnout,
}

impl FatigueZone {
    pub fn from_level(level: f64, cfg: &FatigueConfig) -> Self {
        if level < cfg.rested_below {
            FatigueZone::Rested
        } else if level < cfg.normal_below {
            FatigueZone::Normal
        } else if level < cfg.tired_below {
            FatigueZone::Tired
        } else if level <= cfg.burnout_above {
            FatigueZone::Exhausted
        } else {
            FatigueZone::Burnout
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FatigueZone::Rested => "rested",
            FatigueZone::Normal => "normal",
            FatigueZone::Tired => "tired",
            FatigueZone::Exhausted => "exhausted",
            FatigueZone::Burnout => "burnout",
        }
    }
}

/// Aggregated view of one member's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadAggregate {
    pub member_id: String,
    /// Time-weighted load: sum of weight x decay(age).
    pub score: f64,
    pub by_category: BTreeMap<TaskCategory, f64>,
    pub trend: LoadTrend,
    /// Signed relative change between the recent and older window halves.
    pub trend_change: f64,
    /// 0-100.
    pub fatigue: f64,
    pub weekly_load: f64,
    pub monthly_load: f64,
    pub pending: usize,
    pub completed: usize,
}

/// Decay factor for an entry of the given age: 1.0 at age 0, linear down to
/// `floor` at `max_age_days`, clamped at the floor afterwards.
pub fn decay_factor(age_days: f64, cfg: &DecayConfig) -> f64 {
    if age_days <= 0.0 {
        return 1.0;
    }
    if age_days >= cfg.max_age_days {
        return cfg.floor;
    }
    1.0 - (1.0 - cfg.floor) * (age_days / cfg.max_age_days)
}

/// Sum of `weight x decay(age)`; zero entries give 0.
pub fn time_weighted_load<'a>(
    entries: impl IntoIterator<Item = &'a HistoricalLoadEntry>,
    now: DateTime<Utc>,
    cfg: &DecayConfig,
) -> f64 {
    entries
        .into_iter()
        .map(|e| e.weight * decay_factor(age_in_days(e.date, now), cfg))
        .sum()
}

/// Same sum partitioned by category.
pub fn category_load<'a>(
    entries: impl IntoIterator<Item = &'a HistoricalLoadEntry>,
    now: DateTime<Utc>,
    cfg: &DecayConfig,
) -> BTreeMap<TaskCategory, f64> {
    let mut out: BTreeMap<TaskCategory, f64> = BTreeMap::new();
    for e in entries {
        *out.entry(e.category).or_default() +=
            e.weight * decay_factor(age_in_days(e.date, now), cfg);
    }
    out
}

/// Compare average daily load of the recent half of the lookback window
/// with the older half.
pub fn load_trend<'a>(
    entries: impl IntoIterator<Item = &'a HistoricalLoadEntry>,
    now: DateTime<Utc>,
    window_days: f64,
    cfg: &TrendConfig,
) -> (LoadTrend, f64) {
    let half = window_days / 2.0;
    let mut recent = 0.0;
    let mut older = 0.0;
    let mut points = 0usize;

    for e in entries {
        let age = age_in_days(e.date, now);
        if age >= window_days {
            continue;
        }
        points += 1;
        if age < half {
            recent += e.weight;
        } else {
            older += e.weight;
        }
    }

    if points < cfg.min_data_points.max(2) {
        return (LoadTrend::Stable, 0.0);
    }

    let recent_avg = recent / half;
    let older_avg = older / half;

    let change = if older_avg > 0.0 {
        (recent_avg - older_avg) / older_avg
    } else if recent_avg > 0.0 {
        1.0
    } else {
        0.0
    };

    let trend = if change > cfg.threshold {
        LoadTrend::Increasing
    } else if change < -cfg.threshold {
        LoadTrend::Decreasing
    } else {
        LoadTrend::Stable
    };
    (trend, change)
}

/// Saturating fatigue curve: `100 x (1 - 2^-ratio)` where ratio is the
/// recent daily load over the sustainable daily load.
pub fn fatigue_level<'a>(
    entries: impl IntoIterator<Item = &'a HistoricalLoadEntry>,
    now: DateTime<Utc>,
    cfg: &FatigueConfig,
) -> f64 {
    let recent: f64 = entries
        .into_iter()
        .filter(|e| age_in_days(e.date, now) < cfg.window_days)
        .map(|e| e.weight)
        .sum();
    let ratio = (recent / cfg.window_days) / cfg.sustainable_daily_load;
    (100.0 * (1.0 - 2f64.powf(-ratio))).clamp(0.0, 100.0)
}

fn raw_load_within<'a>(
    entries: impl IntoIterator<Item = &'a HistoricalLoadEntry>,
    now: DateTime<Utc>,
    days: f64,
) -> f64 {
    entries
        .into_iter()
        .filter(|e| age_in_days(e.date, now) < days)
        .map(|e| e.weight)
        .sum()
}

/// Aggregate one member's slice of the household log.
pub fn aggregate(
    entries: &[HistoricalLoadEntry],
    member_id: &str,
    now: DateTime<Utc>,
    cfg: &LoadConfig,
) -> Result<LoadAggregate, EngineError> {
    let mine: Vec<&HistoricalLoadEntry> =
        entries.iter().filter(|e| e.member_id == member_id).collect();
    for e in &mine {
        e.validate()?;
    }

    let score = time_weighted_load(mine.iter().copied(), now, &cfg.decay);
    let by_category = category_load(mine.iter().copied(), now, &cfg.decay);
    let (trend, trend_change) =
        load_trend(mine.iter().copied(), now, cfg.decay.max_age_days, &cfg.trend);
    let fatigue = fatigue_level(mine.iter().copied(), now, &cfg.fatigue);
    let completed = mine.iter().filter(|e| e.completed).count();

    debug!(
        member_id,
        entries = mine.len(),
        score,
        fatigue,
        ?trend,
        "aggregated member load"
    );

    Ok(LoadAggregate {
        member_id: member_id.to_string(),
        score,
        by_category,
        trend,
        trend_change,
        fatigue,
        weekly_load: raw_load_within(mine.iter().copied(), now, WEEK_DAYS),
        monthly_load: raw_load_within(mine.iter().copied(), now, MONTH_DAYS),
        pending: mine.len() - completed,
        completed,
    })
}

/// Identity of a household member for summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseholdMember {
    pub id: String,
    pub name: String,
}

impl HouseholdMember {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Ephemeral per-member summary consumed by the alert analyzer and the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserLoadSummary {
    pub member_id: String,
    pub member_name: String,
    pub current_load: f64,
    pub weekly_load: f64,
    pub monthly_load: f64,
    pub load_trend: LoadTrend,
    pub trend_change: f64,
    pub fatigue_level: f64,
    pub fatigue_zone: FatigueZone,
    /// Share of the household's current load, 0-100.
    pub balance_percentage: f64,
    pub pending_tasks: usize,
    pub completed_tasks: usize,
    pub category_breakdown: BTreeMap<TaskCategory, f64>,
}

/// Summarize every roster member. Balance percentages sum to 100, or are all
/// zero when the household carries no load.
pub fn summarize_household(
    roster: &[HouseholdMember],
    entries: &[HistoricalLoadEntry],
    now: DateTime<Utc>,
    cfg: &LoadConfig,
) -> Result<Vec<UserLoadSummary>, EngineError> {
    let aggregates = roster
        .iter()
        .map(|m| aggregate(entries, &m.id, now, cfg))
        .collect::<Result<Vec<_>, _>>()?;

    let total: f64 = aggregates.iter().map(|a| a.score).sum();

    Ok(roster
        .iter()
        .zip(aggregates)
        .map(|(member, agg)| UserLoadSummary {
            member_id: member.id.clone(),
            member_name: member.name.clone(),
            current_load: agg.score,
            weekly_load: agg.weekly_load,
            monthly_load: agg.monthly_load,
            load_trend: agg.trend,
            trend_change: agg.trend_change,
            fatigue_level: agg.fatigue,
            fatigue_zone: FatigueZone::from_level(agg.fatigue, &cfg.fatigue),
            balance_percentage: if total > 0.0 { agg.score / total * 100.0 } else { 0.0 },
            pending_tasks: agg.pending,
            completed_tasks: agg.completed,
            category_breakdown: agg.by_category,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn entry(member: &str, days_ago: i64, category: TaskCategory, weight: f64) -> HistoricalLoadEntry {
        HistoricalLoadEntry::new(
            now() - Duration::days(days_ago),
            member,
            format!("{member}-{days_ago}"),
            category,
            weight,
        )
    }

    #[test]
    fn test_decay_endpoints_and_floor() {
        let cfg = DecayConfig::default();
        assert_eq!(decay_factor(0.0, &cfg), 1.0);
        assert_eq!(decay_factor(-3.0, &cfg), 1.0);
        assert_eq!(decay_factor(30.0, &cfg), 0.1);
        assert_eq!(decay_factor(400.0, &cfg), 0.1);
        assert!((decay_factor(15.0, &cfg) - 0.55).abs() < 1e-12);
    }

    #[test]
    fn test_old_spike_still_registers() {
        let cfg = LoadConfig::default();
        let log = vec![entry("alex", 90, TaskCategory::Health, 10.0)];
        let agg = aggregate(&log, "alex", now(), &cfg).unwrap();
        assert!((agg.score - 1.0).abs() < 1e-9);
        assert_eq!(agg.monthly_load, 0.0);
    }

    #[test]
    fn test_empty_history_is_zero_and_stable() {
        let agg = aggregate(&[], "alex", now(), &LoadConfig::default()).unwrap();
        assert_eq!(agg.score, 0.0);
        assert_eq!(agg.trend, LoadTrend::Stable);
        assert_eq!(agg.fatigue, 0.0);
        assert!(agg.by_category.is_empty());
    }

    #[test]
    fn test_single_point_is_stable() {
        let log = vec![entry("alex", 1, TaskCategory::Daily, 5.0)];
        let (trend, change) = load_trend(&log, now(), 30.0, &TrendConfig::default());
        assert_eq!(trend, LoadTrend::Stable);
        assert_eq!(change, 0.0);
    }

    #[test]
    fn test_trend_direction() {
        let cfg = TrendConfig::default();
        let rising = vec![
            entry("a", 20, TaskCategory::Daily, 2.0),
            entry("a", 3, TaskCategory::Daily, 4.0),
            entry("a", 2, TaskCategory::Daily, 4.0),
        ];
        let (trend, change) = load_trend(&rising, now(), 30.0, &cfg);
        assert_eq!(trend, LoadTrend::Increasing);
        assert!((change - 3.0).abs() < 1e-9);

        let falling = vec![
            entry("a", 20, TaskCategory::Daily, 6.0),
            entry("a", 2, TaskCategory::Daily, 2.0),
        ];
        assert_eq!(load_trend(&falling, now(), 30.0, &cfg).0, LoadTrend::Decreasing);

        let flat = vec![
            entry("a", 20, TaskCategory::Daily, 3.0),
            entry("a", 2, TaskCategory::Daily, 3.2),
        ];
        assert_eq!(load_trend(&flat, now(), 30.0, &cfg).0, LoadTrend::Stable);
    }

    #[test]
    fn test_trend_with_empty_older_half() {
        let log = vec![
            entry("a", 2, TaskCategory::Daily, 1.0),
            entry("a", 1, TaskCategory::Daily, 1.0),
        ];
        let (trend, change) = load_trend(&log, now(), 30.0, &TrendConfig::default());
        assert_eq!(trend, LoadTrend::Increasing);
        assert_eq!(change, 1.0);
    }

    #[test]
    fn test_fatigue_is_saturating() {
        let cfg = FatigueConfig::default();
        // 21 points over 7 days = 3/day = sustainable => 50.
        let sustained: Vec<_> = (0..7).map(|d| entry("a", d, TaskCategory::Daily, 3.0)).collect();
        assert!((fatigue_level(&sustained, now(), &cfg) - 50.0).abs() < 1e-9);

        let one_heavy_day = vec![entry("a", 1, TaskCategory::Health, 10.0)];
        let spike = fatigue_level(&one_heavy_day, now(), &cfg);
        assert!(spike < 50.0, "one heavy day should not spike fatigue: {spike}");

        let crushing: Vec<_> = (0..7).map(|d| entry("a", d, TaskCategory::Daily, 30.0)).collect();
        let level = fatigue_level(&crushing, now(), &cfg);
        assert!(level > 85.0 && level <= 100.0);
        assert_eq!(FatigueZone::from_level(level, &cfg), FatigueZone::Burnout);
    }

    #[test]
    fn test_fatigue_zones() {
        let cfg = FatigueConfig::default();
        assert_eq!(FatigueZone::from_level(5.0, &cfg), FatigueZone::Rested);
        assert_eq!(FatigueZone::from_level(35.0, &cfg), FatigueZone::Normal);
        assert_eq!(FatigueZone::from_level(60.0, &cfg), FatigueZone::Tired);
        assert_eq!(FatigueZone::from_level(85.0, &cfg), FatigueZone::Exhausted);
        assert_eq!(FatigueZone::from_level(90.0, &cfg), FatigueZone::Burnout);
    }

    #[test]
    fn test_category_breakdown_partitions_score() {
        let cfg = LoadConfig::default();
        let log = vec![
            entry("alex", 0, TaskCategory::Health, 4.0),
            entry("alex", 15, TaskCategory::Daily, 2.0),
            entry("sam", 0, TaskCategory::Daily, 9.0),
        ];
        let agg = aggregate(&log, "alex", now(), &cfg).unwrap();
        let total: f64 = agg.by_category.values().sum();
        assert!((total - agg.score).abs() < 1e-9);
        assert_eq!(agg.by_category.get(&TaskCategory::Health), Some(&4.0));
        assert!(!agg.by_category.contains_key(&TaskCategory::Logistics));
    }

    #[test]
    fn test_pending_and_completed_counts() {
        let log = vec![
            entry("alex", 1, TaskCategory::Daily, 1.0),
            entry("alex", 2, TaskCategory::Daily, 1.0).pending(),
        ];
        let agg = aggregate(&log, "alex", now(), &LoadConfig::default()).unwrap();
        assert_eq!(agg.completed, 1);
        assert_eq!(agg.pending, 1);
    }

    #[test]
    fn test_malformed_entry_is_rejected() {
        let log = vec![entry("alex", 1, TaskCategory::Daily, f64::NAN)];
        assert!(aggregate(&log, "alex", now(), &LoadConfig::default()).is_err());
        // Another member's bad entry does not affect this member.
        assert!(aggregate(&log, "sam", now(), &LoadConfig::default()).is_ok());
    }

    #[test]
    fn test_balance_percentages_sum_to_100() {
        let roster = vec![
            HouseholdMember::new("alex", "Alex"),
            HouseholdMember::new("sam", "Sam"),
            HouseholdMember::new("kim", "Kim"),
        ];
        let log = vec![
            entry("alex", 1, TaskCategory::Daily, 3.0),
            entry("sam", 4, TaskCategory::Health, 4.0),
            entry("kim", 10, TaskCategory::Education, 2.0),
        ];
        let summaries = summarize_household(&roster, &log, now(), &LoadConfig::default()).unwrap();
        let sum: f64 = summaries.iter().map(|s| s.balance_percentage).sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_balance_percentages_all_zero_without_load() {
        let roster = vec![HouseholdMember::new("alex", "Alex"), HouseholdMember::new("sam", "Sam")];
        let summaries = summarize_household(&roster, &[], now(), &LoadConfig::default()).unwrap();
        assert!(summaries.iter().all(|s| s.balance_percentage == 0.0));
        assert!(summaries.iter().all(|s| s.fatigue_zone == FatigueZone::Rested));
    }
}
