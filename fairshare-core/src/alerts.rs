//! Balance alert analyzer: household status band, per-member alerts and
//! supportive wording for the people reading it.
//!
//! Generated text describes load, never people's character. The words in
//! [`BANNED_TERMS`] must not appear in any output.

use serde::{Deserialize, Serialize};

use crate::config::AlertConfig;
use crate::fairness::fairness_report;
use crate::load::{FatigueZone, LoadTrend, UserLoadSummary};

/// Words that must never appear in generated text.
pub const BANNED_TERMS: [&str; 7] = [
    "fault", "guilty", "blame", "lazy", "slacker", "failure", "selfish",
];

/// True if `text` contains any banned term, case-insensitively.
pub fn contains_banned_term(text: &str) -> bool {
    let lower = text.to_lowercase();
    BANNED_TERMS.iter().any(|t| lower.contains(t))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BalanceLevel {
    Balanced,
    MildImbalance,
    Imbalance,
    Critical,
}

impl BalanceLevel {
    pub fn from_score(score: f64, cfg: &AlertConfig) -> Self {
        if score >= cfg.balanced_min {
            BalanceLevel::Balanced
        } else if score >= cfg.mild_imbalance_min {
            BalanceLevel::MildImbalance
        } else if score >= cfg.imbalance_min {
            BalanceLevel::Imbalance
        } else {
            BalanceLevel::Critical
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BalanceLevel::Balanced => "balanced",
            BalanceLevel::MildImbalance => "mild imbalance",
            BalanceLevel::Imbalance => "imbalance",
            BalanceLevel::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertKind {
    HighFatigue,
    RisingLoad,
    LoadOutlier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceAlert {
    pub member_id: String,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendNarrative {
    pub member_id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceStatus {
    pub status: BalanceLevel,
    pub balance_score: f64,
    pub gini: f64,
    pub alerts: Vec<BalanceAlert>,
    pub positives: Vec<String>,
    pub recommendations: Vec<String>,
    pub narrative: String,
    pub trend_narratives: Vec<TrendNarrative>,
}

impl BalanceStatus {
    /// Every generated sentence, for display or auditing.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.narrative.as_str())
            .chain(self.alerts.iter().map(|a| a.message.as_str()))
            .chain(self.positives.iter().map(String::as_str))
            .chain(self.recommendations.iter().map(String::as_str))
            .chain(self.trend_narratives.iter().map(|t| t.text.as_str()))
    }
}

/// One deterministic sentence from trend direction and change magnitude.
pub fn trend_narrative(summary: &UserLoadSummary) -> String {
    let name = &summary.member_name;
    let pct = (summary.trend_change * 100.0).round();
    match summary.load_trend {
        LoadTrend::Increasing if pct >= 50.0 => {
            format!("{name}'s load rose sharply recently (+{pct:.0}%).")
        }
        LoadTrend::Increasing => format!("{name}'s load is going up (+{pct:.0}%)."),
        LoadTrend::Decreasing if pct <= -50.0 => {
            format!("{name}'s load dropped considerably ({pct:.0}%).")
        }
        LoadTrend::Decreasing => format!("{name}'s load is easing ({pct:.0}%)."),
        LoadTrend::Stable => format!("{name}'s load is steady."),
    }
}

fn household_narrative(level: BalanceLevel, score: f64, members: usize) -> String {
    if members == 0 {
        return "No household members to review yet.".to_string();
    }
    match level {
        BalanceLevel::Balanced => {
            format!("Household tasks are shared well (balance {score:.0}/100).")
        }
        BalanceLevel::MildImbalance => format!(
            "Household tasks are slightly uneven (balance {score:.0}/100); a small adjustment would help."
        ),
        BalanceLevel::Imbalance => format!(
            "Household tasks are noticeably uneven (balance {score:.0}/100); consider sharing out upcoming tasks differently."
        ),
        BalanceLevel::Critical => format!(
            "Most of the household load sits with few people (balance {score:.0}/100); rebalancing this week is recommended."
        ),
    }
}

/// Household status band, per-member alerts and supportive wording.
pub fn analyze(summaries: &[UserLoadSummary], cfg: &AlertConfig) -> BalanceStatus {
    let loads: Vec<f64> = summaries.iter().map(|s| s.current_load).collect();
    let report = fairness_report(&loads);
    let status = BalanceLevel::from_score(report.balance_score, cfg);

    let mut alerts = Vec::new();
    let mut positives = Vec::new();
    let mut recommendations = Vec::new();

    let fair_share = if summaries.is_empty() {
        0.0
    } else {
        100.0 / summaries.len() as f64
    };

    for s in summaries {
        let name = &s.member_name;

        if s.fatigue_level >= cfg.fatigue_critical {
            alerts.push(BalanceAlert {
                member_id: s.member_id.clone(),
                kind: AlertKind::HighFatigue,
                severity: AlertSeverity::Critical,
                message: format!(
                    "{name} is carrying a very heavy week (fatigue {:.0}/100).",
                    s.fatigue_level
                ),
            });
            recommendations.push(format!("Plan a lighter few days and some rest for {name}."));
        } else if s.fatigue_level >= cfg.fatigue_warning {
            alerts.push(BalanceAlert {
                member_id: s.member_id.clone(),
                kind: AlertKind::HighFatigue,
                severity: AlertSeverity::Warning,
                message: format!("{name} is getting tired (fatigue {:.0}/100).", s.fatigue_level),
            });
            recommendations.push(format!("Give {name} fewer new tasks over the next days."));
        }

        if s.load_trend == LoadTrend::Increasing && s.trend_change >= cfg.rising_trend_min_change {
            alerts.push(BalanceAlert {
                member_id: s.member_id.clone(),
                kind: AlertKind::RisingLoad,
                severity: AlertSeverity::Warning,
                message: format!(
                    "{name}'s load has grown by {:.0}% recently.",
                    s.trend_change * 100.0
                ),
            });
            recommendations.push(format!("Review {name}'s upcoming tasks before the load builds further."));
        }

        if summaries.len() >= 2 && s.balance_percentage > fair_share * cfg.outlier_share_factor {
            alerts.push(BalanceAlert {
                member_id: s.member_id.clone(),
                kind: AlertKind::LoadOutlier,
                severity: AlertSeverity::Warning,
                message: format!(
                    "{name} handles {:.0}% of the household load (even share {fair_share:.0}%).",
                    s.balance_percentage
                ),
            });
        }

        if s.fatigue_zone == FatigueZone::Rested {
            positives.push(format!("{name} is well rested."));
        }
        if s.load_trend == LoadTrend::Decreasing {
            positives.push(format!("{name}'s load is easing."));
        }
    }

    if status == BalanceLevel::Balanced && !summaries.is_empty() {
        positives.insert(0, "Tasks are shared evenly across the household.".to_string());
    }

    if status != BalanceLevel::Balanced {
        let most = summaries
            .iter()
            .max_by(|a, b| a.current_load.total_cmp(&b.current_load).then_with(|| b.member_id.cmp(&a.member_id)));
        let least = summaries
            .iter()
            .min_by(|a, b| a.current_load.total_cmp(&b.current_load).then_with(|| a.member_id.cmp(&b.member_id)));
        if let (Some(most), Some(least)) = (most, least) {
            if most.member_id != least.member_id {
                recommendations.insert(
                    0,
                    format!(
                        "Hand one or two upcoming tasks from {} to {}.",
                        most.member_name, least.member_name
                    ),
                );
            }
        }
    }

    let trend_narratives = summaries
        .iter()
        .map(|s| TrendNarrative {
            member_id: s.member_id.clone(),
            text: trend_narrative(s),
        })
        .collect();

    BalanceStatus {
        status,
        balance_score: report.balance_score,
        gini: report.gini,
        alerts,
        positives,
        recommendations,
        narrative: household_narrative(status, report.balance_score, summaries.len()),
        trend_narratives,
    }
}
