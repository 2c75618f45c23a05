//! Population fairness: Gini coefficient and the 0-100 balance score.

use serde::{Deserialize, Serialize};

/// Gini coefficient of a set of loads, in [0, 1].
///
/// Mean absolute difference over all ordered pairs divided by twice the
/// mean. Empty, single-member, all-equal and all-zero inputs give exactly 0.
/// Negative or NaN loads are treated as 0; callers validate at the boundary.
pub fn gini(loads: &[f64]) -> f64 {
    let n = loads.len();
    if n < 2 {
        return 0.0;
    }
    let values: Vec<f64> = loads.iter().map(|v| v.max(0.0)).collect();
    let sum: f64 = values.iter().sum();
    if sum <= 0.0 {
        return 0.0;
    }
    let mean = sum / n as f64;

    let mut abs_diff = 0.0;
    for a in &values {
        for b in &values {
            abs_diff += (a - b).abs();
        }
    }
    (abs_diff / (2.0 * (n * n) as f64 * mean)).clamp(0.0, 1.0)
}

/// `100 x (1 - gini)`: 100 is perfect equality.
pub fn balance_score(loads: &[f64]) -> f64 {
    100.0 * (1.0 - gini(loads))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairnessReport {
    pub gini: f64,
    pub balance_score: f64,
    pub mean: f64,
    pub max: f64,
    pub min: f64,
}

pub fn fairness_report(loads: &[f64]) -> FairnessReport {
    let g = gini(loads);
    let (mean, max, min) = if loads.is_empty() {
        (0.0, 0.0, 0.0)
    } else {
        let sum: f64 = loads.iter().sum();
        (
            sum / loads.len() as f64,
            loads.iter().copied().fold(f64::MIN, f64::max),
            loads.iter().copied().fold(f64::MAX, f64::min),
        )
    };
    FairnessReport {
        gini: g,
        balance_score: 100.0 * (1.0 - g),
        mean,
        max,
        min,
    }
}
