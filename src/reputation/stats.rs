// Reputation statistics over a group of accounts.
//
// Two signals come out of this: how low the group's reputation is, and how
// uniform it is. Fake accounts minted by one operator tend to be scored
// identically, so near-zero variance reads as maximally uniform.

use serde::{Deserialize, Serialize};

use super::models::{score_of, ReputationScores, REPUTATION_SCALE};

/// Dispersion and level statistics for one group's reputation scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationStats {
    pub avg: f64,
    pub max: f64,
    pub min: f64,
    /// Population variance
    pub variance: f64,
    /// `1 - avg/1000`, clamped to [0, 1]
    pub low_reputation_score: f64,
    /// `1 / (1 + variance)`, or 1.0 when every score is identical
    pub uniformity_score: f64,
}

/// An empty group counts as maximally suspicious rather than "no data".
impl Default for ReputationStats {
    fn default() -> Self {
        Self {
            avg: 0.0,
            max: 0.0,
            min: 0.0,
            variance: 0.0,
            low_reputation_score: 1.0,
            uniformity_score: 1.0,
        }
    }
}

/// Compute statistics for `nodes`. Accounts missing from `scores` are
/// counted with a score of 0.0 rather than dropped.
pub fn analyze(nodes: &[String], scores: &ReputationScores) -> ReputationStats {
    let values: Vec<f64> = nodes.iter().map(|id| score_of(scores, id)).collect();
    from_values(&values)
}

/// Compute statistics from raw score values.
pub fn from_values(values: &[f64]) -> ReputationStats {
    if values.is_empty() {
        return ReputationStats::default();
    }

    let avg = mean(values);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let variance = population_variance(values);

    ReputationStats {
        avg,
        max,
        min,
        variance,
        low_reputation_score: (1.0 - avg / REPUTATION_SCALE).clamp(0.0, 1.0),
        uniformity_score: uniformity(variance),
    }
}

/// `1 / (1 + variance)` for positive variance, otherwise exactly 1.0.
pub fn uniformity(variance: f64) -> f64 {
    if variance > 0.0 {
        1.0 / (1.0 + variance)
    } else {
        1.0
    }
}

/// Arithmetic mean. Returns 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance. Returns 0.0 for an empty slice.
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}
