// Reputation inputs: per-account scores supplied by the reputation service.
//
// The engine only reads these. Scores are conventionally on a 0-1000 scale
// but nothing here enforces that.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Upper end of the conventional reputation scale.
pub const REPUTATION_SCALE: f64 = 1000.0;

/// One account's reputation as computed upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationEntry {
    pub final_score: f64,
    /// Upstream estimate (0.0-1.0) that the account is a Sybil
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sybil_risk: Option<f64>,
    /// Named sub-scores; doubles as a behavioral fingerprint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentile: Option<f64>,
}

impl ReputationEntry {
    pub fn new(final_score: f64) -> Self {
        Self {
            final_score,
            ..Self::default()
        }
    }

    pub fn with_sybil_risk(mut self, sybil_risk: f64) -> Self {
        self.sybil_risk = Some(sybil_risk);
        self
    }

    pub fn with_breakdown<K: Into<String>>(mut self, parts: impl IntoIterator<Item = (K, f64)>) -> Self {
        self.breakdown = Some(parts.into_iter().map(|(k, v)| (k.into(), v)).collect());
        self
    }

    /// Sybil risk with a missing value read as 0.0.
    pub fn sybil_risk_or_zero(&self) -> f64 {
        self.sybil_risk.unwrap_or(0.0)
    }
}

/// Account id -> reputation. Ordered so every pass over it is deterministic.
pub type ReputationScores = BTreeMap<String, ReputationEntry>;

/// Final score for `id`, with unknown accounts counted as 0.0.
pub fn score_of(scores: &ReputationScores, id: &str) -> f64 {
    scores.get(id).map(|e| e.final_score).unwrap_or(0.0)
}
