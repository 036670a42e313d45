// Cluster suspicion score: weighted fusion of the four analyzers.
//
// Each analyzer's raw metrics are first folded into one composite with fixed
// internal sub-weights, then the four composites are combined with the
// configurable `DetectionWeights`:
//
//   reputation = 0.6 * low_reputation + 0.4 * uniformity
//   structure  = 0.3 * density + 0.2 * clustering
//              + 0.3 * (1 - external_connectivity) + 0.2 * reciprocity
//   behavioral = 0.4 * activity_sync + 0.4 * content_similarity
//              + 0.2 * interaction_reciprocity
//   temporal   = time_clustering
//
//   score = min(1, sum(weight * composite))
//
// Risk factors are evaluated independently from the raw metrics.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{DetectionConfig, DetectionWeights};
use crate::models::ClusterMetrics;

// Fixed sub-weights
const REP_LOW: f64 = 0.6;
const REP_UNIFORM: f64 = 0.4;
const STRUCT_DENSITY: f64 = 0.3;
const STRUCT_CLUSTERING: f64 = 0.2;
const STRUCT_ISOLATION: f64 = 0.3;
const STRUCT_RECIPROCITY: f64 = 0.2;
const BEHAV_SYNC: f64 = 0.4;
const BEHAV_CONTENT: f64 = 0.4;
const BEHAV_RECIPROCITY: f64 = 0.2;

// Risk factor thresholds
const HIGH_DENSITY: f64 = 0.8;
const LOW_EXTERNAL: f64 = 0.2;
const SYNCHRONIZED: f64 = 0.7;
const SIMILAR_CONTENT: f64 = 0.6;
const HIGH_RECIPROCITY: f64 = 0.8;
const SIMILAR_AGES: f64 = 0.7;
const BURSTY: f64 = 0.7;
const REGULAR: f64 = 0.7;

/// A discrete reason a cluster looks coordinated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskFactor {
    LowReputationCluster,
    HighInternalDensity,
    LowExternalConnectivity,
    SynchronizedActivity,
    SimilarContentPatterns,
    HighReciprocity,
    SimilarAccountAges,
    BurstActivityPattern,
    RegularActivityPattern,
}

impl RiskFactor {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskFactor::LowReputationCluster => "low-reputation-cluster",
            RiskFactor::HighInternalDensity => "high-internal-density",
            RiskFactor::LowExternalConnectivity => "low-external-connectivity",
            RiskFactor::SynchronizedActivity => "synchronized-activity",
            RiskFactor::SimilarContentPatterns => "similar-content-patterns",
            RiskFactor::HighReciprocity => "high-reciprocity",
            RiskFactor::SimilarAccountAges => "similar-account-ages",
            RiskFactor::BurstActivityPattern => "burst-activity-pattern",
            RiskFactor::RegularActivityPattern => "regular-activity-pattern",
        }
    }
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-analyzer composites, before the configurable weights are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeScores {
    pub reputation: f64,
    pub structure: f64,
    pub behavioral: f64,
    pub temporal: f64,
}

/// Fold raw metrics into the four composites.
pub fn composite_scores(metrics: &ClusterMetrics) -> CompositeScores {
    let rep = &metrics.reputation;
    let st = &metrics.structure;
    let bh = &metrics.behavior;

    CompositeScores {
        reputation: REP_LOW * rep.low_reputation_score + REP_UNIFORM * rep.uniformity_score,
        structure: STRUCT_DENSITY * st.density
            + STRUCT_CLUSTERING * st.avg_clustering
            + STRUCT_ISOLATION * (1.0 - st.external_connectivity)
            + STRUCT_RECIPROCITY * st.reciprocity,
        behavioral: BEHAV_SYNC * bh.activity_sync
            + BEHAV_CONTENT * bh.content_similarity
            + BEHAV_RECIPROCITY * bh.interaction_reciprocity,
        temporal: metrics.temporal.time_clustering_score,
    }
}

/// Weighted sum of the composites, capped at 1.0.
///
/// NaN passes through untouched so the caller can reject it.
pub fn suspicion_score(composites: &CompositeScores, weights: &DetectionWeights) -> f64 {
    let raw = weights.reputation_based * composites.reputation
        + weights.graph_structure * composites.structure
        + weights.behavioral_patterns * composites.behavioral
        + weights.temporal_patterns * composites.temporal;

    if raw.is_nan() {
        raw
    } else {
        raw.clamp(0.0, 1.0)
    }
}

/// Every risk factor that applies, in fixed evaluation order.
pub fn risk_factors(metrics: &ClusterMetrics, config: &DetectionConfig) -> Vec<RiskFactor> {
    let rep = &metrics.reputation;
    let st = &metrics.structure;
    let bh = &metrics.behavior;
    let tp = &metrics.temporal;

    let checks = [
        (
            RiskFactor::LowReputationCluster,
            rep.avg < config.low_reputation_cutoff(),
        ),
        (RiskFactor::HighInternalDensity, st.density > HIGH_DENSITY),
        (
            RiskFactor::LowExternalConnectivity,
            st.external_connectivity < LOW_EXTERNAL,
        ),
        (RiskFactor::SynchronizedActivity, bh.activity_sync > SYNCHRONIZED),
        (
            RiskFactor::SimilarContentPatterns,
            bh.content_similarity > SIMILAR_CONTENT,
        ),
        (RiskFactor::HighReciprocity, st.reciprocity > HIGH_RECIPROCITY),
        (
            RiskFactor::SimilarAccountAges,
            bh.age_dispersion.is_some_and(|a| a > SIMILAR_AGES),
        ),
        (RiskFactor::BurstActivityPattern, tp.burst_score > BURSTY),
        (RiskFactor::RegularActivityPattern, tp.regularity_score > REGULAR),
    ];

    checks
        .into_iter()
        .filter_map(|(factor, hit)| hit.then_some(factor))
        .collect()
}
