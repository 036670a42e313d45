// Behavioral signals: how alike the members of a cluster act.
//
// Four independent measurements, each tolerant of missing data (they return
// 0.0, or None for the age signal, rather than failing):
// - Activity synchronization: do members interact within the same hour?
// - Content similarity: do their reputation breakdowns look the same?
// - Interaction reciprocity: do they endorse each other back?
// - Account-age dispersion: were they all "born" at the same time?

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::graph::snapshot::{GraphIndex, NodeSet};
use crate::graph::structure;
use crate::reputation::models::ReputationScores;
use crate::reputation::stats::population_variance;

/// Two events count as synchronized when they are at most this far apart.
pub const SYNC_WINDOW_MS: i64 = 60 * 60 * 1000;

/// One day in milliseconds; normalizes the age variance.
pub const DAY_MS: f64 = 86_400_000.0;

/// Behavioral signals for one cluster (all 0.0-1.0).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehavioralPatterns {
    pub activity_sync: f64,
    pub content_similarity: f64,
    pub interaction_reciprocity: f64,
    /// `None` when no member carries an `activityRecency` value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_dispersion: Option<f64>,
}

/// Compute every behavioral signal for `nodes`.
pub fn analyze(index: &GraphIndex, nodes: &[String], scores: &ReputationScores) -> BehavioralPatterns {
    let set = NodeSet::new(nodes);
    let induced = index.induced_edges(&set);

    BehavioralPatterns {
        activity_sync: activity_synchronization(index, &set),
        content_similarity: content_similarity(&set, scores),
        interaction_reciprocity: structure::reciprocity(&induced),
        age_dispersion: age_dispersion(index, &set),
    }
}

/// Mean pairwise time correlation across all unordered member pairs.
///
/// Needs at least two members; otherwise 0.0.
pub fn activity_synchronization(index: &GraphIndex, set: &NodeSet<'_>) -> f64 {
    if set.len() < 2 {
        return 0.0;
    }

    let series: Vec<Vec<i64>> = set.iter().map(|id| incident_timestamps(index, id)).collect();

    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 0..series.len() {
        for j in (i + 1)..series.len() {
            total += time_correlation(&series[i], &series[j]);
            pairs += 1;
        }
    }

    (total / pairs as f64).max(0.0)
}

/// Sorted timestamps of every edge touching `id`.
pub fn incident_timestamps(index: &GraphIndex, id: &str) -> Vec<i64> {
    let mut timestamps: Vec<i64> = index.incident(id).map(|e| e.time_ms()).collect();
    timestamps.sort_unstable();
    timestamps
}

/// Fraction of `a`'s events that have some event of `b` within
/// [`SYNC_WINDOW_MS`]. `b` must be sorted. Returns 0.0 if either is empty.
pub fn time_correlation(a: &[i64], b: &[i64]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let matches = a
        .iter()
        .filter(|&&t| has_event_within(b, t, SYNC_WINDOW_MS))
        .count();
    matches as f64 / a.len() as f64
}

fn has_event_within(sorted: &[i64], t: i64, window: i64) -> bool {
    let lower = t.saturating_sub(window);
    let first = sorted.partition_point(|&x| x < lower);
    sorted
        .get(first)
        .is_some_and(|&x| x <= t.saturating_add(window))
}

/// Mean pairwise similarity of members' reputation breakdowns.
///
/// Only pairs where both members have a breakdown are counted.
pub fn content_similarity(set: &NodeSet<'_>, scores: &ReputationScores) -> f64 {
    let vectors: Vec<&BTreeMap<String, f64>> = set
        .iter()
        .filter_map(|id| scores.get(id).and_then(|e| e.breakdown.as_ref()))
        .collect();

    if vectors.len() < 2 {
        return 0.0;
    }

    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 0..vectors.len() {
        for j in (i + 1)..vectors.len() {
            total += breakdown_similarity(vectors[i], vectors[j]);
            pairs += 1;
        }
    }
    total / pairs as f64
}

/// Similarity of two breakdown vectors, averaged over the union of keys.
///
/// Per key: `1 - |a - b| / max(|a|, |b|, 1)` when both sides have a finite
/// value, otherwise 0.0. The per-key value is deliberately floored at 0.0:
/// values of opposite sign would otherwise go negative and pull the
/// suspicion score outside [0, 1].
pub fn breakdown_similarity(a: &BTreeMap<String, f64>, b: &BTreeMap<String, f64>) -> f64 {
    let keys: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
    if keys.is_empty() {
        return 0.0;
    }

    let total: f64 = keys
        .iter()
        .map(|key| match (finite(a.get(*key)), finite(b.get(*key))) {
            (Some(x), Some(y)) => {
                let scale = x.abs().max(y.abs()).max(1.0);
                (1.0 - (x - y).abs() / scale).max(0.0)
            }
            _ => 0.0,
        })
        .sum();

    total / keys.len() as f64
}

fn finite(value: Option<&f64>) -> Option<f64> {
    value.copied().filter(|v| v.is_finite())
}

/// `1 / (1 + variance / one day)` over members' `activityRecency` values.
pub fn age_dispersion(index: &GraphIndex, set: &NodeSet<'_>) -> Option<f64> {
    let ages: Vec<f64> = set
        .iter()
        .filter_map(|id| index.node(id).and_then(|n| n.activity_recency()))
        .collect();

    if ages.is_empty() {
        return None;
    }
    Some(1.0 / (1.0 + population_variance(&ages) / DAY_MS))
}
