// Temporal patterns: bursts and clockwork regularity.
//
// Scripted accounts either fire everything at once (a burst) or on a fixed
// cadence (regular intervals). Both show up in the timestamps of the edges
// touching a cluster.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::graph::snapshot::{GraphIndex, NodeSet};
use crate::reputation::stats::{mean, population_variance};

/// Width of the burst window.
pub const BURST_WINDOW_MS: i64 = 60 * 60 * 1000;

/// Timing signals for one cluster (scores 0.0-1.0).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalPatterns {
    pub burst_score: f64,
    pub regularity_score: f64,
    /// Mean of the burst and regularity scores
    pub time_clustering_score: f64,
    /// Number of edge events the scores were computed from
    pub event_count: usize,
}

/// Compute timing signals from every edge touching `nodes`.
pub fn analyze(index: &GraphIndex, nodes: &[String]) -> TemporalPatterns {
    let set = NodeSet::new(nodes);
    from_timestamps(cluster_timestamps(index, &set))
}

/// Timestamps of all edges with at least one endpoint in `set`, each edge
/// counted once.
pub fn cluster_timestamps(index: &GraphIndex, set: &NodeSet<'_>) -> Vec<i64> {
    let edge_ids: BTreeSet<usize> = set
        .iter()
        .flat_map(|id| index.incident_ids(id).iter().copied())
        .collect();
    edge_ids
        .into_iter()
        .map(|i| index.edges()[i].time_ms())
        .collect()
}

/// Compute timing signals from raw timestamps. Fewer than two events yields
/// all-zero scores.
pub fn from_timestamps(mut timestamps: Vec<i64>) -> TemporalPatterns {
    let event_count = timestamps.len();
    if event_count < 2 {
        return TemporalPatterns {
            event_count,
            ..TemporalPatterns::default()
        };
    }

    timestamps.sort_unstable();
    let burst_score = burst_score(&timestamps);
    let regularity_score = regularity_score(&timestamps);

    TemporalPatterns {
        burst_score,
        regularity_score,
        time_clustering_score: (burst_score + regularity_score) / 2.0,
        event_count,
    }
}

/// Largest run of events less than an hour after the run's first event,
/// divided by the total event count. `sorted` must be ascending.
///
/// A run restarts at the first event that falls outside the current window.
pub fn burst_score(sorted: &[i64]) -> f64 {
    let Some(&first) = sorted.first() else {
        return 0.0;
    };

    let mut window_start = first;
    let mut count = 0usize;
    let mut max_count = 0usize;
    for &t in sorted {
        if t.saturating_sub(window_start) < BURST_WINDOW_MS {
            count += 1;
        } else {
            window_start = t;
            count = 1;
        }
        max_count = max_count.max(count);
    }

    (max_count as f64 / sorted.len() as f64).min(1.0)
}

/// `1 / (1 + variance / mean)` over consecutive inter-event intervals.
///
/// The normalized variance is 0.0 when the mean interval is 0, so a set of
/// simultaneous events scores 1.0.
pub fn regularity_score(sorted: &[i64]) -> f64 {
    if sorted.len() < 2 {
        return 0.0;
    }
    let intervals: Vec<f64> = sorted
        .windows(2)
        .map(|w| w[1].saturating_sub(w[0]) as f64)
        .collect();

    let mean_interval = mean(&intervals);
    let normalized = if mean_interval > 0.0 {
        population_variance(&intervals) / mean_interval
    } else {
        0.0
    };
    1.0 / (1.0 + normalized)
}
