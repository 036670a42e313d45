// Cluster analysis: runs every analyzer for one candidate cluster.
//
// Given a cluster's members, this module:
// 1. Computes reputation statistics
// 2. Measures graph structure on the induced subgraph
// 3. Measures behavioral similarity
// 4. Measures temporal patterns
// 5. Fuses them into a suspicion score and risk-factor tags
//
// Pure and synchronous; the orchestrator runs it on a blocking worker.

use tracing::debug;

use crate::config::DetectionConfig;
use crate::error::AnalysisError;
use crate::graph::snapshot::GraphIndex;
use crate::graph::structure;
use crate::models::{ClusterAnalysis, ClusterMetrics};
use crate::reputation::models::ReputationScores;
use crate::reputation::stats;
use crate::scoring::{behavioral, suspicion, temporal};

/// Score a single cluster. `nodes` should already be de-duplicated; their
/// order is kept as-is in the returned analysis.
pub fn analyze_cluster(
    index: &GraphIndex,
    scores: &ReputationScores,
    config: &DetectionConfig,
    cluster_id: String,
    nodes: Vec<String>,
) -> Result<ClusterAnalysis, AnalysisError> {
    if nodes.is_empty() {
        return Err(AnalysisError::EmptyCluster { cluster_id });
    }

    let metrics = ClusterMetrics {
        reputation: stats::analyze(&nodes, scores),
        structure: structure::analyze(index, &nodes),
        behavior: behavioral::analyze(index, &nodes, scores),
        temporal: temporal::analyze(index, &nodes),
    };

    let composites = suspicion::composite_scores(&metrics);
    let suspicion_score = suspicion::suspicion_score(&composites, &config.detection_weights);
    if !suspicion_score.is_finite() {
        return Err(AnalysisError::NonFinite { cluster_id });
    }

    let risk_factors = suspicion::risk_factors(&metrics, config);

    debug!(
        cluster_id = %cluster_id,
        size = nodes.len(),
        score = format!("{:.3}", suspicion_score),
        reputation = format!("{:.2}", composites.reputation),
        structure = format!("{:.2}", composites.structure),
        behavioral = format!("{:.2}", composites.behavioral),
        temporal = format!("{:.2}", composites.temporal),
        factors = risk_factors.len(),
        "Scored cluster"
    );

    Ok(ClusterAnalysis {
        cluster_id,
        node_count: nodes.len(),
        nodes,
        metrics,
        suspicion_score,
        risk_factors,
    })
}
