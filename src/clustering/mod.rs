// Community discovery: trait-based abstraction for swappable clusterers.
//
// The Clusterer trait defines the interface. StaticClusterer replays
// precomputed groups; ComponentClusterer derives groups from the graph
// itself. The engine builds the account feature records it hands over.

pub mod components;
pub mod traits;

pub use components::ComponentClusterer;
pub use traits::{AccountFeatureRecord, CandidateCluster, Clusterer, Connection, StaticClusterer};

use crate::graph::snapshot::GraphIndex;
use crate::reputation::models::{score_of, ReputationScores};

/// One feature record per validated graph node, in snapshot order.
pub fn build_feature_records(index: &GraphIndex, scores: &ReputationScores) -> Vec<AccountFeatureRecord> {
    index
        .nodes()
        .iter()
        .map(|node| AccountFeatureRecord {
            id: node.id.clone(),
            reputation: score_of(scores, &node.id),
            connections: index
                .outgoing(&node.id)
                .map(|e| Connection {
                    target: e.target.clone(),
                    weight: e.weight,
                })
                .collect(),
            metadata: node.metadata.clone(),
        })
        .collect()
}
