// Graph structure analysis for a candidate cluster.
//
// Coordinated account rings tend to look the same from the outside: dense
// inside, mostly mutual edges, few links out to the rest of the graph. This
// module measures exactly those four things for a node subset relative to
// the full graph. Every ratio has an explicit zero-guard, so results are
// always finite and within [0, 1].

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::snapshot::{GraphEdge, GraphIndex, NodeSet};

/// Structural metrics for one node subset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureMetrics {
    /// Directed density of the induced subgraph
    pub density: f64,
    /// Mean local clustering coefficient over the subset
    pub avg_clustering: f64,
    /// Outgoing edges leaving the subset, relative to all possible ones
    pub external_connectivity: f64,
    /// Fraction of induced edges that have a reverse edge
    pub reciprocity: f64,
}

/// Compute all structure metrics for `nodes` within the indexed graph.
pub fn analyze(index: &GraphIndex, nodes: &[String]) -> StructureMetrics {
    let set = NodeSet::new(nodes);
    let induced = index.induced_edges(&set);

    StructureMetrics {
        density: density(set.len(), &induced),
        avg_clustering: average_clustering(&set, &induced),
        external_connectivity: external_connectivity(index, &set),
        reciprocity: reciprocity(&induced),
    }
}

/// Directed density: distinct induced (source, target) pairs over `n(n-1)`.
///
/// Parallel edges between the same ordered pair count once, so the result
/// never exceeds 1.0. Returns 0.0 for one node or fewer.
pub fn density(node_count: usize, induced: &[&GraphEdge]) -> f64 {
    if node_count <= 1 {
        return 0.0;
    }
    let distinct: HashSet<(&str, &str)> = induced
        .iter()
        .map(|e| (e.source.as_str(), e.target.as_str()))
        .collect();
    let possible = (node_count * (node_count - 1)) as f64;
    (distinct.len() as f64 / possible).min(1.0)
}

/// Mean local clustering coefficient over every member of `set`.
///
/// Neighborhoods are undirected: a node's neighbors are the union of its in-
/// and out-neighbors inside the subset. Members with fewer than two
/// neighbors contribute 0.0.
pub fn average_clustering(set: &NodeSet<'_>, induced: &[&GraphEdge]) -> f64 {
    if set.is_empty() {
        return 0.0;
    }

    let mut neighbors: HashMap<&str, HashSet<&str>> = HashMap::new();
    for edge in induced {
        neighbors
            .entry(edge.source.as_str())
            .or_default()
            .insert(edge.target.as_str());
        neighbors
            .entry(edge.target.as_str())
            .or_default()
            .insert(edge.source.as_str());
    }

    let total: f64 = set
        .iter()
        .map(|id| local_clustering(id, &neighbors))
        .sum();
    total / set.len() as f64
}

fn local_clustering(id: &str, neighbors: &HashMap<&str, HashSet<&str>>) -> f64 {
    let Some(adjacent) = neighbors.get(id) else {
        return 0.0;
    };
    let peers: Vec<&str> = adjacent.iter().copied().collect();
    let k = peers.len();
    if k < 2 {
        return 0.0;
    }

    let mut triangles = 0usize;
    for i in 0..k {
        for j in (i + 1)..k {
            if neighbors
                .get(peers[i])
                .is_some_and(|n| n.contains(peers[j]))
            {
                triangles += 1;
            }
        }
    }

    triangles as f64 / (k * (k - 1) / 2) as f64
}

/// Outgoing edges whose target lies outside `set`, normalized by
/// `|S| * (total_nodes - |S|)`. Returns 0.0 when nothing lies outside.
pub fn external_connectivity(index: &GraphIndex, set: &NodeSet<'_>) -> f64 {
    let inside = set.len();
    let outside = index.node_count().saturating_sub(inside);
    let possible = inside * outside;
    if possible == 0 {
        return 0.0;
    }

    let external = set
        .iter()
        .flat_map(|id| index.outgoing(id))
        .filter(|e| !set.contains(&e.target))
        .count();

    (external as f64 / possible as f64).min(1.0)
}

/// Fraction of `edges` whose reverse edge is also in `edges`.
pub fn reciprocity(edges: &[&GraphEdge]) -> f64 {
    if edges.is_empty() {
        return 0.0;
    }
    let pairs: HashSet<(&str, &str)> = edges
        .iter()
        .map(|e| (e.source.as_str(), e.target.as_str()))
        .collect();
    let mutual = edges
        .iter()
        .filter(|e| pairs.contains(&(e.target.as_str(), e.source.as_str())))
        .count();
    mutual as f64 / edges.len() as f64
}
