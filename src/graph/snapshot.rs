// Graph snapshot model: the immutable input to a detection run.
//
// A snapshot is a materialized copy of the account interaction graph: nodes
// are accounts, edges are directed, weighted, optionally timestamped
// interactions. The engine never mutates it. `GraphIndex` is the validated,
// lookup-friendly view that every analyzer works from.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Optional account attributes supplied by the ingesting collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    /// Amount staked by the account, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stake: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_payment_history: Option<bool>,
    /// Activity-recency value in milliseconds, used as an account-age proxy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_recency: Option<f64>,
    /// Anything else the ingesting side attached
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// An account in the interaction graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<NodeMetadata>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: NodeMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// The `activityRecency` metadata value, if present and finite.
    pub fn activity_recency(&self) -> Option<f64> {
        self.metadata
            .as_ref()
            .and_then(|m| m.activity_recency)
            .filter(|v| v.is_finite())
    }
}

fn default_weight() -> f64 {
    1.0
}

/// A directed interaction between two accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Event time in epoch milliseconds. `None` means the timing is unknown.
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<i64>,
}

impl GraphEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, weight: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight,
            timestamp: None,
        }
    }

    /// Attach an event time (epoch milliseconds).
    pub fn at(mut self, timestamp_ms: i64) -> Self {
        self.timestamp = Some(timestamp_ms);
        self
    }

    /// Event time with unknown timing treated as the epoch.
    pub fn time_ms(&self) -> i64 {
        self.timestamp.unwrap_or(0)
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Ordered nodes and edges handed to the engine by value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl GraphSnapshot {
    pub fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        Self { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Validated view of a snapshot with per-node edge lookups.
///
/// Building the index is where noisy input gets dropped: duplicate node ids
/// (first occurrence wins), edges that reference unknown accounts, and edges
/// with a non-finite weight. Each drop is logged and the run carries on.
#[derive(Debug, Clone, Default)]
pub struct GraphIndex {
    nodes: Vec<GraphNode>,
    positions: HashMap<String, usize>,
    edges: Vec<GraphEdge>,
    outgoing: HashMap<String, Vec<usize>>,
    incident: HashMap<String, Vec<usize>>,
}

impl GraphIndex {
    pub fn build(snapshot: &GraphSnapshot) -> Self {
        let mut index = Self::default();

        for node in &snapshot.nodes {
            if index.positions.contains_key(&node.id) {
                warn!(node = node.id, "Duplicate node id in snapshot, keeping first");
                continue;
            }
            index.positions.insert(node.id.clone(), index.nodes.len());
            index.nodes.push(node.clone());
        }

        for edge in &snapshot.edges {
            if !index.contains(&edge.source) || !index.contains(&edge.target) {
                warn!(
                    source = edge.source,
                    target = edge.target,
                    "Edge references an unknown node, skipping"
                );
                continue;
            }
            if !edge.weight.is_finite() {
                warn!(
                    source = edge.source,
                    target = edge.target,
                    "Edge has a non-finite weight, skipping"
                );
                continue;
            }

            let id = index.edges.len();
            index.edges.push(edge.clone());
            index
                .outgoing
                .entry(edge.source.clone())
                .or_default()
                .push(id);
            index
                .incident
                .entry(edge.source.clone())
                .or_default()
                .push(id);
            if !edge.is_self_loop() {
                index
                    .incident
                    .entry(edge.target.clone())
                    .or_default()
                    .push(id);
            }
        }

        index
    }

    /// Number of distinct accounts in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.positions.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    /// Every edge that survived validation, in snapshot order.
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Edges leaving `id`, in snapshot order.
    pub fn outgoing<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.outgoing_ids(id).iter().map(move |&i| &self.edges[i])
    }

    /// Positions (into `edges()`) of every edge touching `id`, either direction.
    pub fn incident_ids(&self, id: &str) -> &[usize] {
        self.incident.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn incident<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.incident_ids(id).iter().map(move |&i| &self.edges[i])
    }

    fn outgoing_ids(&self, id: &str) -> &[usize] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Edges with both endpoints in `set`, self-loops excluded.
    ///
    /// Ordered by member (in set order), then by snapshot order.
    pub fn induced_edges<'a>(&'a self, set: &NodeSet<'_>) -> Vec<&'a GraphEdge> {
        set.iter()
            .flat_map(|id| self.outgoing(id))
            .filter(|e| !e.is_self_loop() && set.contains(&e.target))
            .collect()
    }
}

/// An ordered, de-duplicated group of account ids.
#[derive(Debug, Clone, Default)]
pub struct NodeSet<'a> {
    order: Vec<&'a str>,
    members: HashSet<&'a str>,
}

impl<'a> NodeSet<'a> {
    pub fn new(ids: &'a [String]) -> Self {
        let mut set = Self::default();
        for id in ids {
            if set.members.insert(id.as_str()) {
                set.order.push(id.as_str());
            }
        }
        set
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.order.iter().copied()
    }
}

// Edge timestamps arrive either as epoch milliseconds or RFC 3339 strings,
// depending on which ingestion job produced the snapshot.
mod timestamp {
    use chrono::DateTime;
    use serde::{de, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(i64),
        Fractional(f64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Raw::Millis(ms)) => Ok(Some(ms)),
            Some(Raw::Fractional(ms)) => Ok(Some(ms as i64)),
            Some(Raw::Text(text)) => DateTime::parse_from_rfc3339(&text)
                .map(|dt| Some(dt.timestamp_millis()))
                .map_err(|e| de::Error::custom(format!("invalid timestamp {text:?}: {e}"))),
        }
    }
}
