// Clusterer trait: the swap-ready community discovery abstraction.
//
// Partitioning accounts into candidate groups is somebody else's job: a
// Louvain run in the graph service, a precomputed batch export, or the
// built-in component clusterer. The engine only needs this interface and is
// handed an implementation at construction time.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::graph::snapshot::NodeMetadata;

/// An outgoing interaction from an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub target: String,
    pub weight: f64,
}

/// Everything a clusterer is told about one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountFeatureRecord {
    pub id: String,
    /// Current reputation score (0.0 when unknown)
    pub reputation: f64,
    pub connections: Vec<Connection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<NodeMetadata>,
}

/// One group of accounts proposed by a clusterer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateCluster {
    pub cluster_id: String,
    pub accounts: Vec<String>,
}

/// Trait for discovering candidate account groups. Async because most
/// implementations call out to another service.
#[async_trait]
pub trait Clusterer: Send + Sync {
    /// Partition `accounts` into candidate groups. An error aborts the
    /// detection run.
    async fn find_clusters(&self, accounts: &[AccountFeatureRecord]) -> Result<Vec<CandidateCluster>>;
}

/// Clusterer that returns a fixed set of groups, e.g. the output of an
/// upstream community-detection job.
#[derive(Debug, Clone, Default)]
pub struct StaticClusterer {
    clusters: Vec<CandidateCluster>,
}

impl StaticClusterer {
    pub fn new(clusters: Vec<CandidateCluster>) -> Self {
        Self { clusters }
    }

    /// Build from bare member lists, naming them `static_<n>`.
    pub fn from_groups<I, G, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let clusters = groups
            .into_iter()
            .enumerate()
            .map(|(i, group)| CandidateCluster {
                cluster_id: format!("static_{i}"),
                accounts: group.into_iter().map(Into::into).collect(),
            })
            .collect();
        Self { clusters }
    }
}

#[async_trait]
impl Clusterer for StaticClusterer {
    async fn find_clusters(&self, _accounts: &[AccountFeatureRecord]) -> Result<Vec<CandidateCluster>> {
        Ok(self.clusters.clone())
    }
}
