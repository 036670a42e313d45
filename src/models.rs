// Detection result models: the structured objects a run hands back.
//
// Consumers (report rendering, publishing, API serialization) only ever see
// these. They serialize as camelCase JSON.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::structure::StructureMetrics;
use crate::reputation::stats::ReputationStats;
use crate::scoring::behavioral::BehavioralPatterns;
use crate::scoring::suspicion::RiskFactor;
use crate::scoring::temporal::TemporalPatterns;

/// The four analyzer outputs for one cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMetrics {
    pub reputation: ReputationStats,
    pub structure: StructureMetrics,
    pub behavior: BehavioralPatterns,
    pub temporal: TemporalPatterns,
}

/// A scored candidate cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterAnalysis {
    /// `cluster_<size>_<sequence>`, unique within a run
    pub cluster_id: String,
    pub node_count: usize,
    /// Member ids in the order the clusterer returned them
    pub nodes: Vec<String>,
    pub metrics: ClusterMetrics,
    /// Fused suspicion score (0.0-1.0)
    pub suspicion_score: f64,
    /// Tags in detection order
    pub risk_factors: Vec<RiskFactor>,
}

/// Which output bucket a score lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClusterVerdict {
    Confirmed,
    Suspicious,
    /// Not reported at all
    Legitimate,
}

impl ClusterVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterVerdict::Confirmed => "confirmed",
            ClusterVerdict::Suspicious => "suspicious",
            ClusterVerdict::Legitimate => "legitimate",
        }
    }
}

impl fmt::Display for ClusterVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an unclustered account was flagged on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BotReason {
    HighSybilRisk,
    VeryLowReputation,
}

impl BotReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BotReason::HighSybilRisk => "high-sybil-risk",
            BotReason::VeryLowReputation => "very-low-reputation",
        }
    }
}

impl fmt::Display for BotReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An account flagged outside of any reported cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualBot {
    pub node: String,
    pub reputation_score: f64,
    pub sybil_risk: f64,
    pub reason: BotReason,
}

/// Reputation spread across every flagged account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationRange {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

/// Run-wide summary over everything that was flagged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetrics {
    /// Mean suspicion score over confirmed and suspicious clusters
    pub avg_suspicion_score: f64,
    /// Members of confirmed clusters plus individual bots with sybil risk > 0.8
    pub high_risk_nodes: usize,
    pub affected_reputation_range: ReputationRange,
    /// Clusters that met the size floor and were scored
    pub clusters_evaluated: usize,
    /// Clusters whose analysis failed and were left out
    pub clusters_skipped: usize,
    /// Accounts in the validated graph
    pub total_accounts: usize,
}

/// Everything a detection run produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotDetectionResult {
    pub suspicious_clusters: Vec<ClusterAnalysis>,
    pub confirmed_bot_clusters: Vec<ClusterAnalysis>,
    pub individual_bots: Vec<IndividualBot>,
    pub risk_metrics: RiskMetrics,
}

impl BotDetectionResult {
    /// True when nothing at all was flagged.
    pub fn is_clean(&self) -> bool {
        self.suspicious_clusters.is_empty()
            && self.confirmed_bot_clusters.is_empty()
            && self.individual_bots.is_empty()
    }

    /// Confirmed clusters first, then suspicious ones.
    pub fn reported_clusters(&self) -> impl Iterator<Item = &ClusterAnalysis> {
        self.confirmed_bot_clusters
            .iter()
            .chain(self.suspicious_clusters.iter())
    }
}
