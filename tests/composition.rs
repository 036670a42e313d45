// Composition tests: full detection runs through BotDetector.
//
// These tests exercise the whole pipeline:
//   GraphSnapshot -> Clusterer -> per-cluster analysis -> buckets -> report
// with in-memory clusterers only (no files, no network).

use std::sync::Arc;

use anyhow::bail;
use async_trait::async_trait;
use tokio::sync::Notify;

use botwatch::clustering::{
    AccountFeatureRecord, CandidateCluster, Clusterer, ComponentClusterer, StaticClusterer,
};
use botwatch::config::DetectionConfig;
use botwatch::error::DetectionError;
use botwatch::graph::snapshot::{GraphEdge, GraphNode, GraphSnapshot, NodeMetadata};
use botwatch::models::BotReason;
use botwatch::pipeline::{BotDetector, DetectionPhase};
use botwatch::reputation::models::{ReputationEntry, ReputationScores};
use botwatch::scoring::suspicion::RiskFactor;

const RING: [&str; 5] = ["r1", "r2", "r3", "r4", "r5"];

/// Five accounts that all endorse each other within one minute, with equal
/// age metadata and reputation 50.
fn bot_ring() -> (GraphSnapshot, ReputationScores) {
    let nodes = RING
        .iter()
        .map(|id| {
            GraphNode::new(*id).with_metadata(NodeMetadata {
                activity_recency: Some(3_600_000.0),
                ..NodeMetadata::default()
            })
        })
        .collect();

    let mut edges = Vec::new();
    for a in RING {
        for b in RING {
            if a != b {
                let t = 1_700_000_000_000 + edges.len() as i64 * 3_000;
                edges.push(GraphEdge::new(a, b, 1.0).at(t));
            }
        }
    }

    let scores = RING
        .iter()
        .map(|id| (id.to_string(), ReputationEntry::new(50.0)))
        .collect();

    (GraphSnapshot::new(nodes, edges), scores)
}

fn detector(clusterer: impl Clusterer + 'static) -> BotDetector {
    BotDetector::new(DetectionConfig::default(), Arc::new(clusterer)).unwrap()
}

struct FailingClusterer;

#[async_trait]
impl Clusterer for FailingClusterer {
    async fn find_clusters(&self, _accounts: &[AccountFeatureRecord]) -> anyhow::Result<Vec<CandidateCluster>> {
        bail!("graph service unavailable")
    }
}

struct HangingClusterer;

#[async_trait]
impl Clusterer for HangingClusterer {
    async fn find_clusters(&self, _accounts: &[AccountFeatureRecord]) -> anyhow::Result<Vec<CandidateCluster>> {
        std::future::pending::<()>().await;
        Ok(Vec::new())
    }
}

/// Returns the whole ring, signalling `done` just before it does.
struct SignallingClusterer {
    done: Arc<Notify>,
}

#[async_trait]
impl Clusterer for SignallingClusterer {
    async fn find_clusters(&self, _accounts: &[AccountFeatureRecord]) -> anyhow::Result<Vec<CandidateCluster>> {
        self.done.notify_one();
        Ok(vec![CandidateCluster {
            cluster_id: "ring".into(),
            accounts: RING.iter().map(|id| id.to_string()).collect(),
        }])
    }
}

// ============================================================
// Reference scenarios
// ============================================================

#[tokio::test]
async fn tight_low_reputation_ring_is_confirmed() {
    let (snapshot, scores) = bot_ring();
    let result = detector(ComponentClusterer::new())
        .detect(snapshot, scores)
        .await
        .unwrap();

    assert_eq!(result.confirmed_bot_clusters.len(), 1);
    assert!(result.suspicious_clusters.is_empty());

    let cluster = &result.confirmed_bot_clusters[0];
    assert_eq!(cluster.cluster_id, "cluster_5_0");
    assert_eq!(cluster.node_count, 5);
    // 0.25 * 0.97 + 0.35 * 1.0 + 0.30 * 0.6 + 0.10 * 1.0
    assert!((cluster.suspicion_score - 0.8725).abs() < 1e-9, "got {}", cluster.suspicion_score);

    for factor in [
        RiskFactor::LowReputationCluster,
        RiskFactor::HighInternalDensity,
        RiskFactor::LowExternalConnectivity,
        RiskFactor::SynchronizedActivity,
        RiskFactor::HighReciprocity,
        RiskFactor::SimilarAccountAges,
        RiskFactor::BurstActivityPattern,
        RiskFactor::RegularActivityPattern,
    ] {
        assert!(cluster.risk_factors.contains(&factor), "missing {factor}");
    }
    assert!(!cluster.risk_factors.contains(&RiskFactor::SimilarContentPatterns));

    let metrics = &result.risk_metrics;
    assert_eq!(metrics.high_risk_nodes, 5);
    assert_eq!(metrics.clusters_evaluated, 1);
    assert_eq!(metrics.total_accounts, 5);
    assert!((metrics.avg_suspicion_score - cluster.suspicion_score).abs() < 1e-12);
    assert_eq!(metrics.affected_reputation_range.min, 50.0);
    assert_eq!(metrics.affected_reputation_range.max, 50.0);
}

#[tokio::test]
async fn isolated_mixed_reputation_group_is_not_reported() {
    let snapshot = GraphSnapshot::new(
        vec![GraphNode::new("a"), GraphNode::new("b"), GraphNode::new("c")],
        vec![],
    );
    let scores: ReputationScores = [("a", 900.0), ("b", 50.0), ("c", 500.0)]
        .into_iter()
        .map(|(id, s)| (id.to_string(), ReputationEntry::new(s)))
        .collect();

    let result = detector(StaticClusterer::from_groups([vec!["a", "b", "c"]]))
        .detect(snapshot, scores)
        .await
        .unwrap();

    assert!(result.is_clean());
    assert_eq!(result.risk_metrics.clusters_evaluated, 1);
    assert_eq!(result.risk_metrics.avg_suspicion_score, 0.0);
}

#[tokio::test]
async fn lone_high_sybil_account_is_an_individual_bot() {
    let snapshot = GraphSnapshot::new(vec![GraphNode::new("solo")], vec![]);
    let mut scores = ReputationScores::new();
    scores.insert("solo".into(), ReputationEntry::new(100.0).with_sybil_risk(0.95));

    let result = detector(ComponentClusterer::new())
        .detect(snapshot, scores)
        .await
        .unwrap();

    assert_eq!(result.individual_bots.len(), 1);
    let bot = &result.individual_bots[0];
    assert_eq!(bot.node, "solo");
    assert_eq!(bot.reason, BotReason::HighSybilRisk);
    assert_eq!(bot.reputation_score, 100.0);
    assert_eq!(result.risk_metrics.high_risk_nodes, 1);
    assert_eq!(result.risk_metrics.affected_reputation_range.avg, 100.0);
}

#[tokio::test]
async fn empty_graph_gives_empty_result() {
    let result = detector(ComponentClusterer::new())
        .detect(GraphSnapshot::default(), ReputationScores::new())
        .await
        .unwrap();

    assert!(result.is_clean());
    assert_eq!(result.risk_metrics.avg_suspicion_score, 0.0);
    assert_eq!(result.risk_metrics.high_risk_nodes, 0);
    assert_eq!(result.risk_metrics.total_accounts, 0);
}

// ============================================================
// Run-level properties
// ============================================================

#[tokio::test]
async fn repeated_runs_are_identical() {
    let engine = detector(ComponentClusterer::new());
    let (snapshot, mut scores) = bot_ring();
    scores.insert("r1".into(), ReputationEntry::new(50.0).with_sybil_risk(0.99));

    let first = engine.detect(snapshot.clone(), scores.clone()).await.unwrap();
    let second = engine.detect(snapshot, scores).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn cluster_one_below_minimum_size_is_never_scored() {
    let (snapshot, scores) = bot_ring();
    let groups = StaticClusterer::from_groups([vec!["r1", "r2"], vec!["r3", "r4", "r5"]]);

    let result = detector(groups).detect(snapshot, scores).await.unwrap();
    assert_eq!(result.risk_metrics.clusters_evaluated, 1);
    let reported: Vec<&str> = result.reported_clusters().map(|c| c.cluster_id.as_str()).collect();
    // Ids count only eligible clusters
    assert_eq!(reported, vec!["cluster_3_0"]);
}

#[tokio::test]
async fn duplicate_members_are_counted_once() {
    let (snapshot, scores) = bot_ring();
    let groups = StaticClusterer::from_groups([vec!["r1", "r2", "r1", "r2"]]);
    let result = detector(groups).detect(snapshot, scores).await.unwrap();
    // Two distinct members is below the default minimum of 3
    assert_eq!(result.risk_metrics.clusters_evaluated, 0);
}

#[tokio::test]
async fn clustered_accounts_are_not_individual_bots() {
    let (mut snapshot, mut scores) = bot_ring();
    for id in RING {
        scores.insert(id.into(), ReputationEntry::new(50.0).with_sybil_risk(0.95));
    }
    snapshot.nodes.push(GraphNode::new("outsider"));
    scores.insert("outsider".into(), ReputationEntry::new(20.0).with_sybil_risk(0.97));

    let result = detector(ComponentClusterer::new())
        .detect(snapshot, scores)
        .await
        .unwrap();

    let individuals: Vec<&str> = result.individual_bots.iter().map(|b| b.node.as_str()).collect();
    assert_eq!(individuals, vec!["outsider"]);
    // 5 confirmed members plus the outsider
    assert_eq!(result.risk_metrics.high_risk_nodes, 6);
}

#[tokio::test]
async fn members_of_undersized_groups_are_still_scanned() {
    let snapshot = GraphSnapshot::new(vec![GraphNode::new("p"), GraphNode::new("q")], vec![]);
    let mut scores = ReputationScores::new();
    scores.insert("p".into(), ReputationEntry::new(10.0).with_sybil_risk(0.99));
    scores.insert("q".into(), ReputationEntry::new(10.0).with_sybil_risk(0.99));

    let result = detector(StaticClusterer::from_groups([vec!["p"]]))
        .detect(snapshot, scores)
        .await
        .unwrap();

    assert_eq!(result.risk_metrics.clusters_evaluated, 0);
    let individuals: Vec<&str> = result.individual_bots.iter().map(|b| b.node.as_str()).collect();
    assert_eq!(individuals, vec!["p", "q"]);
}

#[tokio::test]
async fn linked_pair_below_minimum_size_is_still_scanned() {
    let snapshot = GraphSnapshot::new(
        vec![GraphNode::new("x"), GraphNode::new("y")],
        vec![GraphEdge::new("x", "y", 1.0)],
    );
    let mut scores = ReputationScores::new();
    scores.insert("x".into(), ReputationEntry::new(10.0).with_sybil_risk(0.99));

    let result = detector(ComponentClusterer::new())
        .detect(snapshot, scores)
        .await
        .unwrap();

    assert_eq!(result.reported_clusters().count(), 0);
    assert_eq!(result.individual_bots.len(), 1);
    assert_eq!(result.individual_bots[0].node, "x");
    assert_eq!(result.individual_bots[0].reason, BotReason::HighSybilRisk);
}

#[tokio::test]
async fn members_of_legitimate_clusters_are_still_scanned() {
    let snapshot = GraphSnapshot::new(
        vec![GraphNode::new("a"), GraphNode::new("b"), GraphNode::new("c")],
        vec![],
    );
    let mut scores = ReputationScores::new();
    scores.insert("a".into(), ReputationEntry::new(900.0).with_sybil_risk(0.95));
    scores.insert("b".into(), ReputationEntry::new(50.0));
    scores.insert("c".into(), ReputationEntry::new(500.0));

    let result = detector(StaticClusterer::from_groups([vec!["a", "b", "c"]]))
        .detect(snapshot, scores)
        .await
        .unwrap();

    assert_eq!(result.risk_metrics.clusters_evaluated, 1);
    assert_eq!(result.reported_clusters().count(), 0);
    let individuals: Vec<&str> = result.individual_bots.iter().map(|b| b.node.as_str()).collect();
    assert_eq!(individuals, vec!["a"]);
}

#[tokio::test]
async fn concurrency_does_not_change_the_result() {
    let (snapshot, scores) = bot_ring();
    let groups = vec![
        vec!["r1", "r2", "r3"],
        vec!["r2", "r3", "r4"],
        vec!["r3", "r4", "r5"],
        vec!["r1", "r3", "r5"],
    ];

    let serial = detector(StaticClusterer::from_groups(groups.clone()))
        .with_concurrency(1)
        .detect(snapshot.clone(), scores.clone())
        .await
        .unwrap();
    let parallel = detector(StaticClusterer::from_groups(groups))
        .with_concurrency(4)
        .detect(snapshot, scores)
        .await
        .unwrap();

    assert_eq!(serial, parallel);
    let ids: Vec<&str> = serial.reported_clusters().map(|c| c.cluster_id.as_str()).collect();
    assert_eq!(ids.len(), 4);
}

// ============================================================
// Failure handling
// ============================================================

#[tokio::test]
async fn clusterer_failure_aborts_the_run() {
    let (snapshot, scores) = bot_ring();
    let err = detector(FailingClusterer)
        .detect(snapshot, scores)
        .await
        .unwrap_err();
    assert!(matches!(err, DetectionError::Clusterer(_)));
    assert!(err.to_string().contains("graph service unavailable"));
}

#[tokio::test]
async fn failing_cluster_is_skipped_and_the_run_continues() {
    let (mut snapshot, mut scores) = bot_ring();
    snapshot.nodes.push(GraphNode::new("broken"));
    scores.insert("broken".into(), ReputationEntry::new(f64::NAN));

    let groups = StaticClusterer::from_groups([
        RING.to_vec(),
        vec!["r1", "r2", "broken"],
    ]);
    let result = detector(groups).detect(snapshot, scores).await.unwrap();

    assert_eq!(result.risk_metrics.clusters_evaluated, 1);
    assert_eq!(result.risk_metrics.clusters_skipped, 1);
    assert_eq!(result.confirmed_bot_clusters.len(), 1);
    assert_eq!(result.confirmed_bot_clusters[0].cluster_id, "cluster_5_0");
    assert!(result.suspicious_clusters.is_empty());
}

#[tokio::test]
async fn cancellation_while_clustering_returns_cancelled() {
    let (snapshot, scores) = bot_ring();
    let err = detector(HangingClusterer)
        .detect_until(snapshot, scores, std::future::ready(()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DetectionError::Cancelled {
            phase: DetectionPhase::ClusteringInProgress
        }
    ));
}

#[tokio::test]
async fn cancellation_after_clustering_stops_the_analysis() {
    let (snapshot, scores) = bot_ring();
    let clustered = Arc::new(Notify::new());
    let clusterer = SignallingClusterer {
        done: Arc::clone(&clustered),
    };
    let cancel = async move { clustered.notified().await };

    let err = detector(clusterer)
        .detect_until(snapshot, scores, cancel)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DetectionError::Cancelled {
            phase: DetectionPhase::AnalyzingClusters
        }
    ));
}

#[tokio::test]
async fn timeout_cancels_a_hanging_clusterer() {
    let (snapshot, scores) = bot_ring();
    let deadline = tokio::time::sleep(std::time::Duration::from_millis(20));
    let err = detector(HangingClusterer)
        .detect_until(snapshot, scores, deadline)
        .await
        .unwrap_err();
    assert!(matches!(err, DetectionError::Cancelled { .. }));
}

#[test]
fn invalid_config_is_refused_at_construction() {
    let config = DetectionConfig {
        suspicion_threshold: 0.9,
        confirmed_threshold: 0.1,
        ..DetectionConfig::default()
    };
    let result = BotDetector::new(config, Arc::new(ComponentClusterer::new()));
    assert!(matches!(result, Err(DetectionError::Config(_))));
}
