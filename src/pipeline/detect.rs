// Detection pipeline: snapshot -> clusters -> scored buckets -> report.
//
// This is the engine's single entry point. For one snapshot and reputation
// map it:
// 1. Indexes the graph, dropping malformed input
// 2. Asks the injected clusterer for candidate groups
// 3. Scores every group at or above the size floor on a bounded worker pool
// 4. Buckets scores into confirmed / suspicious / discarded
// 5. Scans accounts outside every reported cluster for individual bots
// 6. Summarizes everything flagged into run-wide risk metrics
//
// A clusterer failure aborts the run. A failure scoring one cluster only
// drops that cluster.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::clustering::{build_feature_records, CandidateCluster, Clusterer};
use crate::config::DetectionConfig;
use crate::error::DetectionError;
use crate::graph::snapshot::{GraphIndex, GraphSnapshot};
use crate::models::{BotDetectionResult, ClusterAnalysis, ClusterVerdict, RiskMetrics};
use crate::pipeline::aggregate;
use crate::reputation::models::ReputationScores;
use crate::scoring::cluster::analyze_cluster;

/// Default number of clusters scored in parallel.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Where a detection run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionPhase {
    Idle,
    ClusteringInProgress,
    AnalyzingClusters,
    ScanningIndividuals,
    Aggregating,
    Done,
}

impl DetectionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionPhase::Idle => "idle",
            DetectionPhase::ClusteringInProgress => "clustering",
            DetectionPhase::AnalyzingClusters => "analyzing clusters",
            DetectionPhase::ScanningIndividuals => "scanning individuals",
            DetectionPhase::Aggregating => "aggregating",
            DetectionPhase::Done => "done",
        }
    }

    fn advance(&mut self, next: DetectionPhase) {
        debug!(from = self.as_str(), to = next.as_str(), "Detection phase");
        *self = next;
    }
}

impl fmt::Display for DetectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cluster that met the size floor, with its run-unique id assigned.
#[derive(Debug, Clone)]
struct ClusterJob {
    cluster_id: String,
    nodes: Vec<String>,
}

/// The bot detection engine. Holds only immutable configuration and the
/// injected clusterer, so one instance can serve any number of runs.
pub struct BotDetector {
    config: Arc<DetectionConfig>,
    clusterer: Arc<dyn Clusterer>,
    concurrency: usize,
}

impl BotDetector {
    /// Create an engine. The config is validated up front.
    pub fn new(config: DetectionConfig, clusterer: Arc<dyn Clusterer>) -> Result<Self, DetectionError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            clusterer,
            concurrency: DEFAULT_CONCURRENCY,
        })
    }

    /// Set how many clusters are scored in parallel (at least 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run detection to completion.
    pub async fn detect(
        &self,
        snapshot: GraphSnapshot,
        reputation: ReputationScores,
    ) -> Result<BotDetectionResult, DetectionError> {
        self.detect_until(snapshot, reputation, std::future::pending()).await
    }

    /// Run detection until `cancel` resolves.
    ///
    /// Cancellation is honored while waiting on the clusterer and while
    /// clusters are being scored: no new cluster work starts, results of
    /// in-flight work are discarded, and `DetectionError::Cancelled` is
    /// returned.
    pub async fn detect_until<F>(
        &self,
        snapshot: GraphSnapshot,
        reputation: ReputationScores,
        cancel: F,
    ) -> Result<BotDetectionResult, DetectionError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(cancel);
        let mut phase = DetectionPhase::Idle;

        let index = Arc::new(GraphIndex::build(&snapshot));
        drop(snapshot);
        let reputation = Arc::new(reputation);

        info!(
            accounts = index.node_count(),
            edges = index.edges().len(),
            scored_accounts = reputation.len(),
            "Starting bot detection run"
        );

        // Step 1: Candidate groups from the clusterer
        phase.advance(DetectionPhase::ClusteringInProgress);
        let records = build_feature_records(&index, &reputation);
        let candidates = tokio::select! {
            biased;
            _ = &mut cancel => return Err(DetectionError::Cancelled { phase }),
            found = self.clusterer.find_clusters(&records) => found.map_err(DetectionError::Clusterer)?,
        };
        drop(records);
        info!(candidates = candidates.len(), "Clusterer returned candidate groups");

        // Step 2: Score eligible clusters in parallel
        phase.advance(DetectionPhase::AnalyzingClusters);
        let jobs = self.eligible_jobs(candidates);
        let job_count = jobs.len();
        let analyses = tokio::select! {
            biased;
            _ = &mut cancel => return Err(DetectionError::Cancelled { phase }),
            done = self.analyze_all(jobs, &index, &reputation) => done,
        };

        // Step 3: Bucket in clusterer order
        let mut confirmed: Vec<ClusterAnalysis> = Vec::new();
        let mut suspicious: Vec<ClusterAnalysis> = Vec::new();
        let mut evaluated = 0usize;
        for analysis in analyses.into_iter().flatten() {
            evaluated += 1;
            match self.config.classify(analysis.suspicion_score) {
                ClusterVerdict::Confirmed => confirmed.push(analysis),
                ClusterVerdict::Suspicious => suspicious.push(analysis),
                ClusterVerdict::Legitimate => {
                    debug!(
                        cluster_id = %analysis.cluster_id,
                        score = format!("{:.3}", analysis.suspicion_score),
                        "Cluster looks legitimate, not reported"
                    );
                }
            }
        }

        // Step 4: Accounts outside every reported cluster
        phase.advance(DetectionPhase::ScanningIndividuals);
        let clustered: HashSet<&str> = confirmed
            .iter()
            .chain(&suspicious)
            .flat_map(|c| c.nodes.iter().map(String::as_str))
            .collect();
        let individual_bots = aggregate::scan_individuals(&reputation, &clustered, &self.config);

        // Step 5: Run-wide metrics
        phase.advance(DetectionPhase::Aggregating);
        let risk_metrics = RiskMetrics {
            clusters_evaluated: evaluated,
            clusters_skipped: job_count - evaluated,
            total_accounts: index.node_count(),
            ..aggregate::risk_metrics(&confirmed, &suspicious, &individual_bots, &reputation)
        };

        phase.advance(DetectionPhase::Done);
        info!(
            confirmed = confirmed.len(),
            suspicious = suspicious.len(),
            individual_bots = individual_bots.len(),
            skipped = risk_metrics.clusters_skipped,
            avg_score = format!("{:.3}", risk_metrics.avg_suspicion_score),
            "Bot detection run complete"
        );

        Ok(BotDetectionResult {
            suspicious_clusters: suspicious,
            confirmed_bot_clusters: confirmed,
            individual_bots,
            risk_metrics,
        })
    }

    /// De-duplicate members, apply the size floor, and assign run-unique ids
    /// (`cluster_<size>_<sequence>`) before any work fans out.
    fn eligible_jobs(&self, candidates: Vec<CandidateCluster>) -> Vec<ClusterJob> {
        let mut jobs = Vec::new();
        for candidate in candidates {
            let mut seen: HashSet<String> = HashSet::new();
            let raw_len = candidate.accounts.len();
            let nodes: Vec<String> = candidate
                .accounts
                .into_iter()
                .filter(|id| seen.insert(id.clone()))
                .collect();
            if nodes.len() != raw_len {
                warn!(
                    candidate = %candidate.cluster_id,
                    dropped = raw_len - nodes.len(),
                    "Candidate cluster listed accounts more than once"
                );
            }

            if nodes.len() < self.config.min_cluster_size {
                debug!(
                    candidate = %candidate.cluster_id,
                    size = nodes.len(),
                    "Candidate below minimum cluster size, skipping"
                );
                continue;
            }

            let cluster_id = format!("cluster_{}_{}", nodes.len(), jobs.len());
            jobs.push(ClusterJob { cluster_id, nodes });
        }
        jobs
    }

    /// Score every job on the blocking pool, at most `concurrency` at a
    /// time. Results come back in job order; failed jobs are `None`.
    async fn analyze_all(
        &self,
        jobs: Vec<ClusterJob>,
        index: &Arc<GraphIndex>,
        reputation: &Arc<ReputationScores>,
    ) -> Vec<Option<ClusterAnalysis>> {
        stream::iter(jobs.into_iter().map(|job| {
            let index = Arc::clone(index);
            let reputation = Arc::clone(reputation);
            let config = Arc::clone(&self.config);
            async move {
                let cluster_id = job.cluster_id.clone();
                let nodes = job.nodes.clone();
                let outcome = tokio::task::spawn_blocking(move || {
                    analyze_cluster(&index, &reputation, &config, job.cluster_id, job.nodes)
                })
                .await;

                match outcome {
                    Ok(Ok(analysis)) => Some(analysis),
                    Ok(Err(e)) => {
                        warn!(cluster_id, nodes = ?nodes, error = %e, "Cluster analysis failed, skipping");
                        None
                    }
                    Err(e) => {
                        warn!(cluster_id, nodes = ?nodes, error = %e, "Cluster analysis worker died, skipping");
                        None
                    }
                }
            }
        }))
        .buffered(self.concurrency)
        .collect()
        .await
    }
}
