// Error taxonomy for detection runs.
//
// Malformed input never shows up here: bad edges and duplicate nodes are
// logged and skipped while the graph is indexed. What remains are the
// failures a caller has to see (clusterer, config, cancellation) and the
// per-cluster failures the orchestrator logs and skips.

use thiserror::Error;

use crate::pipeline::detect::DetectionPhase;

/// A detection run could not produce a result.
#[derive(Debug, Error)]
pub enum DetectionError {
    /// The external clusterer failed. An empty result here would be
    /// indistinguishable from a clean graph, so the run is aborted.
    #[error("clusterer failed: {0}")]
    Clusterer(#[source] anyhow::Error),

    #[error("invalid detection config: {0}")]
    Config(#[from] ConfigError),

    #[error("detection run cancelled during {phase}")]
    Cancelled { phase: DetectionPhase },
}

/// Scoring a single cluster failed; the cluster is skipped.
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("cluster {cluster_id} has no members")]
    EmptyCluster { cluster_id: String },

    #[error("cluster {cluster_id} produced a non-finite suspicion score")]
    NonFinite { cluster_id: String },
}

/// A configuration value is out of range or could not be parsed.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("minClusterSize must be at least 1")]
    MinClusterSize,

    #[error("{name} must be within [0, 1], got {value}")]
    ThresholdOutOfRange { name: &'static str, value: f64 },

    #[error("confirmedThreshold ({confirmed}) must be >= suspicionThreshold ({suspicion})")]
    ThresholdOrder { suspicion: f64, confirmed: f64 },

    #[error("detection weight {name} must be finite and non-negative, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },

    #[error("{var} is not a valid value: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}
