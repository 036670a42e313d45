// Botwatch: bot cluster and sybil detection over reputation-scored graphs
//
// This is the library root. Each module corresponds to a major subsystem
// of the detection pipeline.

pub mod clustering;
pub mod config;
pub mod error;
pub mod graph;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod reputation;
pub mod scoring;

pub use clustering::{Clusterer, ComponentClusterer, StaticClusterer};
pub use config::{DetectionConfig, DetectionWeights};
pub use error::{AnalysisError, ConfigError, DetectionError};
pub use graph::{GraphEdge, GraphNode, GraphSnapshot};
pub use models::{BotDetectionResult, ClusterAnalysis, IndividualBot, RiskMetrics};
pub use pipeline::BotDetector;
pub use reputation::{ReputationEntry, ReputationScores};
