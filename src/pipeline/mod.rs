// Detection pipeline: orchestration and post-clustering aggregation.

pub mod aggregate;
pub mod detect;

pub use detect::{BotDetector, DetectionPhase, DEFAULT_CONCURRENCY};
