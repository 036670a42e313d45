// Reputation inputs and group statistics.

pub mod models;
pub mod stats;

pub use models::{ReputationEntry, ReputationScores};
