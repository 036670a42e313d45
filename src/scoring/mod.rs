// Cluster scoring: behavioral and temporal analyzers plus the fusion step.

pub mod behavioral;
pub mod cluster;
pub mod suspicion;
pub mod temporal;
