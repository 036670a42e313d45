use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::ClusterVerdict;

/// Top-level fusion weights for the four analyzer composites.
///
/// Not required to sum to 1.0, but the defaults do.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectionWeights {
    pub reputation_based: f64,
    pub graph_structure: f64,
    pub behavioral_patterns: f64,
    pub temporal_patterns: f64,
}

impl Default for DetectionWeights {
    fn default() -> Self {
        Self {
            reputation_based: 0.25,
            graph_structure: 0.35,
            behavioral_patterns: 0.30,
            temporal_patterns: 0.10,
        }
    }
}

/// Detection engine configuration. Immutable for the lifetime of a
/// `BotDetector`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectionConfig {
    /// Smallest cluster that gets scored (default 3)
    pub min_cluster_size: usize,
    /// Score above which a cluster is reported as suspicious (default 0.5)
    pub suspicion_threshold: f64,
    /// Score above which a cluster is reported as a confirmed bot cluster
    /// (default 0.7, must be >= suspicion_threshold)
    pub confirmed_threshold: f64,
    /// Fraction of the 1000-point reputation scale below which a cluster's
    /// average counts as low (default 0.3)
    pub low_reputation_threshold: f64,
    /// Sybil risk above which a low-reputation unclustered account is
    /// flagged (default 0.7)
    pub high_sybil_risk_threshold: f64,
    pub detection_weights: DetectionWeights,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_cluster_size: 3,
            suspicion_threshold: 0.5,
            confirmed_threshold: 0.7,
            low_reputation_threshold: 0.3,
            high_sybil_risk_threshold: 0.7,
            detection_weights: DetectionWeights::default(),
        }
    }
}

impl DetectionConfig {
    /// Defaults overlaid with any `BOTWATCH_*` environment variables.
    ///
    /// The result is validated before it is returned.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        overlay(&mut config.min_cluster_size, "BOTWATCH_MIN_CLUSTER_SIZE")?;
        overlay(&mut config.suspicion_threshold, "BOTWATCH_SUSPICION_THRESHOLD")?;
        overlay(&mut config.confirmed_threshold, "BOTWATCH_CONFIRMED_THRESHOLD")?;
        overlay(
            &mut config.low_reputation_threshold,
            "BOTWATCH_LOW_REPUTATION_THRESHOLD",
        )?;
        overlay(
            &mut config.high_sybil_risk_threshold,
            "BOTWATCH_HIGH_SYBIL_RISK_THRESHOLD",
        )?;

        let weights = &mut config.detection_weights;
        overlay(&mut weights.reputation_based, "BOTWATCH_WEIGHT_REPUTATION")?;
        overlay(&mut weights.graph_structure, "BOTWATCH_WEIGHT_STRUCTURE")?;
        overlay(&mut weights.behavioral_patterns, "BOTWATCH_WEIGHT_BEHAVIORAL")?;
        overlay(&mut weights.temporal_patterns, "BOTWATCH_WEIGHT_TEMPORAL")?;

        config.validate()?;
        Ok(config)
    }

    /// Check every invariant the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_cluster_size == 0 {
            return Err(ConfigError::MinClusterSize);
        }

        for (name, value) in [
            ("suspicionThreshold", self.suspicion_threshold),
            ("confirmedThreshold", self.confirmed_threshold),
            ("lowReputationThreshold", self.low_reputation_threshold),
            ("highSybilRiskThreshold", self.high_sybil_risk_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { name, value });
            }
        }

        if self.confirmed_threshold < self.suspicion_threshold {
            return Err(ConfigError::ThresholdOrder {
                suspicion: self.suspicion_threshold,
                confirmed: self.confirmed_threshold,
            });
        }

        let w = &self.detection_weights;
        for (name, value) in [
            ("reputationBased", w.reputation_based),
            ("graphStructure", w.graph_structure),
            ("behavioralPatterns", w.behavioral_patterns),
            ("temporalPatterns", w.temporal_patterns),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }

        Ok(())
    }

    /// Bucket a suspicion score. Both boundaries are strict: a score equal
    /// to a threshold falls into the lower bucket.
    pub fn classify(&self, suspicion_score: f64) -> ClusterVerdict {
        if suspicion_score > self.confirmed_threshold {
            ClusterVerdict::Confirmed
        } else if suspicion_score > self.suspicion_threshold {
            ClusterVerdict::Suspicious
        } else {
            ClusterVerdict::Legitimate
        }
    }

    /// The low-reputation cutoff on the 1000-point scale.
    pub fn low_reputation_cutoff(&self) -> f64 {
        self.low_reputation_threshold * crate::reputation::models::REPUTATION_SCALE
    }
}

/// Replace `slot` with the parsed value of `var` when it is set.
fn overlay<T: FromStr>(slot: &mut T, var: &'static str) -> Result<(), ConfigError> {
    match env::var(var) {
        Ok(raw) => {
            *slot = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var,
                value: raw.clone(),
            })?;
            Ok(())
        }
        Err(_) => Ok(()),
    }
}
