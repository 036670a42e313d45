// Post-clustering passes: individual-bot scan and run-wide risk metrics.
//
// Individual scan criteria (for accounts outside every reported cluster):
// - final score below 200 AND sybil risk above the configured threshold, or
// - sybil risk above 0.9 regardless of score.
// The reason is "high-sybil-risk" whenever sybil risk exceeds 0.7, which
// means "very-low-reputation" is only reachable through the first branch
// with a configured threshold at or below 0.7.

use std::collections::HashSet;

use crate::config::DetectionConfig;
use crate::models::{BotReason, ClusterAnalysis, IndividualBot, ReputationRange, RiskMetrics};
use crate::reputation::models::{score_of, ReputationScores};

const VERY_LOW_SCORE: f64 = 200.0;
const EXTREME_SYBIL_RISK: f64 = 0.9;
const HIGH_SYBIL_REASON_CUTOFF: f64 = 0.7;
const HIGH_RISK_NODE_SYBIL: f64 = 0.8;

/// Decide whether a lone account is a bot, and why.
pub fn individual_reason(final_score: f64, sybil_risk: f64, config: &DetectionConfig) -> Option<BotReason> {
    let flagged = (final_score < VERY_LOW_SCORE && sybil_risk > config.high_sybil_risk_threshold)
        || sybil_risk > EXTREME_SYBIL_RISK;
    if !flagged {
        return None;
    }

    if sybil_risk > HIGH_SYBIL_REASON_CUTOFF {
        Some(BotReason::HighSybilRisk)
    } else {
        Some(BotReason::VeryLowReputation)
    }
}

/// Flag every account in `scores` that is not in `clustered`.
///
/// Walks the reputation map in key order, so output order is stable.
pub fn scan_individuals(
    scores: &ReputationScores,
    clustered: &HashSet<&str>,
    config: &DetectionConfig,
) -> Vec<IndividualBot> {
    scores
        .iter()
        .filter(|(id, _)| !clustered.contains(id.as_str()))
        .filter_map(|(id, entry)| {
            let sybil_risk = entry.sybil_risk_or_zero();
            individual_reason(entry.final_score, sybil_risk, config).map(|reason| IndividualBot {
                node: id.clone(),
                reputation_score: entry.final_score,
                sybil_risk,
                reason,
            })
        })
        .collect()
}

/// Summarize everything flagged in a run.
///
/// Run counters (`clusters_evaluated`, `clusters_skipped`, `total_accounts`)
/// are left at zero for the caller to fill in.
pub fn risk_metrics(
    confirmed: &[ClusterAnalysis],
    suspicious: &[ClusterAnalysis],
    individuals: &[IndividualBot],
    scores: &ReputationScores,
) -> RiskMetrics {
    let reported: Vec<&ClusterAnalysis> = confirmed.iter().chain(suspicious.iter()).collect();

    let avg_suspicion_score = if reported.is_empty() {
        0.0
    } else {
        reported.iter().map(|c| c.suspicion_score).sum::<f64>() / reported.len() as f64
    };

    let high_risk_nodes = confirmed.iter().map(|c| c.node_count).sum::<usize>()
        + individuals
            .iter()
            .filter(|b| b.sybil_risk > HIGH_RISK_NODE_SYBIL)
            .count();

    // Every touched account once, in first-seen order
    let mut seen: HashSet<&str> = HashSet::new();
    let affected: Vec<f64> = reported
        .iter()
        .flat_map(|c| c.nodes.iter().map(String::as_str))
        .chain(individuals.iter().map(|b| b.node.as_str()))
        .filter(|id| seen.insert(*id))
        .map(|id| score_of(scores, id))
        .collect();

    RiskMetrics {
        avg_suspicion_score,
        high_risk_nodes,
        affected_reputation_range: reputation_range(&affected),
        ..RiskMetrics::default()
    }
}

fn reputation_range(values: &[f64]) -> ReputationRange {
    if values.is_empty() {
        return ReputationRange::default();
    }
    ReputationRange {
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        avg: values.iter().sum::<f64>() / values.len() as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extreme_risk_flags_regardless_of_score() {
        let config = DetectionConfig::default();
        assert_eq!(
            individual_reason(900.0, 0.95, &config),
            Some(BotReason::HighSybilRisk)
        );
    }

    #[test]
    fn test_low_score_needs_risk_above_threshold() {
        let config = DetectionConfig::default();
        assert_eq!(individual_reason(100.0, 0.7, &config), None);
        assert_eq!(
            individual_reason(100.0, 0.75, &config),
            Some(BotReason::HighSybilRisk)
        );
    }

    #[test]
    fn test_very_low_reputation_needs_lowered_threshold() {
        let config = DetectionConfig {
            high_sybil_risk_threshold: 0.5,
            ..DetectionConfig::default()
        };
        assert_eq!(
            individual_reason(150.0, 0.6, &config),
            Some(BotReason::VeryLowReputation)
        );
    }

    #[test]
    fn test_empty_range_is_zeroed() {
        assert_eq!(reputation_range(&[]), ReputationRange::default());
    }
}
