// Colored terminal output for detection results.
//
// This module handles all terminal-specific formatting: colors, tables,
// summary lines. main.rs delegates here when --json is not given.

use colored::Colorize;

use crate::models::{BotDetectionResult, ClusterAnalysis, IndividualBot, RiskMetrics};

/// How many member ids to print per cluster row.
const NODES_PER_ROW: usize = 6;

/// Display a full detection result in the terminal.
pub fn display_detection_result(result: &BotDetectionResult) {
    if result.is_clean() {
        println!("\n{}", "No bot clusters or individual bots detected.".green());
        display_risk_metrics(&result.risk_metrics);
        return;
    }

    display_cluster_table("Confirmed Bot Clusters", &result.confirmed_bot_clusters, true);
    display_cluster_table("Suspicious Clusters", &result.suspicious_clusters, false);
    display_individual_bots(&result.individual_bots);
    display_risk_metrics(&result.risk_metrics);
}

fn display_cluster_table(title: &str, clusters: &[ClusterAnalysis], confirmed: bool) {
    if clusters.is_empty() {
        return;
    }

    println!(
        "\n{}",
        format!("=== {title} ({}) ===", clusters.len()).bold()
    );
    println!();

    println!(
        "  {:<20} {:>5}  {:>6}  {:>8}  {}",
        "Cluster".dimmed(),
        "Size".dimmed(),
        "Score".dimmed(),
        "Avg rep".dimmed(),
        "Risk factors".dimmed(),
    );
    println!("  {}", "-".repeat(78).dimmed());

    for cluster in clusters {
        let score = format!("{:.3}", cluster.suspicion_score);
        let score = if confirmed {
            score.red().bold()
        } else {
            score.yellow()
        };
        let factors: Vec<&str> = cluster.risk_factors.iter().map(|f| f.as_str()).collect();

        println!(
            "  {:<20} {:>5}  {:>6}  {:>8.1}  {}",
            super::truncate_chars(&cluster.cluster_id, 20),
            cluster.node_count,
            score,
            cluster.metrics.reputation.avg,
            factors.join(", "),
        );
        println!(
            "  {:<20} {}",
            "",
            super::summarize_nodes(&cluster.nodes, NODES_PER_ROW).dimmed()
        );
    }
}

fn display_individual_bots(bots: &[IndividualBot]) {
    if bots.is_empty() {
        return;
    }

    println!(
        "\n{}",
        format!("=== Individual Bots ({}) ===", bots.len()).bold()
    );
    println!();

    for bot in bots {
        println!(
            "  {:<40} rep {:>6.1}  sybil {:>.2}  {}",
            super::truncate_chars(&bot.node, 40),
            bot.reputation_score,
            bot.sybil_risk,
            bot.reason.as_str().bright_red(),
        );
    }
}

fn display_risk_metrics(metrics: &RiskMetrics) {
    println!("\n{}", "=== Risk Summary ===".bold());
    println!(
        "  Accounts: {}  |  Clusters scored: {}  |  Skipped: {}",
        metrics.total_accounts, metrics.clusters_evaluated, metrics.clusters_skipped
    );
    println!(
        "  Avg suspicion: {:.3}  |  High-risk accounts: {}",
        metrics.avg_suspicion_score, metrics.high_risk_nodes
    );

    let range = &metrics.affected_reputation_range;
    println!(
        "  Affected reputation: min {:.1}  max {:.1}  avg {:.1}",
        range.min, range.max, range.avg
    );

    if metrics.high_risk_nodes > 0 {
        println!(
            "  {} {} high-risk accounts",
            "!!".red().bold(),
            metrics.high_risk_nodes
        );
    }
    println!();
}
