use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use botwatch::clustering::{CandidateCluster, Clusterer, ComponentClusterer, StaticClusterer};
use botwatch::config::DetectionConfig;
use botwatch::graph::GraphSnapshot;
use botwatch::pipeline::BotDetector;
use botwatch::reputation::ReputationScores;

/// Botwatch: bot cluster and Sybil detection.
///
/// Scores candidate account groups in an interaction graph for coordinated
/// inauthentic behavior, using reputation scores as the main signal.
#[derive(Parser)]
#[command(name = "botwatch", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run bot detection over a graph snapshot
    Detect {
        /// Graph snapshot JSON ({"nodes": [...], "edges": [...]})
        #[arg(long)]
        graph: PathBuf,

        /// Reputation scores JSON (object keyed by account id)
        #[arg(long)]
        reputation: PathBuf,

        /// Precomputed candidate clusters JSON. Connected components are
        /// used when omitted.
        #[arg(long)]
        clusters: Option<PathBuf>,

        /// Only link accounts that interact in both directions
        #[arg(long)]
        reciprocal_only: bool,

        /// Ignore edges lighter than this when building components
        #[arg(long, default_value = "0")]
        min_weight: f64,

        /// Number of clusters to score in parallel (default: 8)
        #[arg(long, env = "BOTWATCH_CONCURRENCY", default_value = "8")]
        concurrency: usize,

        /// Give up after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Print the result as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the effective detection configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("botwatch=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = DetectionConfig::from_env().context("Invalid BOTWATCH_* configuration")?;

    match cli.command {
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }

        Commands::Detect {
            graph,
            reputation,
            clusters,
            reciprocal_only,
            min_weight,
            concurrency,
            timeout_secs,
            json,
        } => {
            let snapshot: GraphSnapshot = read_json(&graph)?;
            let scores: ReputationScores = read_json(&reputation)?;

            let clusterer: Arc<dyn Clusterer> = match clusters {
                Some(path) => {
                    let candidates: Vec<CandidateCluster> = read_json(&path)?;
                    info!(
                        candidates = candidates.len(),
                        "Using precomputed clusters from {}",
                        path.display()
                    );
                    Arc::new(StaticClusterer::new(candidates))
                }
                None => Arc::new(
                    ComponentClusterer::new()
                        .reciprocal_only(reciprocal_only)
                        .min_weight(min_weight),
                ),
            };

            let detector = BotDetector::new(config, clusterer)?.with_concurrency(concurrency);

            let result = match timeout_secs {
                Some(secs) => {
                    detector
                        .detect_until(
                            snapshot,
                            scores,
                            tokio::time::sleep(Duration::from_secs(secs)),
                        )
                        .await?
                }
                None => detector.detect(snapshot, scores).await?,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!(
                    "{}",
                    format!(
                        "Botwatch report - {}",
                        chrono::Utc::now().format("%Y-%m-%d %H:%M UTC")
                    )
                    .dimmed()
                );
                botwatch::output::terminal::display_detection_result(&result);
            }
        }
    }

    Ok(())
}

/// Read and parse a JSON input file.
fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}
