//! `huddle`: cluster images by colour histogram and print a JSON mapping of
//! image path to cluster id (`-1` for noise).

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use huddle::{ClusterConfig, ClusteringService, Metric};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "huddle")]
#[command(about = "Cluster images by colour histogram", long_about = None)]
struct Cli {
    /// Image files to cluster
    #[arg(long, num_args = 1.., required = true)]
    images: Vec<PathBuf>,

    /// Neighborhood radius [default: 0.5]
    #[arg(long)]
    eps: Option<f32>,

    /// Minimum neighborhood size for a core point, the image itself included [default: 1]
    #[arg(long = "min-samples", visible_alias = "min-pts", alias = "min_samples")]
    min_samples: Option<usize>,

    /// Distance metric: euclidean or manhattan [default: euclidean]
    #[arg(long)]
    metric: Option<Metric>,

    /// TOML configuration file; command-line flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Abort clustering after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Worker threads for feature extraction
    #[arg(long)]
    threads: Option<usize>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

impl Cli {
    fn resolve_config(&self) -> anyhow::Result<ClusterConfig> {
        let mut config = match &self.config {
            Some(path) => ClusterConfig::load(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?,
            None => ClusterConfig::default(),
        };
        if let Some(eps) = self.eps {
            config.eps = eps;
        }
        if let Some(min_pts) = self.min_samples {
            config.min_pts = min_pts;
        }
        if let Some(metric) = self.metric {
            config.metric = metric;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = Some(timeout_ms);
        }
        if let Some(threads) = self.threads {
            config.threads = Some(threads);
        }
        config.validate()?;
        Ok(config)
    }
}

/// `RUST_LOG` when set, otherwise info-level logs for this crate only.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("huddle=info"))
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries only the JSON result.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    info!(
        images = cli.images.len(),
        eps = config.eps,
        min_pts = config.min_pts,
        metric = %config.metric,
        "clustering images"
    );

    let assignments = ClusteringService::new(config)
        .cluster_paths(&cli.images)
        .context("clustering failed")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if cli.pretty {
        serde_json::to_writer_pretty(&mut out, &assignments)?;
    } else {
        serde_json::to_writer(&mut out, &assignments)?;
    }
    writeln!(out)?;
    Ok(())
}
