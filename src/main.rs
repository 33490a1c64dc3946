//! Site-Mirror main entry point
//!
//! This is the command-line interface for the Site-Mirror crawler.

use anyhow::Context;
use clap::Parser;
use site_mirror::config::{load_config, Config};
use site_mirror::output::log_summary;
use site_mirror::Coordinator;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Site-Mirror: mirror a single web domain to disk
///
/// Site-Mirror crawls one domain breadth-first from a start URL, saving every page and
/// same-domain resource it finds up to a maximum depth.
#[derive(Parser, Debug)]
#[command(name = "site-mirror")]
#[command(version = "1.0.0")]
#[command(about = "Mirror a single web domain to disk", long_about = None)]
struct Cli {
    /// URL to start mirroring from
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Maximum link depth to follow from the start URL [default: 5]
    #[arg(long, value_name = "N")]
    depth: Option<u32>,

    /// Directory the mirror is written to [default: ./]
    #[arg(long, value_name = "DIR")]
    out: Option<String>,

    /// Number of concurrent workers [default: 5]
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Honor the domain's robots.txt
    #[arg(long)]
    robots: bool,

    /// Path to a TOML configuration file; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = build_config(&cli)?;
    let coordinator = Coordinator::new(config).context("Invalid configuration")?;

    let cancel = coordinator.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping workers");
            cancel.cancel();
        }
    });

    tracing::info!(
        "Writing mirror to {}",
        coordinator.config().output.directory
    );

    let summary = coordinator.run().await?;
    log_summary(&summary);

    Ok(())
}

/// Builds the crawl configuration from the optional file and command-line flags
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(url) = &cli.url {
        config.crawler.start_url = Some(url.clone());
    }
    if let Some(depth) = cli.depth {
        config.crawler.max_depth = depth;
    }
    if let Some(out) = &cli.out {
        config.output.directory = out.clone();
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawler.concurrency = concurrency;
    }
    if cli.robots {
        config.crawler.respect_robots = true;
    }

    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_mirror=info,warn"),
            1 => EnvFilter::new("site_mirror=debug,info"),
            2 => EnvFilter::new("site_mirror=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
