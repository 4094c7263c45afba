//! Crawlscope main entry point
//!
//! This is the command-line interface for the Crawlscope crawler and search.

use anyhow::Context;
use clap::{Parser, Subcommand};
use crawlscope::config::{load_config_with_hash, Config};
use crawlscope::index::ElasticsearchIndex;
use crawlscope::search::SearchRanker;
use crawlscope::{CrawlEngine, CrawlRequest, CrawlStatusOut};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Crawlscope: a breadth-first site crawler feeding a search index
///
/// Crawls a site from a seed URL within distance, page and time bounds,
/// indexes every page it reaches and searches what has been indexed.
#[derive(Parser, Debug)]
#[command(name = "crawlscope")]
#[command(version = "1.0.0")]
#[command(about = "A breadth-first site crawler feeding a search index", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", default_value = "crawlscope.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl a site and print the final status
    Crawl {
        /// Seed URL; scheme and `www.` are added when missing
        url: String,

        /// Maximum link distance from the seed
        #[arg(long, default_value_t = 2)]
        max_distance: u32,

        /// Wall-clock budget in seconds
        #[arg(long, default_value_t = 60)]
        max_seconds: u64,

        /// Maximum distinct pages (0 = unbounded)
        #[arg(long, default_value_t = 0)]
        max_urls: u64,
    },

    /// Print the status of a crawl
    Status {
        /// Crawl id printed by `crawl`
        crawl_id: String,
    },

    /// Search indexed pages
    Search {
        /// Query text; every term must match
        query: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e).with_context(|| format!("Invalid configuration {}", cli.config.display()));
        }
    };

    match cli.command {
        Command::Crawl {
            url,
            max_distance,
            max_seconds,
            max_urls,
        } => {
            let request = CrawlRequest {
                url,
                max_distance,
                max_seconds,
                max_urls,
            };
            handle_crawl(&config, &request).await?;
        }
        Command::Status { crawl_id } => handle_status(&config, &crawl_id).await?,
        Command::Search { query } => handle_search(&config, &query).await?,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("crawlscope=info,warn"),
            1 => EnvFilter::new("crawlscope=debug,info"),
            2 => EnvFilter::new("crawlscope=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Runs one crawl to completion (or Ctrl-C) and prints its final status
async fn handle_crawl(config: &Config, request: &CrawlRequest) -> anyhow::Result<()> {
    let engine = CrawlEngine::from_config(config).context("Failed to start crawl engine")?;
    let (crawl_id, status) = engine
        .start(request)
        .with_context(|| format!("Failed to start crawl of {}", request.url))?;
    println!("Crawl id: {}", crawl_id);

    if !status.is_stopped() {
        tokio::select! {
            _ = engine.wait_idle() => {
                tracing::info!("Crawl {} has no more work", crawl_id);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("Interrupted, stopping crawl {}", crawl_id);
                engine.stop_all("Stopped by user");
                engine.wait_idle().await;
            }
        }
    }

    let status = engine.status(&crawl_id);
    engine.orchestrator().release_crawl(&crawl_id);
    engine.shutdown().await;

    println!("{}", serde_json::to_string_pretty(&CrawlStatusOut::from(&status))?);
    Ok(())
}

async fn handle_status(config: &Config, crawl_id: &str) -> anyhow::Result<()> {
    if config.storage.is_in_memory() {
        tracing::warn!("In-memory storage only knows crawls started by this process");
    }
    let engine = CrawlEngine::from_config(config).context("Failed to open crawl state")?;
    let status = engine.status(crawl_id);
    engine.shutdown().await;

    println!("{}", serde_json::to_string_pretty(&CrawlStatusOut::from(&status))?);
    Ok(())
}

async fn handle_search(config: &Config, query: &str) -> anyhow::Result<()> {
    let index = ElasticsearchIndex::from_config(&config.index)?;
    let ranker = SearchRanker::new(Arc::new(index));
    let results = ranker
        .search(query)
        .await
        .with_context(|| format!("Search for {:?} failed", query))?;
    tracing::info!("{} results for {:?}", results.len(), query);

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
