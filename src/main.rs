//! Shoal main entry point
//!
//! This is the command-line interface for the Shoal article harvester.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use shoal::config::{load_config_with_hash, Config, SourceConfig};
use shoal::crawler::{Coordinator, CrawlSummary, DomainRateLimiter};
use shoal::output::{load_statistics, print_statistics, print_summary};
use shoal::storage::{MemoryStorage, SqliteStorage, Storage};
use shoal::ShoalError;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Shoal: a polite multi-source article harvester
///
/// Shoal crawls the configured sources' listing pages, fetches their
/// articles under per-domain pacing, and stores only content it has not
/// seen before.
#[derive(Parser, Debug)]
#[command(name = "shoal")]
#[command(version)]
#[command(about = "A polite multi-source article harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Crawl only the named source
    #[arg(long, value_name = "NAME", conflicts_with_all = ["dry_run", "stats"])]
    source: Option<String>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// Keep crawled articles in memory only
    #[arg(long, conflicts_with = "stats")]
    no_persist: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    if cli.stats {
        return handle_stats(&config);
    }

    let selected: Option<&SourceConfig> = match &cli.source {
        Some(name) => Some(
            config
                .source(name)
                .ok_or_else(|| ShoalError::UnknownSource(name.clone()))?,
        ),
        None => None,
    };

    if cli.no_persist {
        handle_crawl(&config, selected, MemoryStorage::new()).await
    } else {
        let storage = SqliteStorage::new(Path::new(&config.output.database_path))
            .with_context(|| format!("failed to open {}", config.output.database_path))?;
        handle_crawl(&config, selected, storage).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shoal=info,warn"),
            1 => EnvFilter::new("shoal=debug,info"),
            2 => EnvFilter::new("shoal=trace,debug"),
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

/// Handles the --dry-run mode: shows the validated source registry
fn handle_dry_run(config: &Config) {
    println!("=== Shoal Dry Run ===\n");

    let crawler = &config.crawler;
    println!("Crawler Configuration:");
    println!("  Batch size: {}", crawler.batch_size);
    println!("  Batch delay: {}ms", crawler.batch_delay);
    println!("  Max articles per source: {}", crawler.max_articles_per_source);
    println!("  Request timeout: {}ms", crawler.request_timeout);
    println!(
        "  Retries: {} (base delay {}ms)",
        crawler.max_retries, crawler.retry_base_delay
    );
    println!("  Skip known URLs: {}", crawler.skip_known_urls);
    println!("  Respect robots.txt: {}", crawler.respect_robots);

    println!("\nUser Agent: {}", config.user_agent.header_value());
    println!("Database: {}", config.output.database_path);

    println!("\nSources ({}):", config.sources.len());
    for source in &config.sources {
        println!(
            "  - {} ({}, min delay {}ms)",
            source.name, source.listing_url, source.min_delay
        );
        println!("    links: {}", source.selectors.article_links);
        println!("    title: {}", source.selectors.title.join(" | "));
        println!("    body: {}", source.selectors.body.join(" | "));
        if !source.selectors.timestamp.is_empty() {
            println!("    timestamp: {}", source.selectors.timestamp.join(" | "));
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))
        .with_context(|| format!("failed to open {}", config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
///
/// With a selected source only that source is crawled; its result is shown
/// as a one-source summary and not recorded as a run.
async fn handle_crawl<S: Storage>(
    config: &Config,
    selected: Option<&SourceConfig>,
    storage: S,
) -> Result<()> {
    let store = Arc::new(Mutex::new(storage));
    let limiter = Arc::new(DomainRateLimiter::new());
    let coordinator = Coordinator::new(config, store, limiter)?;

    let summary = match selected {
        Some(source) => {
            let started_at = Utc::now();
            let result = coordinator.crawl_one(source).await;
            let duration = result.duration;
            CrawlSummary::from_results(started_at, vec![result], duration)
        }
        None => coordinator.crawl_all(&config.sources).await,
    };

    print_summary(&summary);
    Ok(())
}
