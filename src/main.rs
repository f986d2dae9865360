//! Profile-Sieve main entry point
//!
//! This is the command-line interface for the Profile-Sieve crawler.

use anyhow::{bail, Context};
use clap::Parser;
use profile_sieve::config::{load_config_with_hash, CacheMode, Config};
use profile_sieve::crawler::{run_crawl, HttpRenderClient};
use profile_sieve::output::{open_sinks, print_history, print_outcome};
use profile_sieve::storage::open_storage;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Profile-Sieve: a crawler for JavaScript-rendered search feeds
///
/// Profile-Sieve walks a search result feed through a render service,
/// extracts every linked profile, and keeps the education entries located
/// in the configured country.
#[derive(Parser, Debug)]
#[command(name = "profile-sieve")]
#[command(version)]
#[command(about = "Crawls a rendered search feed into filtered profile records", long_about = None)]
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

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show stored run history from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(ExitCode::SUCCESS);
    }

    if cli.stats {
        handle_stats(&config)?;
        return Ok(ExitCode::SUCCESS);
    }

    handle_crawl(config, &config_hash).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("profile_sieve=info,warn"),
            1 => EnvFilter::new("profile_sieve=debug,info"),
            2 => EnvFilter::new("profile_sieve=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Profile-Sieve Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Search URL: {}", config.crawler.search_url);
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );
    println!("  Max search pages: {}", config.crawler.max_search_pages);
    if config.crawler.allowed_domains.is_empty() {
        println!("  Allowed domains: any");
    } else {
        println!("  Allowed domains:");
        for domain in &config.crawler.allowed_domains {
            println!("    - {}", domain);
        }
    }

    println!("\nFilter:");
    println!("  Target country: {}", config.filter.target_country);

    println!("\nRetry:");
    println!("  Max retries: {}", config.retry.max_retries);
    println!("  Base delay: {}ms", config.retry.base_delay_ms);

    println!("\nRender Service:");
    println!("  Endpoint: {}", config.render.endpoint);
    println!("  Timeout: {}s", config.render.timeout_secs);
    println!("  Politeness delay: {}ms", config.render.politeness_delay_ms);
    println!(
        "  Cache: {}",
        match config.render.cache_mode {
            CacheMode::Enabled => "enabled",
            CacheMode::Disabled => "disabled",
        }
    );
    println!("  User agents: {}", config.render.user_agents.len());

    println!("\nOutput:");
    println!("  JSON Lines: {}", config.output.jsonl_path);
    match &config.output.database_path {
        Some(path) => println!("  Database: {}", path),
        None => println!("  Database: none"),
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows stored run history
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let Some(db_path) = &config.output.database_path else {
        bail!("No database-path configured under [output]; nothing to show");
    };

    println!("Database: {}\n", db_path);
    let storage = open_storage(Path::new(db_path))?;
    print_history(&storage)?;

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: &str) -> anyhow::Result<ExitCode> {
    let client = Arc::new(HttpRenderClient::new(&config.render)?);
    let sinks = Arc::new(open_sinks(&config.output, config_hash)?);

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping crawl");
            shutdown.cancel();
        }
    });

    tracing::info!(
        "Crawling {} for profiles educated in {}",
        config.crawler.search_url,
        config.filter.target_country
    );

    let outcome = run_crawl(&config, client, sinks, cancel).await?;
    print_outcome(&outcome);

    if outcome.empty_run {
        tracing::error!("No profiles scraped");
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}
