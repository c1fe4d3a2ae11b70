//! Catalog-Harvest main entry point
//!
//! This is the command-line interface for the Catalog-Harvest catalog poller.

use anyhow::Context;
use catalog_harvest::config::{load_config_with_hash, Config};
use catalog_harvest::harvest::{group_sources, run_harvest};
use catalog_harvest::output::{load_statistics, print_report, print_statistics};
use catalog_harvest::storage::FsStorage;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Catalog-Harvest: an incremental catalog poller
///
/// Catalog-Harvest walks paginated catalog APIs, records items it has not
/// seen before, and merges them into local JSON collection files.
#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(version = "1.0.0")]
#[command(about = "An incremental catalog poller", long_about = None)]
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

    /// Validate config and show what would be harvested without fetching
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics for the existing output files and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Dispatches to the selected mode; `Ok(false)` means the run completed but
/// at least one output file could not be saved
async fn run(cli: Cli) -> anyhow::Result<bool> {
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config);
        Ok(true)
    } else if cli.stats {
        handle_stats(&config);
        Ok(true)
    } else {
        handle_harvest(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_harvest=info,warn"),
            1 => EnvFilter::new("catalog_harvest=debug,info"),
            2 => EnvFilter::new("catalog_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows sources grouped by destination file
fn handle_dry_run(config: &Config) {
    println!("=== Catalog-Harvest Dry Run ===\n");

    println!("Fetcher:");
    println!("  User agent: {}", config.fetcher.user_agent);
    println!("  Timeout: {}s", config.fetcher.timeout_secs);
    println!("  Max attempts: {}", config.fetcher.max_attempts);
    println!("  Retry base delay: {}ms", config.fetcher.retry_base_delay_ms);
    println!("  Page delay: {}ms", config.fetcher.page_delay_ms);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Merge order: {:?}", config.output.merge_order);
    println!("  Skip unchanged: {}", config.output.skip_unchanged);

    let groups = group_sources(&config.sources);
    println!("\nDestination files ({}):", groups.len());
    for (output_file, sources) in &groups {
        println!("  - {} ({} sources)", output_file, sources.len());
        for source in sources {
            let limit = source
                .max_pages
                .map(|n| format!(", max {} pages", n))
                .unwrap_or_default();
            println!(
                "    * {} [{:?}{}] {}",
                source.name, source.duplicate_policy, limit, source.base_url
            );
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows what the output files currently hold
fn handle_stats(config: &Config) {
    let storage = FsStorage::new(&config.output.directory);
    println!("Directory: {}\n", storage.root().display());
    print_statistics(&load_statistics(config, &storage));
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config) -> anyhow::Result<bool> {
    let report = run_harvest(config).await.context("Harvest failed")?;
    print_report(&report);

    for file in report.failed_files() {
        tracing::error!("Failed to save {}", file.output_file);
    }

    Ok(report.success())
}
