//! Recipe-Harvest main entry point
//!
//! This is the command-line interface for the Recipe-Harvest crawler.

use anyhow::Context;
use clap::Parser;
use recipe_harvest::config::{compute_config_hash, parse_config, validate, Config};
use recipe_harvest::crawler::{harvest, user_agent_string};
use recipe_harvest::output::print_summary;
use recipe_harvest::url::{alternates_for, parse_locator};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Recipe-Harvest: a two-phase recipe crawler
///
/// Recipe-Harvest walks a site's recipe listing pages, visits each recipe
/// page it finds and writes one JSON record per recipe, falling back to
/// print and lightweight renderings when a page is missing fields.
#[derive(Parser, Debug)]
#[command(name = "recipe-harvest")]
#[command(version)]
#[command(about = "A two-phase recipe crawler", long_about = None)]
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

    /// Validate config and show what would be crawled without fetching anything
    #[arg(long)]
    dry_run: bool,

    /// Override the JSON-lines output path
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Override the number of records wanted
    #[arg(long, value_name = "N")]
    results: Option<u64>,

    /// Override the maximum number of listing pages
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let content = std::fs::read_to_string(&cli.config)
        .with_context(|| format!("Failed to read {}", cli.config.display()))?;
    let mut config = parse_config(&content).context("Failed to parse configuration")?;

    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid configuration")?;

    let hash = compute_config_hash(&cli.config)?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config)
    } else {
        handle_harvest(&config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("recipe_harvest=info,warn"),
            1 => EnvFilter::new("recipe_harvest=debug,info"),
            2 => EnvFilter::new("recipe_harvest=trace,debug"),
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

/// Command-line values win over the file
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(output) = &cli.output {
        config.output.records_path = output.display().to_string();
    }
    if let Some(results) = cli.results {
        config.crawl.results_wanted = Some(results);
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawl.max_pages = max_pages;
    }
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Recipe-Harvest Dry Run ===\n");

    println!("Crawl Configuration:");
    println!("  Start URL: {}", config.crawl.start_url);
    match config.crawl.results_wanted {
        Some(n) => println!("  Results wanted: {}", n),
        None => println!("  Results wanted: unbounded"),
    }
    println!("  Max listing pages: {}", config.crawl.max_pages);
    println!("  Collect details: {}", config.crawl.collect_details);
    println!("  Dedupe: {}", config.crawl.dedupe);
    println!("  Max concurrency: {}", config.crawl.max_concurrency);
    if !config.crawl.recipe_type.is_empty() {
        println!("  Recipe type: {}", config.crawl.recipe_type);
    }
    println!("  Detail path pattern: {}", config.site.detail_path_pattern);

    println!("\nUser Agent:");
    println!("  {}", user_agent_string(&config.user_agent));
    println!("  Timeout: {}s", config.user_agent.timeout_secs);
    if let Some(proxy) = &config.user_agent.proxy_url {
        println!("  Proxy: {}", proxy);
    }

    println!("\nOutput:");
    println!("  Records: {}", config.output.records_path);

    let start = parse_locator(&config.crawl.start_url)?;
    println!("\nAlternate endpoints tried for an incomplete detail page like the start URL:");
    for alternate in alternates_for(&start) {
        println!("  - {}", alternate);
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: &Config) -> anyhow::Result<()> {
    match harvest(config).await {
        Ok(summary) => {
            tracing::info!("Harvest completed successfully");
            println!();
            print_summary(&summary);
            println!("\n✓ Records written to: {}", config.output.records_path);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
