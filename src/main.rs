//! gov-scraper main entry point
//!
//! This is the command-line interface for the gov-scraper bounded crawler.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use gov_scraper::config::{load_config_with_hash, validate, Config, SeedConfig};
use gov_scraper::crawler::{Engine, HttpFetcher};
use gov_scraper::output::{print_statistics, CsvReporter};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// gov-scraper: a bounded, same-domain web crawler
///
/// Starting from a seed URL, gov-scraper follows links on the seed's own host
/// up to a depth limit and a page budget, then writes run statistics and an
/// error log as CSV.
#[derive(Parser, Debug)]
#[command(name = "gov-scraper")]
#[command(version)]
#[command(about = "A bounded, same-domain web crawler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    target: Target,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Target {
    /// Crawl a government website
    Gov(CrawlArgs),
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// Seed URL; its host becomes the allowed domain
    #[arg(long = "start-url", alias = "start_url", value_name = "URL")]
    start_url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum link depth from the seed
    #[arg(long, value_name = "N")]
    depth: Option<u32>,

    /// Maximum number of pages to visit
    #[arg(long, value_name = "N")]
    max_pages: Option<u64>,

    /// Minimum seconds between requests
    #[arg(long, value_name = "SECS")]
    delay: Option<f64>,

    /// Number of concurrent fetch workers
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Per-page fetch deadline in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Treat URLs that differ only in their query string as distinct pages
    #[arg(long)]
    keep_query: bool,

    /// Where to write the stats CSV
    #[arg(long, value_name = "PATH")]
    stats_output: Option<PathBuf>,

    /// Where to write the error CSV
    #[arg(long, value_name = "PATH")]
    error_output: Option<PathBuf>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match cli.target {
        Target::Gov(args) => handle_crawl(args, cli.quiet).await,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gov_scraper=info,warn"),
            1 => EnvFilter::new("gov_scraper=debug,info"),
            2 => EnvFilter::new("gov_scraper=trace,debug"),
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

/// Loads the optional config file and layers command-line flags over it
fn resolve_config(args: &CrawlArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(url) = &args.start_url {
        config.crawler.start_url = Some(url.clone());
    }
    if let Some(depth) = args.depth {
        config.crawler.max_depth = depth;
    }
    if let Some(max_pages) = args.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(delay) = args.delay {
        config.crawler.delay_secs = delay;
    }
    if let Some(workers) = args.workers {
        config.crawler.workers = workers;
    }
    if let Some(timeout) = args.timeout {
        config.crawler.timeout_secs = timeout;
    }
    if args.keep_query {
        config.crawler.keep_query = true;
    }
    if let Some(path) = &args.stats_output {
        config.output.stats_path = path.clone();
    }
    if let Some(path) = &args.error_output {
        config.output.errors_path = path.clone();
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, seed: &SeedConfig) {
    println!("=== gov-scraper Dry Run ===\n");

    println!("Crawl:");
    println!("  Start URL: {}", seed.start_url);
    println!("  Allowed domain: {}", seed.allowed_domain);
    println!("  Max depth: {}", seed.max_depth);
    println!("  Max pages: {}", seed.max_pages);
    println!("  Delay: {:?}", seed.fetch_delay);
    println!("  Workers: {}", seed.workers);
    println!("  Page timeout: {:?}", seed.fetch_timeout);
    println!(
        "  Retries: {} ({}ms apart)",
        config.crawler.retries, config.crawler.retry_delay_ms
    );
    println!("  Query policy: {:?}", seed.query_policy);

    println!("\nUser Agent: {}", config.user_agent.user_agent_string());

    println!("\nOutput:");
    println!("  Stats: {}", config.output.stats_path.display());
    println!("  Errors: {}", config.output.errors_path.display());

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(args: CrawlArgs, quiet: bool) -> Result<()> {
    let config = resolve_config(&args)?;
    let seed = SeedConfig::new(config.crawler.start_url.as_deref(), &config.crawler)?;

    if args.dry_run {
        handle_dry_run(&config, &seed);
        return Ok(());
    }

    let fetcher = HttpFetcher::from_config(&config).context("Failed to build HTTP client")?;
    let reporter = CsvReporter::new(&config.output.stats_path, &config.output.errors_path);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    setup_shutdown_handler(shutdown_tx);

    let outcome = Engine::new(seed, Arc::new(fetcher))
        .with_shutdown(shutdown_rx)
        .run(&reporter)
        .await;

    if let Err(e) = &outcome.report {
        tracing::warn!("Reports were not fully written: {}", e);
    }

    if !quiet {
        print_statistics(&outcome.stats);
    }

    Ok(())
}

/// First Ctrl+C drains the crawl and still writes reports. Second Ctrl+C exits immediately.
fn setup_shutdown_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nReceived Ctrl+C, finishing in-flight pages...");
            eprintln!("Press Ctrl+C again to force quit");
            let _ = shutdown_tx.send(true);

            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nForce quit requested, exiting immediately...");
                std::process::exit(130);
            }
        }
    });
}
