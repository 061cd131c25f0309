//! Seo-Ripple main entry point
//!
//! This is the command-line interface for the Seo-Ripple site auditor.

use anyhow::Context;
use clap::Parser;
use seo_ripple::config::{compute_config_hash, read_config, validate, Config, Overrides};
use seo_ripple::crawler::run_audit;
use seo_ripple::output::{
    export_session, load_statistics, print_statistics, OutputError, ReportOptions,
    SessionStatistics,
};
use seo_ripple::storage::{open_storage, Storage};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Seo-Ripple: an on-page SEO auditor
///
/// Seo-Ripple discovers a site's pages through its sitemap (or by following
/// links from the root), scores each page's on-page SEO, ranks keywords and
/// writes CSV and HTML reports.
#[derive(Parser, Debug)]
#[command(name = "seo-ripple")]
#[command(version)]
#[command(about = "An on-page SEO auditor", long_about = None)]
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

    /// Site to audit, replacing [site] url
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Page cap, replacing [crawler] max-pages
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// PageSpeed Insights API key, replacing [pagespeed] api-key
    #[arg(long, env = "PAGESPEED_API_KEY", hide_env_values = true)]
    pagespeed_key: Option<String>,

    /// Validate config and show what would be audited without fetching anything
    #[arg(long, conflicts_with_all = ["stats", "export_report"])]
    dry_run: bool,

    /// Show statistics of the latest stored run and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_report"])]
    stats: bool,

    /// Regenerate CSV and HTML reports from the latest stored run and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export_report: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            url: self.url.clone(),
            max_pages: self.max_pages,
            pagespeed_key: self.pagespeed_key.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = load_effective_config(&cli)?;
    let config_hash = compute_config_hash(&cli.config)
        .with_context(|| format!("failed to hash {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export_report {
        handle_export_report(&config)?;
    } else {
        handle_audit(config, &config_hash).await?;
    }

    Ok(())
}

/// Reads the config file, applies command-line overrides, then validates
fn load_effective_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = read_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    config.apply_overrides(&cli.overrides());
    validate(&config).context("invalid configuration")?;
    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("seo_ripple=info,warn"),
            1 => EnvFilter::new("seo_ripple=debug,info"),
            2 => EnvFilter::new("seo_ripple=trace,debug"),
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
    println!("=== Seo-Ripple Dry Run ===\n");

    println!("Site:");
    println!("  URL: {}", config.site.url);
    println!(
        "  Password: {}",
        if config.site.password.is_some() {
            "set"
        } else {
            "none"
        }
    );
    if config.site.password.is_some() {
        println!("  Auth mode: {:?}", config.site.auth);
    }

    println!("\nCrawler Configuration:");
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Workers: {}", config.crawler.effective_workers());
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!(
        "  Retries: {} (backoff {}ms)",
        config.crawler.max_retries, config.crawler.retry_backoff
    );
    println!("  Respect robots.txt: {}", config.crawler.respect_robots);
    println!(
        "  Ignored extensions: {}",
        config.crawler.ignored_extensions.join(" ")
    );
    println!(
        "  Excluded path words: {}",
        config.crawler.excluded_path_words.join(" ")
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.user_agent_string());

    println!("\nPageSpeed:");
    if config.pagespeed.active_key().is_some() {
        let strategies: Vec<&str> = config
            .pagespeed
            .strategies
            .iter()
            .map(|s| s.as_str())
            .collect();
        println!("  Strategies: {}", strategies.join(", "));
        println!("  Endpoint: {}", config.pagespeed.endpoint);
    } else {
        println!("  Disabled (no API key)");
    }

    println!("\nAnalysis:");
    println!("  Keywords per page: {}", config.analysis.top_keywords);
    println!("  Site-wide keywords: {}", config.analysis.sitewide_keywords);
    println!(
        "  Extra stop words: {}",
        config.analysis.extra_stop_words.len()
    );

    println!("\nOutput:");
    println!("  Reports: {}", config.output.directory);
    println!("  Database: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics of the latest stored run
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let db_path = Path::new(&config.output.database_path);
    println!("Database: {}\n", db_path.display());

    let storage = open_storage(db_path).context("failed to open database")?;
    let (run, stats) = load_statistics(&storage, config.analysis.sitewide_keywords)?;

    println!("Run #{} started {}\n", run.id, run.started_at);
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export-report mode: rewrites reports for the latest stored run
fn handle_export_report(config: &Config) -> anyhow::Result<()> {
    let db_path = Path::new(&config.output.database_path);
    println!("=== Exporting Audit Reports ===\n");
    println!("Database: {}", db_path.display());
    println!("Output: {}", config.output.directory);
    println!();

    let storage = open_storage(db_path).context("failed to open database")?;

    tracing::info!("Loading audit data from database...");
    let run = storage.get_latest_run()?.ok_or(OutputError::NoRuns)?;
    let session = storage.load_session(run.id)?;

    let (csv_path, html_path) = export_session(
        &session,
        Path::new(&config.output.directory),
        ReportOptions::from_config(&config.analysis),
    )
    .context("failed to write reports")?;

    println!("✓ CSV report: {}", csv_path.display());
    println!("✓ HTML report: {}", html_path.display());

    Ok(())
}

/// Handles the main audit: crawl, persist, export, summarize
async fn handle_audit(config: Config, config_hash: &str) -> anyhow::Result<()> {
    let db_path = PathBuf::from(&config.output.database_path);
    let report_dir = PathBuf::from(&config.output.directory);
    let options = ReportOptions::from_config(&config.analysis);

    // Open the database first so a bad path fails before any fetching
    let mut storage = open_storage(&db_path).context("failed to open database")?;

    let session = match run_audit(config).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Audit failed: {}", e);
            return Err(e.into());
        }
    };

    let run_id = storage
        .persist_session(&session, config_hash, options.sitewide_keywords)
        .context("failed to store audit results")?;
    tracing::info!("Stored as run #{} in {}", run_id, db_path.display());

    let (csv_path, html_path) =
        export_session(&session, &report_dir, options).context("failed to write reports")?;

    print_statistics(&SessionStatistics::from_session(
        &session,
        options.sitewide_keywords,
    ));
    println!();
    println!("✓ CSV report: {}", csv_path.display());
    println!("✓ HTML report: {}", html_path.display());

    Ok(())
}
