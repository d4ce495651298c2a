#![forbid(unsafe_code)]

//! `posting-watch`: municipal job-postings notifier binary.
//!
//! Loads configuration and secrets, runs one scrape-diff-notify pass, and
//! exits non-zero when the run fails or the notification is not confirmed.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use posting_watch::browser::webdriver::WebDriverLauncher;
use posting_watch::config::GlobalConfig;
use posting_watch::notify::postmark::PostmarkTransport;
use posting_watch::orchestrator::{Orchestrator, RunOutcome};
use posting_watch::persistence::sqlite_store::SqliteStoreConnector;
use posting_watch::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "posting-watch", about = "Notify new job postings from a municipal registry", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Scrape and diff, but neither send nor persist.
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("posting-watch bootstrap");

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Io(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    config.load_credentials().await?;
    let config = Arc::new(config);
    info!("configuration loaded");

    // ── Build collaborators ─────────────────────────────
    let browser = Arc::new(WebDriverLauncher::new(&config.browser)?);
    let store = Arc::new(SqliteStoreConnector::new(&config.store));
    let transport = Arc::new(PostmarkTransport::new(&config.email)?);

    let orchestrator = Orchestrator::new(Arc::clone(&config), browser, store, transport)
        .with_dry_run(args.dry_run);

    // ── Run once ────────────────────────────────────────
    let report = orchestrator.run().await.map_err(|err| {
        error!(%err, "run failed");
        err
    })?;

    info!(
        run_id = %report.run_id,
        pages = report.pages,
        scraped = report.scraped,
        "posting-watch finished"
    );

    match report.outcome {
        RunOutcome::DeliveryFailed { reason, .. } => Err(AppError::Transport(reason)),
        _ => Ok(()),
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
