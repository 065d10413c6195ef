//! Yad2 listing watcher — binary entrypoint.
//! Loads configuration, opens the durable store, and either runs one polling
//! cycle (`--once`) or polls forever on the configured interval.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use yad2_watcher::config::Config;
use yad2_watcher::notify::telegram::TelegramNotifier;
use yad2_watcher::pipeline::Pipeline;
use yad2_watcher::scheduler;
use yad2_watcher::source::HttpSourceClient;
use yad2_watcher::store::sqlite::SqliteStore;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("yad2_watcher=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when variables come from the real env.
    let _ = dotenvy::dotenv();
    init_tracing();

    let once = std::env::args().any(|a| a == "--once");
    match run(once).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = ?e, "watcher failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(once: bool) -> Result<()> {
    let cfg = Config::load()?;
    if cfg.subscribers.is_empty() {
        warn!("no subscribers configured; new listings will be recorded but not announced");
    }
    info!(
        sources = cfg.sources.len(),
        subscribers = cfg.subscribers.len(),
        interval_secs = cfg.interval.as_secs(),
        "starting watcher"
    );

    let store = Arc::new(SqliteStore::open(&cfg.db_path).await?);
    let client = Arc::new(HttpSourceClient::new(cfg.api_url.clone())?);
    let notifier = Arc::new(TelegramNotifier::new(cfg.bot_token.clone()));
    let pipeline = Pipeline::new(client, store, notifier);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            let _ = shutdown_tx.send(true);
        }
    });

    if once {
        let report = pipeline
            .run_cycle(&cfg.sources, &cfg.subscribers, &shutdown_rx)
            .await?;
        info!(new = report.new_listings, sent = report.notifications_sent, "single cycle done");
        return Ok(());
    }

    scheduler::run_forever(
        &pipeline,
        &cfg.sources,
        &cfg.subscribers,
        cfg.interval,
        shutdown_rx,
    )
    .await;
    Ok(())
}
