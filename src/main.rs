#![forbid(unsafe_code)]

//! `pulsevo`: task dashboard server binary.
//!
//! Bootstraps configuration, opens the task store, wires the AI relay and
//! serves the dashboard and JSON API until a shutdown signal arrives.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use pulsevo::config::GlobalConfig;
use pulsevo::insight::gemini::GeminiClient;
use pulsevo::insight::{DisabledGenerator, InsightService, TextGenerator};
use pulsevo::persistence::db;
use pulsevo::web::{self, AppState};
use pulsevo::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "pulsevo", about = "Task tracking dashboard server", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the configured HTTP port.
    #[arg(long)]
    port: Option<u16>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("pulsevo server bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    if let Some(port) = args.port {
        config.http_port = port;
    }
    config.load_credentials().await?;
    let config = Arc::new(config);
    info!(data_dir = %config.data_dir.display(), "configuration loaded");

    // ── Initialize database ─────────────────────────────
    let db = Arc::new(db::connect(&config.db_path()).await?);
    info!("database connected");

    // ── Build shared application state ──────────────────
    let insights = InsightService::new(build_generator(&config)?);
    let state = Arc::new(AppState::new(Arc::clone(&config), db, insights)?);

    // ── Serve ───────────────────────────────────────────
    let ct = CancellationToken::new();
    let http_ct = ct.clone();
    let http_handle = tokio::spawn(async move {
        if let Err(err) = web::serve(state, http_ct).await {
            error!(%err, "http server failed");
        }
    });

    info!("pulsevo ready");

    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    if let Err(err) = http_handle.await {
        error!(%err, "http task join failed");
    }
    info!("pulsevo shut down");

    Ok(())
}

fn build_generator(config: &GlobalConfig) -> Result<Arc<dyn TextGenerator>> {
    if !config.ai.enabled {
        info!("AI insights disabled by configuration");
        return Ok(Arc::new(DisabledGenerator::new("AI insights are disabled")));
    }
    match config.ai.api_key.as_deref() {
        Some(key) => {
            info!(model = %config.ai.model, "AI insights enabled");
            Ok(Arc::new(GeminiClient::new(&config.ai, key)?))
        }
        None => {
            warn!("AI insights have no API key configured");
            Ok(Arc::new(DisabledGenerator::new("no API key configured")))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            error!(%err, "ctrl-c signal handler failed");
        }
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
