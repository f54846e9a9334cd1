#![forbid(unsafe_code)]

//! `pulsevo-ctl`: local operator CLI for `pulsevo`.
//!
//! Opens the same task store as the server and prints the JSON shape of the
//! matching API endpoint. Useful for scripted imports and quick checks
//! without the HTTP surface.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde_json::json;

use pulsevo::config::GlobalConfig;
use pulsevo::ingest::upload_store::UploadStore;
use pulsevo::ingest::Ingestor;
use pulsevo::persistence::db;
use pulsevo::persistence::task_repo::TaskRepo;
use pulsevo::stats::Aggregator;
use pulsevo::{AppError, Result};

#[derive(Debug, Parser)]
#[command(
    name = "pulsevo-ctl",
    about = "Local CLI for the pulsevo task store",
    version,
    long_about = None
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import a CSV or Excel file.
    Import {
        /// Spreadsheet to ingest.
        file: PathBuf,
    },

    /// Print the headline counters.
    Stats,

    /// Print the seven-day created/completed series.
    Trends,

    /// Print per-assignee counts.
    Team,

    /// Print per-project counts.
    Projects,

    /// Print the next-week completion forecast.
    Predict,

    /// Print the summary for one assignee.
    User {
        /// Assignee name (case-insensitive).
        name: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("Error: failed to build runtime: {err}");
            std::process::exit(1);
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
        }
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<serde_json::Value> {
    let config = GlobalConfig::load_from_path(&cli.config)?;
    let db = Arc::new(db::connect(&config.db_path()).await?);
    let stats = Aggregator::new(Arc::clone(&db));
    let now = Utc::now();

    let value = match cli.command {
        Command::Import { file } => {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let data = tokio::fs::read(&file)
                .await
                .map_err(|err| AppError::Io(format!("cannot read {}: {err}", file.display())))?;
            let ingestor = Ingestor::new(
                TaskRepo::new(Arc::clone(&db)),
                UploadStore::new(config.uploads_dir())?,
            );
            to_json(&ingestor.ingest(&name, Bytes::from(data)).await?)?
        }
        Command::Stats => to_json(&stats.summary(now).await?)?,
        Command::Trends => to_json(&stats.trends(now).await?)?,
        Command::Team => json!({ "teams": stats.team().await? }),
        Command::Projects => json!({ "projects": stats.projects().await? }),
        Command::Predict => to_json(&stats.forecast(now).await?)?,
        Command::User { name } => to_json(&stats.user_summary(&name).await?)?,
    };

    db.close().await;
    Ok(value)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|err| AppError::Io(format!("encode failed: {err}")))
}
