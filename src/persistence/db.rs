//! `SQLite` connection pool and schema bootstrap.

use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::{AppError, Result};

use super::schema;

/// How long a writer waits for another writer's transaction to finish.
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Alias for the shared `SQLite` pool.
pub type Database = SqlitePool;

/// Open (creating if missing) the database file at `path` and apply the schema.
///
/// # Errors
///
/// Returns `AppError::Db` if the directory, connection, or schema step fails.
pub async fn connect(path: &Path) -> Result<Database> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| AppError::Db(format!("failed to create db dir: {err}")))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    schema::bootstrap_schema(&pool).await?;
    Ok(pool)
}

/// Open a private in-memory database with the schema applied.
///
/// The pool is pinned to a single connection: every `SQLite` memory
/// connection is its own database.
///
/// # Errors
///
/// Returns `AppError::Db` if the connection or schema step fails.
pub async fn connect_memory() -> Result<Database> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    schema::bootstrap_schema(&pool).await?;
    Ok(pool)
}
