//! `SQLite` schema bootstrap logic.
//!
//! All definitions use `IF NOT EXISTS`, so this runs on every startup.

use sqlx::SqlitePool;

use crate::Result;

/// Apply the `task` table and its indexes to the connected database.
///
/// Timestamps are RFC 3339 UTC text (`YYYY-MM-DDTHH:MM:SSZ`); the first ten
/// characters are the calendar date used for trend bucketing.
///
/// # Errors
///
/// Returns `AppError::Db` if any DDL statement fails.
pub async fn bootstrap_schema(pool: &SqlitePool) -> Result<()> {
    let ddl = r"
CREATE TABLE IF NOT EXISTS task (
    task_id         TEXT PRIMARY KEY NOT NULL,
    title           TEXT NOT NULL,
    assignee        TEXT NOT NULL,
    status          TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    completed_at    TEXT,
    project         TEXT NOT NULL DEFAULT 'General',
    priority        TEXT NOT NULL DEFAULT 'Medium',
    comments        TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_task_status ON task(status);
CREATE INDEX IF NOT EXISTS idx_task_assignee ON task(assignee);
CREATE INDEX IF NOT EXISTS idx_task_project ON task(project);
CREATE INDEX IF NOT EXISTS idx_task_created ON task(created_at);
CREATE INDEX IF NOT EXISTS idx_task_completed ON task(completed_at);
";

    sqlx::raw_sql(ddl).execute(pool).await?;
    Ok(())
}
