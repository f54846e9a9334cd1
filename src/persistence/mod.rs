//! Persistence layer modules.

use chrono::{DateTime, SecondsFormat, Utc};

pub mod db;
pub mod schema;
pub mod task_repo;

/// Re-export the database pool type for convenience.
pub use sqlx::SqlitePool;

/// Canonical stored form of a timestamp: RFC 3339, whole seconds, `Z` suffix.
///
/// Lexicographic order of this form is chronological order, and its first
/// ten characters are the UTC calendar date.
#[must_use]
pub fn to_db_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
