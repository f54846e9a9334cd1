//! Aggregation result shapes served by the JSON API.

use serde::{Deserialize, Serialize};

/// Point-in-time counts across the whole store (`/api/stats/`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatsSummary {
    /// Number of stored records.
    pub total: i64,
    /// Records with status `Open`.
    pub open: i64,
    /// Records with status `In Progress`.
    pub in_progress: i64,
    /// Records with status `Completed`.
    pub completed: i64,
    /// Records with status `Blocked`.
    pub blocked: i64,
    /// Completed records whose completion falls on today's date.
    pub closed_today: i64,
    /// Completed records finished within the trailing hour.
    pub closed_last_hour: i64,
    /// Completed share of all records, percent, one decimal.
    pub completion_rate: f64,
    /// Reference instant used for the query, RFC 3339.
    pub server_time: String,
}

/// Seven-day created/completed series (`/api/trends/`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrendSeries {
    /// ISO dates, oldest first, today last.
    pub labels: Vec<String>,
    /// Records created on each day.
    pub created: Vec<i64>,
    /// Records completed on each day.
    pub completed: Vec<i64>,
}

/// Per-assignee status counts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct TeamRow {
    /// Assignee name, exactly as stored.
    pub assignee: String,
    /// Open records.
    pub open: i64,
    /// In-progress records.
    pub in_progress: i64,
    /// Completed records.
    pub completed: i64,
}

/// Per-project counts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct ProjectRow {
    /// Project name, exactly as stored.
    pub project: String,
    /// All records in the project.
    pub total: i64,
    /// Open records in the project.
    pub open: i64,
}

/// Naive completion forecast (`/api/predict/`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Forecast {
    /// Completed records in the trailing seven days.
    pub recent_completions: i64,
    /// `recent_completions * 1.1`, rounded.
    pub forecast_next_week: i64,
}

/// Status counts restricted to one assignee, matched case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    /// Name as requested.
    pub user: String,
    /// Records assigned to the user.
    pub total: i64,
    /// Open records.
    pub open: i64,
    /// In-progress records.
    pub in_progress: i64,
    /// Completed records.
    pub completed: i64,
    /// Blocked records.
    pub blocked: i64,
    /// Completed share, percent, one decimal.
    pub completion_rate: f64,
}

/// Round `100 * completed / total` to one decimal; zero when `total` is zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn completion_rate(completed: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let pct = completed as f64 / total as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}
