//! Aggregation engine: read-only summaries over the task table.
//!
//! Every query takes the reference instant `now` explicitly. Calendar days
//! are UTC dates, taken as the first ten characters of the stored RFC 3339
//! timestamps.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::models::stats::{
    completion_rate, Forecast, ProjectRow, StatsSummary, TeamRow, TrendSeries, UserSummary,
};
use crate::persistence::db::Database;
use crate::persistence::to_db_timestamp;
use crate::Result;

/// Length of the trend and forecast window, today included.
pub const TREND_DAYS: u64 = 7;

/// Multiplier applied to recent completions for the naive forecast.
pub const FORECAST_FACTOR: f64 = 1.1;

/// Read-only query surface over the task table.
#[derive(Clone)]
pub struct Aggregator {
    db: Arc<Database>,
}

#[derive(sqlx::FromRow)]
struct StatusCounts {
    total: i64,
    open: i64,
    in_progress: i64,
    completed: i64,
    blocked: i64,
}

#[derive(sqlx::FromRow)]
struct DayCount {
    day: String,
    n: i64,
}

const STATUS_COUNT_COLUMNS: &str = "COUNT(*) AS total, \
     COALESCE(SUM(status = 'Open'), 0) AS open, \
     COALESCE(SUM(status = 'In Progress'), 0) AS in_progress, \
     COALESCE(SUM(status = 'Completed'), 0) AS completed, \
     COALESCE(SUM(status = 'Blocked'), 0) AS blocked";

/// The trailing window of calendar days ending at `now`'s date, oldest first.
#[must_use]
pub fn trailing_days(now: DateTime<Utc>) -> Vec<NaiveDate> {
    let today = now.date_naive();
    (0..TREND_DAYS)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back)))
        .collect()
}

/// `round(recent * 1.1)`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn forecast_from(recent_completions: i64) -> Forecast {
    Forecast {
        recent_completions,
        forecast_next_week: (recent_completions as f64 * FORECAST_FACTOR).round() as i64,
    }
}

fn iso(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

impl Aggregator {
    /// Create a new aggregator over `db`.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store-wide counts, today's and last hour's closures, and completion rate.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if a query fails.
    pub async fn summary(&self, now: DateTime<Utc>) -> Result<StatsSummary> {
        let counts: StatusCounts =
            sqlx::query_as(&format!("SELECT {STATUS_COUNT_COLUMNS} FROM task"))
                .fetch_one(self.db.as_ref())
                .await?;

        let (closed_today, closed_last_hour): (i64, i64) = sqlx::query_as(
            "SELECT \
               COALESCE(SUM(substr(completed_at, 1, 10) = ?1), 0), \
               COALESCE(SUM(completed_at >= ?2), 0) \
             FROM task WHERE status = 'Completed' AND completed_at IS NOT NULL",
        )
        .bind(iso(now.date_naive()))
        .bind(to_db_timestamp(now - chrono::Duration::hours(1)))
        .fetch_one(self.db.as_ref())
        .await?;

        Ok(StatsSummary {
            total: counts.total,
            open: counts.open,
            in_progress: counts.in_progress,
            completed: counts.completed,
            blocked: counts.blocked,
            closed_today,
            closed_last_hour,
            completion_rate: completion_rate(counts.completed, counts.total),
            server_time: now.to_rfc3339(),
        })
    }

    /// Created and completed counts for each of the trailing seven days.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if a query fails.
    pub async fn trends(&self, now: DateTime<Utc>) -> Result<TrendSeries> {
        let days = trailing_days(now);
        let labels: Vec<String> = days.iter().copied().map(iso).collect();
        let (first, last) = match (labels.first(), labels.last()) {
            (Some(first), Some(last)) => (first.clone(), last.clone()),
            _ => {
                return Ok(TrendSeries {
                    labels,
                    created: Vec::new(),
                    completed: Vec::new(),
                })
            }
        };

        let created: Vec<DayCount> = sqlx::query_as(
            "SELECT substr(created_at, 1, 10) AS day, COUNT(*) AS n FROM task \
             WHERE substr(created_at, 1, 10) BETWEEN ?1 AND ?2 GROUP BY day",
        )
        .bind(&first)
        .bind(&last)
        .fetch_all(self.db.as_ref())
        .await?;

        let completed: Vec<DayCount> = sqlx::query_as(
            "SELECT substr(completed_at, 1, 10) AS day, COUNT(*) AS n FROM task \
             WHERE status = 'Completed' AND completed_at IS NOT NULL \
               AND substr(completed_at, 1, 10) BETWEEN ?1 AND ?2 GROUP BY day",
        )
        .bind(&first)
        .bind(&last)
        .fetch_all(self.db.as_ref())
        .await?;

        let created: HashMap<String, i64> = created.into_iter().map(|r| (r.day, r.n)).collect();
        let completed: HashMap<String, i64> =
            completed.into_iter().map(|r| (r.day, r.n)).collect();

        Ok(TrendSeries {
            created: labels.iter().map(|d| created.get(d).copied().unwrap_or(0)).collect(),
            completed: labels.iter().map(|d| completed.get(d).copied().unwrap_or(0)).collect(),
            labels,
        })
    }

    /// One row per exact assignee value, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn team(&self) -> Result<Vec<TeamRow>> {
        let rows: Vec<TeamRow> = sqlx::query_as(
            "SELECT assignee, \
               COALESCE(SUM(status = 'Open'), 0) AS open, \
               COALESCE(SUM(status = 'In Progress'), 0) AS in_progress, \
               COALESCE(SUM(status = 'Completed'), 0) AS completed \
             FROM task GROUP BY assignee ORDER BY assignee",
        )
        .fetch_all(self.db.as_ref())
        .await?;
        Ok(rows)
    }

    /// One row per project with total and open counts, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn projects(&self) -> Result<Vec<ProjectRow>> {
        let rows: Vec<ProjectRow> = sqlx::query_as(
            "SELECT project, COUNT(*) AS total, \
               COALESCE(SUM(status = 'Open'), 0) AS open \
             FROM task GROUP BY project ORDER BY project",
        )
        .fetch_all(self.db.as_ref())
        .await?;
        Ok(rows)
    }

    /// Completions in the trailing seven days, projected forward by 1.1×.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn forecast(&self, now: DateTime<Utc>) -> Result<Forecast> {
        let days = trailing_days(now);
        let (Some(first), Some(last)) = (days.first(), days.last()) else {
            return Ok(forecast_from(0));
        };
        let recent: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM task \
             WHERE status = 'Completed' AND completed_at IS NOT NULL \
               AND substr(completed_at, 1, 10) BETWEEN ?1 AND ?2",
        )
        .bind(iso(*first))
        .bind(iso(*last))
        .fetch_one(self.db.as_ref())
        .await?;
        Ok(forecast_from(recent))
    }

    /// Status counts for records whose assignee matches `user` ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn user_summary(&self, user: &str) -> Result<UserSummary> {
        let name = user.trim();
        let counts: StatusCounts = sqlx::query_as(&format!(
            "SELECT {STATUS_COUNT_COLUMNS} FROM task WHERE assignee = ?1 COLLATE NOCASE"
        ))
        .bind(name)
        .fetch_one(self.db.as_ref())
        .await?;

        Ok(UserSummary {
            user: name.to_owned(),
            total: counts.total,
            open: counts.open,
            in_progress: counts.in_progress,
            completed: counts.completed,
            blocked: counts.blocked,
            completion_rate: completion_rate(counts.completed, counts.total),
        })
    }
}
