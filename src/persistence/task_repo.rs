//! Task record repository for `SQLite` persistence.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite};

use crate::models::task::{TaskRecord, TaskStatus};
use crate::{AppError, Result};

use super::db::Database;
use super::to_db_timestamp;

/// Default cap on rows returned by [`TaskRepo::list`].
pub const DEFAULT_LIST_LIMIT: i64 = 500;

/// Repository wrapper around `SQLite` for task records.
#[derive(Clone)]
pub struct TaskRepo {
    db: Arc<Database>,
}

/// Whether an upsert created a new row or overwrote an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// First sighting of the `task_id`.
    Inserted,
    /// Existing row overwritten.
    Updated,
}

/// Counts produced by [`TaskRepo::upsert_batch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Rows created.
    pub inserted: usize,
    /// Rows overwritten.
    pub updated: usize,
}

/// Filter for [`TaskRepo::list`]. Empty fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Case-insensitive substring over id, title, assignee, and project.
    pub search: Option<String>,
    /// Exact stored status.
    pub status: Option<String>,
    /// Exact project.
    pub project: Option<String>,
    /// Exact priority.
    pub priority: Option<String>,
    /// Row cap; [`DEFAULT_LIST_LIMIT`] when unset.
    pub limit: Option<i64>,
}

/// Columns whose distinct values feed the task view filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetColumn {
    /// `status`
    Status,
    /// `project`
    Project,
    /// `priority`
    Priority,
}

impl FacetColumn {
    fn column(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Project => "project",
            Self::Priority => "priority",
        }
    }
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct TaskRow {
    task_id: String,
    title: String,
    assignee: String,
    status: String,
    created_at: String,
    completed_at: Option<String>,
    project: String,
    priority: String,
    comments: String,
}

impl TaskRow {
    fn into_task(self) -> Result<TaskRecord> {
        let created_at = parse_stored(&self.created_at, "created_at")?;
        let completed_at = self
            .completed_at
            .as_deref()
            .map(|s| parse_stored(s, "completed_at"))
            .transpose()?;

        Ok(TaskRecord {
            task_id: self.task_id,
            title: self.title,
            assignee: self.assignee,
            status: TaskStatus::from_stored(&self.status),
            created_at,
            completed_at,
            project: self.project,
            priority: self.priority,
            comments: self.comments,
        })
    }
}

fn parse_stored(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Db(format!("invalid {field}: {e}")))
}

const SELECT_COLUMNS: &str = "SELECT task_id, title, assignee, status, created_at, completed_at, \
     project, priority, comments FROM task";

const INSERT_SQL: &str = "INSERT INTO task \
     (task_id, title, assignee, status, created_at, completed_at, project, priority, comments) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
     ON CONFLICT(task_id) DO NOTHING";

const UPDATE_SQL: &str = "UPDATE task SET \
        title = ?2, assignee = ?3, status = ?4, created_at = ?5, completed_at = ?6, \
        project = ?7, priority = ?8, comments = ?9 \
     WHERE task_id = ?1";

/// Opening statement for write transactions. Taking the write lock up front
/// makes concurrent writers wait on the busy timeout instead of failing.
const BEGIN_WRITE: &str = "BEGIN IMMEDIATE";

/// Escape `LIKE` wildcards so user search text matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

impl TaskRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert or overwrite a single record keyed by `task_id`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the statement fails.
    pub async fn upsert(&self, task: &TaskRecord) -> Result<UpsertOutcome> {
        let mut tx = self.db.begin_with(BEGIN_WRITE).await?;
        let outcome = upsert_in(&mut tx, task).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    /// Upsert every record inside one transaction.
    ///
    /// Later entries with a repeated `task_id` overwrite earlier ones.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if any statement fails; nothing is committed then.
    pub async fn upsert_batch(&self, tasks: &[TaskRecord]) -> Result<BatchOutcome> {
        let mut outcome = BatchOutcome::default();
        let mut tx = self.db.begin_with(BEGIN_WRITE).await?;
        for task in tasks {
            match upsert_in(&mut tx, task).await? {
                UpsertOutcome::Inserted => outcome.inserted += 1,
                UpsertOutcome::Updated => outcome.updated += 1,
            }
        }
        tx.commit().await?;
        Ok(outcome)
    }

    /// Retrieve a record by `task_id`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no such record exists.
    pub async fn get(&self, task_id: &str) -> Result<TaskRecord> {
        let row: Option<TaskRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE task_id = ?1"))
            .bind(task_id)
            .fetch_optional(self.db.as_ref())
            .await?;
        row.ok_or_else(|| AppError::NotFound(format!("task {task_id}")))?
            .into_task()
    }

    /// Number of stored records.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM task")
            .fetch_one(self.db.as_ref())
            .await?;
        Ok(count)
    }

    /// List records matching `filter`, newest `created_at` first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list(&self, filter: &TaskFilter) -> Result<Vec<TaskRecord>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_COLUMNS);
        qb.push(" WHERE 1 = 1");

        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = like_pattern(term);
            qb.push(" AND (");
            for (i, column) in ["task_id", "title", "assignee", "project"].iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push(*column)
                    .push(" LIKE ")
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\'");
            }
            qb.push(")");
        }
        for (column, value) in [
            ("status", &filter.status),
            ("project", &filter.project),
            ("priority", &filter.priority),
        ] {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                qb.push(" AND ")
                    .push(column)
                    .push(" = ")
                    .push_bind(value.to_owned());
            }
        }

        qb.push(" ORDER BY created_at DESC, task_id ASC LIMIT ")
            .push_bind(filter.limit.unwrap_or(DEFAULT_LIST_LIMIT).max(0));

        let rows: Vec<TaskRow> = qb.build_query_as().fetch_all(self.db.as_ref()).await?;
        rows.into_iter().map(TaskRow::into_task).collect()
    }

    /// Distinct non-empty values of `column`, sorted.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn distinct(&self, column: FacetColumn) -> Result<Vec<String>> {
        // `column()` yields compile-time literals only.
        let col = column.column();
        let values: Vec<String> = sqlx::query_scalar(&format!(
            "SELECT DISTINCT {col} FROM task WHERE {col} <> '' ORDER BY {col}"
        ))
        .fetch_all(self.db.as_ref())
        .await?;
        Ok(values)
    }
}

/// Insert `task`, or overwrite the existing row when the insert is a no-op.
async fn upsert_in(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    task: &TaskRecord,
) -> Result<UpsertOutcome> {
    if bind_task(sqlx::query(INSERT_SQL), task)
        .execute(&mut **tx)
        .await?
        .rows_affected()
        > 0
    {
        return Ok(UpsertOutcome::Inserted);
    }

    bind_task(sqlx::query(UPDATE_SQL), task)
        .execute(&mut **tx)
        .await?;
    Ok(UpsertOutcome::Updated)
}

fn bind_task<'q>(
    query: sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    task: &'q TaskRecord,
) -> sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    query
        .bind(&task.task_id)
        .bind(&task.title)
        .bind(&task.assignee)
        .bind(task.status.as_str())
        .bind(to_db_timestamp(task.created_at))
        .bind(task.completed_at.map(to_db_timestamp))
        .bind(&task.project)
        .bind(&task.priority)
        .bind(&task.comments)
}
