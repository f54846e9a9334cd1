//! Task record model and its value vocabularies.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Default project for rows that leave the column blank.
pub const DEFAULT_PROJECT: &str = "General";

/// Default priority for rows that leave the column blank.
pub const DEFAULT_PRIORITY: &str = "Medium";

/// Default assignee for rows that leave the column blank.
pub const DEFAULT_ASSIGNEE: &str = "Unknown";

/// Workflow status of a task.
///
/// Values outside the four known states are kept verbatim in
/// [`TaskStatus::Other`] so that spreadsheet vocabularies survive ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Not started.
    Open,
    /// Being worked on.
    InProgress,
    /// Finished.
    Completed,
    /// Waiting on something external.
    Blocked,
    /// Any other non-empty label.
    Other(String),
}

impl TaskStatus {
    /// The four statuses the dashboard counts, in display order.
    pub const KNOWN: [Self; 4] = [Self::Open, Self::InProgress, Self::Completed, Self::Blocked];

    /// Normalize a raw spreadsheet value.
    ///
    /// Matching ignores case, surrounding whitespace, and runs of inner
    /// whitespace; blank input is `Open`.
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        let trimmed = raw.trim();
        let folded = trimmed
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        match folded.as_str() {
            "" | "open" => Self::Open,
            "in progress" => Self::InProgress,
            "completed" => Self::Completed,
            "blocked" => Self::Blocked,
            _ => Self::Other(trimmed.to_owned()),
        }
    }

    /// Stored text form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Blocked => "Blocked",
            Self::Other(label) => label,
        }
    }

    /// Parse the stored text form. Exact match only; anything else is `Other`.
    #[must_use]
    pub fn from_stored(value: &str) -> Self {
        match value {
            "Open" => Self::Open,
            "In Progress" => Self::InProgress,
            "Completed" => Self::Completed,
            "Blocked" => Self::Blocked,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TaskStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_stored(&raw))
    }
}

/// A single tracked work item, keyed by `task_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TaskRecord {
    /// Unique identifier and upsert key.
    pub task_id: String,
    /// Display label.
    pub title: String,
    /// Free-text owner name.
    pub assignee: String,
    /// Workflow status.
    pub status: TaskStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Completion timestamp; independent of `status`.
    pub completed_at: Option<DateTime<Utc>>,
    /// Project grouping.
    pub project: String,
    /// Title-cased priority label.
    pub priority: String,
    /// Free-text notes.
    pub comments: String,
}

impl TaskRecord {
    /// Construct a record with default project, priority, and no comments.
    #[must_use]
    pub fn new(
        task_id: impl Into<String>,
        title: impl Into<String>,
        assignee: impl Into<String>,
        status: TaskStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            title: title.into(),
            assignee: assignee.into(),
            status,
            created_at,
            completed_at: None,
            project: DEFAULT_PROJECT.into(),
            priority: DEFAULT_PRIORITY.into(),
            comments: String::new(),
        }
    }

    /// Set the completion timestamp.
    #[must_use]
    pub fn completed(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }

    /// Set the project.
    #[must_use]
    pub fn in_project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }
}

impl Display for TaskRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} • {}", self.task_id, self.title)
    }
}
