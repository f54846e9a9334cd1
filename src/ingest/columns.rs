//! Header normalization and the column index used for typed row access.

use std::collections::{BTreeSet, HashMap};

use crate::{AppError, Result};

/// Header synonyms, keyed by the folded header text.
const COLUMN_SYNONYMS: [(&str, &str); 9] = [
    ("task id", "task_id"),
    ("title", "title"),
    ("assignee", "assignee"),
    ("status", "status"),
    ("created at", "created_at"),
    ("completed at", "completed_at"),
    ("project", "project"),
    ("priority", "priority"),
    ("comments", "comments"),
];

/// A column every upload must carry after normalization.
pub const REQUIRED_COLUMNS: [Field; 5] = [
    Field::TaskId,
    Field::Title,
    Field::Assignee,
    Field::Status,
    Field::CreatedAt,
];

/// A task record column recognised in uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    /// `task_id`
    TaskId,
    /// `title`
    Title,
    /// `assignee`
    Assignee,
    /// `status`
    Status,
    /// `created_at`
    CreatedAt,
    /// `completed_at`
    CompletedAt,
    /// `project`
    Project,
    /// `priority`
    Priority,
    /// `comments`
    Comments,
}

impl Field {
    const ALL: [Self; 9] = [
        Self::TaskId,
        Self::Title,
        Self::Assignee,
        Self::Status,
        Self::CreatedAt,
        Self::CompletedAt,
        Self::Project,
        Self::Priority,
        Self::Comments,
    ];

    /// Canonical column name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::TaskId => "task_id",
            Self::Title => "title",
            Self::Assignee => "assignee",
            Self::Status => "status",
            Self::CreatedAt => "created_at",
            Self::CompletedAt => "completed_at",
            Self::Project => "project",
            Self::Priority => "priority",
            Self::Comments => "comments",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

/// Fold a raw header: drop a UTF-8 BOM, trim, lower-case, then apply the
/// synonym table. Unknown headers pass through folded.
#[must_use]
pub fn normalize_header(raw: &str) -> String {
    let folded = raw.trim_start_matches('\u{feff}').trim().to_lowercase();
    COLUMN_SYNONYMS
        .iter()
        .find(|(synonym, _)| *synonym == folded)
        .map_or(folded, |(_, canonical)| (*canonical).to_owned())
}

/// Position of each recognised field within a row.
#[derive(Debug, Clone, Default)]
pub struct ColumnIndex {
    positions: HashMap<Field, usize>,
}

impl ColumnIndex {
    /// Build the index from a header row, requiring every [`REQUIRED_COLUMNS`]
    /// entry. The first occurrence of a repeated column wins.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Schema` with the sorted missing names.
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Result<Self> {
        let mut positions = HashMap::new();
        for (idx, header) in headers.iter().enumerate() {
            if let Some(field) = Field::from_name(&normalize_header(header.as_ref())) {
                positions.entry(field).or_insert(idx);
            }
        }

        let missing: BTreeSet<&str> = REQUIRED_COLUMNS
            .iter()
            .filter(|f| !positions.contains_key(f))
            .map(|f| f.name())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::Schema(
                missing.into_iter().map(str::to_owned).collect(),
            ));
        }

        Ok(Self { positions })
    }

    /// Cell text for `field`, or `None` when the column is absent or the row
    /// is short.
    #[must_use]
    pub fn get<'r>(&self, row: &'r [String], field: Field) -> Option<&'r str> {
        self.positions
            .get(&field)
            .and_then(|idx| row.get(*idx))
            .map(String::as_str)
    }
}
