//! Per-row transform from spreadsheet text to a typed [`TaskRecord`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::models::task::{
    TaskRecord, TaskStatus, DEFAULT_ASSIGNEE, DEFAULT_PRIORITY, DEFAULT_PROJECT,
};

use super::columns::{ColumnIndex, Field};

const TITLE_MAX: usize = 200;
const ASSIGNEE_MAX: usize = 100;
const PROJECT_MAX: usize = 100;
const PRIORITY_MAX: usize = 10;

const DATETIME_FORMATS: [&str; 12] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %I:%M:%S %p",
    "%d %b %Y %H:%M",
    "%d %B %Y %H:%M",
];

const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Why a row could not become a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowRejection {
    /// Every cell was blank; skipped without a report entry.
    Blank,
    /// Row is unusable for the stated reason.
    Invalid(String),
}

/// Parse flexible date/time text. Offsets are honoured; naive values are UTC.
/// Blank or unrecognised text yields `None`.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(naive) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        return Some(naive.and_utc());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Trim and keep at most `max` characters.
#[must_use]
pub fn cap(value: &str, max: usize) -> String {
    value.trim().chars().take(max).collect()
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
#[must_use]
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_alpha = false;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

fn or_default(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_owned()
    } else {
        value
    }
}

/// Turn one data row into a record.
///
/// Anomalies degrade to defaults: unknown statuses pass through, blank or
/// unparseable `completed_at` becomes `None`. Only a missing `task_id` or an
/// unusable `created_at` rejects the row.
///
/// # Errors
///
/// Returns [`RowRejection`] when the row cannot be stored.
pub fn normalize_row(index: &ColumnIndex, row: &[String]) -> Result<TaskRecord, RowRejection> {
    if row.iter().all(|cell| cell.trim().is_empty()) {
        return Err(RowRejection::Blank);
    }
    let cell = |field: Field| index.get(row, field).unwrap_or("");

    let task_id = cell(Field::TaskId).trim().to_owned();
    if task_id.is_empty() {
        return Err(RowRejection::Invalid("missing task_id".into()));
    }

    let raw_created = cell(Field::CreatedAt);
    let created_at = parse_timestamp(raw_created).ok_or_else(|| {
        if raw_created.trim().is_empty() {
            RowRejection::Invalid("missing created_at".into())
        } else {
            RowRejection::Invalid(format!("unparseable created_at {:?}", raw_created.trim()))
        }
    })?;

    Ok(TaskRecord {
        task_id,
        title: cap(cell(Field::Title), TITLE_MAX),
        assignee: or_default(cap(cell(Field::Assignee), ASSIGNEE_MAX), DEFAULT_ASSIGNEE),
        status: TaskStatus::normalize(cell(Field::Status)),
        created_at,
        completed_at: parse_timestamp(cell(Field::CompletedAt)),
        project: or_default(cap(cell(Field::Project), PROJECT_MAX), DEFAULT_PROJECT),
        priority: or_default(
            cap(&title_case(cell(Field::Priority).trim()), PRIORITY_MAX),
            DEFAULT_PRIORITY,
        ),
        comments: cell(Field::Comments).trim().to_owned(),
    })
}
