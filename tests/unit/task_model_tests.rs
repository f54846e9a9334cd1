use chrono::{TimeZone, Utc};
use pulsevo::models::stats::completion_rate;
use pulsevo::models::task::{TaskRecord, TaskStatus, DEFAULT_PRIORITY, DEFAULT_PROJECT};

#[test]
fn status_normalization_folds_case_and_whitespace() {
    assert_eq!(TaskStatus::normalize("  BLOCKED "), TaskStatus::Blocked);
    assert_eq!(TaskStatus::normalize("in progress"), TaskStatus::InProgress);
    assert_eq!(TaskStatus::normalize("In   Progress"), TaskStatus::InProgress);
    assert_eq!(TaskStatus::normalize("COMPLETED"), TaskStatus::Completed);
    assert_eq!(TaskStatus::normalize("open"), TaskStatus::Open);
}

#[test]
fn blank_status_defaults_to_open() {
    assert_eq!(TaskStatus::normalize(""), TaskStatus::Open);
    assert_eq!(TaskStatus::normalize("   "), TaskStatus::Open);
}

#[test]
fn unknown_status_passes_through_trimmed() {
    let status = TaskStatus::normalize(" Backlog ");
    assert_eq!(status, TaskStatus::Other("Backlog".into()));
    assert_eq!(status.as_str(), "Backlog");
}

#[test]
fn stored_text_round_trips_through_from_stored() {
    for status in TaskStatus::KNOWN {
        assert_eq!(TaskStatus::from_stored(status.as_str()), status);
    }
    assert_eq!(TaskStatus::InProgress.as_str(), "In Progress");
}

#[test]
fn status_serializes_as_plain_string() {
    let json = serde_json::to_string(&TaskStatus::InProgress).expect("serialize");
    assert_eq!(json, "\"In Progress\"");
    let back: TaskStatus = serde_json::from_str("\"Review\"").expect("deserialize");
    assert_eq!(back, TaskStatus::Other("Review".into()));
}

#[test]
fn new_record_carries_declared_defaults() {
    let at = Utc.with_ymd_and_hms(2026, 3, 4, 9, 0, 0).single().expect("valid");
    let task = TaskRecord::new("T-1", "Write report", "Alice", TaskStatus::Open, at);

    assert_eq!(task.project, DEFAULT_PROJECT);
    assert_eq!(task.priority, DEFAULT_PRIORITY);
    assert!(task.comments.is_empty());
    assert!(task.completed_at.is_none());
    assert_eq!(task.to_string(), "T-1 • Write report");
}

#[test]
fn completion_rate_is_rounded_to_one_decimal() {
    assert!((completion_rate(0, 0) - 0.0).abs() < f64::EPSILON);
    assert!((completion_rate(1, 3) - 33.3).abs() < 1e-9);
    assert!((completion_rate(2, 3) - 66.7).abs() < 1e-9);
    assert!((completion_rate(6, 10) - 60.0).abs() < 1e-9);
}
