//! Integration tests for the browser upload flow (`POST /upload/`).

use std::fmt::Write as _;

use super::test_helpers::{client, file_form, spawn_server, spawn_server_with_limit, SAMPLE_CSV};

#[tokio::test]
async fn successful_upload_redirects_to_dashboard() {
    let server = spawn_server().await;

    let resp = client()
        .post(format!("{}/upload/", server.base_url))
        .multipart(file_form("tasks.csv", SAMPLE_CSV))
        .send()
        .await
        .expect("POST upload");

    assert_eq!(resp.status(), 303);
    assert_eq!(
        resp.headers().get("location").and_then(|v| v.to_str().ok()),
        Some("/")
    );
    assert_eq!(server.state.tasks.count().await.expect("count"), 4);
}

#[tokio::test]
async fn uploading_twice_leaves_the_same_store() {
    let server = spawn_server().await;
    let http = client();

    for _ in 0..2 {
        let resp = http
            .post(format!("{}/upload/", server.base_url))
            .multipart(file_form("tasks.csv", SAMPLE_CSV))
            .send()
            .await
            .expect("POST upload");
        assert_eq!(resp.status(), 303);
    }

    assert_eq!(server.state.tasks.count().await.expect("count"), 4);
}

#[tokio::test]
async fn unsupported_extension_rerenders_form_with_message() {
    let server = spawn_server().await;

    let resp = client()
        .post(format!("{}/upload/", server.base_url))
        .multipart(file_form("tasks.txt", SAMPLE_CSV))
        .send()
        .await
        .expect("POST upload");

    assert_eq!(resp.status(), 400);
    let html = resp.text().await.expect("body");
    assert!(html.contains("Please upload CSV or Excel file."));
    assert_eq!(server.state.tasks.count().await.expect("count"), 0);
}

#[tokio::test]
async fn missing_columns_are_named_in_the_error() {
    let server = spawn_server().await;

    let resp = client()
        .post(format!("{}/upload/", server.base_url))
        .multipart(file_form("tasks.csv", "task_id,title,created_at\nT-1,x,2026-03-01\n"))
        .send()
        .await
        .expect("POST upload");

    assert_eq!(resp.status(), 400);
    let html = resp.text().await.expect("body");
    assert!(html.contains("Missing required columns: assignee, status"));
}

#[tokio::test]
async fn api_upload_without_file_field_is_a_400() {
    let server = spawn_server().await;

    let form = reqwest::multipart::Form::new().text("note", "no file here");
    let resp = client()
        .post(format!("{}/api/upload/", server.base_url))
        .multipart(form)
        .send()
        .await
        .expect("POST upload");

    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.expect("json");
    assert!(body["error"].as_str().unwrap_or_default().contains("file"));
}

#[tokio::test]
async fn skipped_rows_are_reported_by_the_api() {
    let server = spawn_server().await;
    let csv = "task_id,title,assignee,status,created_at\nT-1,ok,Alice,Open,2026-03-01\n,bad,Bob,Open,2026-03-01\n";

    let report: serde_json::Value = client()
        .post(format!("{}/api/upload/", server.base_url))
        .multipart(file_form("tasks.csv", csv))
        .send()
        .await
        .expect("POST upload")
        .json()
        .await
        .expect("json");

    assert_eq!(report["inserted"], 1);
    assert_eq!(report["skipped"][0]["row"], 2);
    assert_eq!(report["skipped"][0]["reason"], "missing task_id");
}

/// A CSV comfortably larger than `bytes`.
fn oversized_csv(bytes: usize) -> String {
    let mut csv = String::from("task_id,title,assignee,status,created_at\n");
    let mut i = 0;
    while csv.len() <= bytes * 2 {
        let _ = writeln!(csv, "T-{i},Padding row,Alice,Open,2026-03-01");
        i += 1;
    }
    csv
}

#[tokio::test]
async fn oversized_api_upload_is_413_naming_the_limit() {
    let server = spawn_server_with_limit(1024).await;

    let resp = client()
        .post(format!("{}/api/upload/", server.base_url))
        .multipart(file_form("tasks.csv", &oversized_csv(1024)))
        .send()
        .await
        .expect("POST upload");

    assert_eq!(resp.status(), 413);
    let body: serde_json::Value = resp.json().await.expect("json");
    assert!(body["error"].as_str().unwrap_or_default().contains("1024 bytes"));
    assert_eq!(server.state.tasks.count().await.expect("count"), 0);
}

#[tokio::test]
async fn oversized_form_upload_rerenders_form_with_413() {
    let server = spawn_server_with_limit(1024).await;

    let resp = client()
        .post(format!("{}/upload/", server.base_url))
        .multipart(file_form("tasks.csv", &oversized_csv(1024)))
        .send()
        .await
        .expect("POST upload");

    assert_eq!(resp.status(), 413);
    let html = resp.text().await.expect("body");
    assert!(html.contains("File is too large."));
}
