//! Request handlers for the dashboard pages and JSON API.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use bytes::Bytes;
use chrono::Utc;
use minijinja::context;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::ingest::IngestReport;
use crate::models::stats::{Forecast, StatsSummary, TrendSeries, UserSummary};
use crate::models::task::{TaskRecord, TaskStatus};
use crate::persistence::task_repo::{FacetColumn, TaskFilter};
use crate::{AppError, Result};

use super::state::AppState;

type Shared = State<Arc<AppState>>;

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}

/// `GET /`
pub async fn dashboard(State(state): Shared) -> Result<Html<String>> {
    Ok(Html(state.pages.render("dashboard.html", context! {})?))
}

/// `GET /upload/`
pub async fn upload_form(State(state): Shared) -> Result<Html<String>> {
    Ok(Html(state.pages.render("upload.html", context! {})?))
}

/// Map a multipart failure, separating an over-limit body from a malformed one.
fn multipart_error(err: &MultipartError, limit: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(limit)
    } else {
        AppError::Format(format!("invalid multipart payload: {}", err.body_text()))
    }
}

/// Pull the `file` field out of a multipart body.
async fn read_file_field(mut multipart: Multipart, limit: usize) -> Result<Option<(String, Bytes)>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| multipart_error(&err, limit))?
    {
        if field.name() == Some("file") {
            let name = field.file_name().unwrap_or_default().to_owned();
            let data = field
                .bytes()
                .await
                .map_err(|err| multipart_error(&err, limit))?;
            return Ok(Some((name, data)));
        }
    }
    Ok(None)
}

async fn ingest_multipart(state: &AppState, multipart: Multipart) -> Result<IngestReport> {
    let limit = state.config.max_upload_bytes;
    let Some((name, data)) = read_file_field(multipart, limit).await? else {
        return Err(AppError::Format(
            "missing multipart field `file`".into(),
        ));
    };
    state.ingestor.ingest(&name, data).await
}

/// `POST /upload/`: ingest, then redirect to the dashboard.
///
/// Client mistakes re-render the form with the message and their own status.
pub async fn upload_submit(State(state): Shared, multipart: Multipart) -> Response {
    match ingest_multipart(&state, multipart).await {
        Ok(report) => {
            if !report.skipped.is_empty() {
                info!(
                    file_name = %report.file_name,
                    skipped = report.skipped.len(),
                    "upload had rows that could not be stored"
                );
            }
            Redirect::to("/").into_response()
        }
        Err(err) if err.is_client_error() => {
            let status = err.status_code();
            let message = err.client_message();
            match state
                .pages
                .render("upload.html", context! { error => message })
            {
                Ok(html) => (status, Html(html)).into_response(),
                Err(render_err) => render_err.into_response(),
            }
        }
        Err(err) => err.into_response(),
    }
}

/// `POST /api/upload/`: ingest and return the report as JSON.
pub async fn upload_api(State(state): Shared, multipart: Multipart) -> Result<Json<IngestReport>> {
    Ok(Json(ingest_multipart(&state, multipart).await?))
}

/// `GET /api/stats/`
pub async fn stats_api(State(state): Shared) -> Result<Json<StatsSummary>> {
    Ok(Json(state.stats.summary(Utc::now()).await?))
}

/// `GET /api/trends/`
pub async fn trends_api(State(state): Shared) -> Result<Json<TrendSeries>> {
    Ok(Json(state.stats.trends(Utc::now()).await?))
}

/// `GET /api/team/`
pub async fn team_api(State(state): Shared) -> Result<Json<serde_json::Value>> {
    let teams = state.stats.team().await?;
    Ok(Json(json!({ "teams": teams })))
}

/// `GET /api/projects/`
pub async fn projects_api(State(state): Shared) -> Result<Json<serde_json::Value>> {
    let projects = state.stats.projects().await?;
    Ok(Json(json!({ "projects": projects })))
}

/// `GET /api/predict/`
pub async fn predict_api(State(state): Shared) -> Result<Json<Forecast>> {
    Ok(Json(state.stats.forecast(Utc::now()).await?))
}

/// `GET /api/users/{name}/`
pub async fn user_api(State(state): Shared, Path(name): Path<String>) -> Result<Json<UserSummary>> {
    Ok(Json(state.stats.user_summary(&name).await?))
}

/// Filters accepted by the task view and `/api/tasks/`.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TaskQuery {
    /// Free-text search.
    pub q: Option<String>,
    /// Exact status.
    pub status: Option<String>,
    /// Exact project.
    pub project: Option<String>,
    /// Exact priority.
    pub priority: Option<String>,
    /// Row cap.
    pub limit: Option<i64>,
}

impl TaskQuery {
    fn to_filter(&self) -> TaskFilter {
        let clean = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };
        TaskFilter {
            search: clean(&self.q),
            status: clean(&self.status),
            project: clean(&self.project),
            priority: clean(&self.priority),
            limit: self.limit,
        }
    }
}

/// `GET /api/tasks/`
pub async fn tasks_api(
    State(state): Shared,
    Query(query): Query<TaskQuery>,
) -> Result<Json<serde_json::Value>> {
    let tasks = state.tasks.list(&query.to_filter()).await?;
    Ok(Json(json!({ "tasks": tasks })))
}

/// Tasks sharing one status, for the grouped view.
#[derive(Debug, Serialize)]
pub struct StatusGroup {
    /// Stored status text.
    pub status: String,
    /// Members, newest first.
    pub tasks: Vec<TaskRecord>,
}

/// Group tasks by status: the four known statuses first in workflow order,
/// then any other labels alphabetically. Empty groups are omitted.
#[must_use]
pub fn group_by_status(tasks: Vec<TaskRecord>) -> Vec<StatusGroup> {
    let mut known: Vec<Vec<TaskRecord>> = TaskStatus::KNOWN.iter().map(|_| Vec::new()).collect();
    let mut other: BTreeMap<String, Vec<TaskRecord>> = BTreeMap::new();
    for task in tasks {
        match TaskStatus::KNOWN.iter().position(|s| *s == task.status) {
            Some(i) => {
                if let Some(bucket) = known.get_mut(i) {
                    bucket.push(task);
                }
            }
            None => other
                .entry(task.status.as_str().to_owned())
                .or_default()
                .push(task),
        }
    }

    TaskStatus::KNOWN
        .iter()
        .map(|s| s.as_str().to_owned())
        .zip(known)
        .chain(other)
        .filter(|(_, tasks)| !tasks.is_empty())
        .map(|(status, tasks)| StatusGroup { status, tasks })
        .collect()
}

/// `GET /tasks/`
pub async fn tasks_page(
    State(state): Shared,
    Query(query): Query<TaskQuery>,
) -> Result<Html<String>> {
    let tasks = state.tasks.list(&query.to_filter()).await?;
    let total = tasks.len();
    let groups = group_by_status(tasks);
    let statuses = state.tasks.distinct(FacetColumn::Status).await?;
    let projects = state.tasks.distinct(FacetColumn::Project).await?;
    let priorities = state.tasks.distinct(FacetColumn::Priority).await?;

    let html = state.pages.render(
        "tasks.html",
        context! { groups, total, statuses, projects, priorities, filter => query },
    )?;
    Ok(Html(html))
}

/// Optional user scope for the AI insight endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct InsightQuery {
    /// Assignee to include a per-user summary for.
    pub user: Option<String>,
}

#[derive(Serialize)]
struct InsightResponse {
    #[serde(flatten)]
    stats: StatsSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_stats: Option<UserSummary>,
    ai_summary: String,
}

async fn scoped_user(state: &AppState, user: Option<&str>) -> Result<Option<UserSummary>> {
    match user.map(str::trim).filter(|u| !u.is_empty()) {
        Some(name) => Ok(Some(state.stats.user_summary(name).await?)),
        None => Ok(None),
    }
}

/// `GET /api/ai-insights/`
pub async fn ai_insights(
    State(state): Shared,
    Query(query): Query<InsightQuery>,
) -> Result<Json<serde_json::Value>> {
    let stats = state.stats.summary(Utc::now()).await?;
    let user_stats = scoped_user(&state, query.user.as_deref()).await?;
    let ai_summary = state.insights.summarize(&stats, user_stats.as_ref()).await;
    let body = serde_json::to_value(InsightResponse {
        stats,
        user_stats,
        ai_summary,
    })
    .map_err(|err| AppError::Io(format!("failed to encode insight response: {err}")))?;
    Ok(Json(body))
}

/// Body of the free-text query endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct QueryRequest {
    /// The question; `query` is accepted as an alias.
    #[serde(default, alias = "query")]
    pub question: String,
    /// Optional assignee to scope the figures to.
    #[serde(default)]
    pub user: Option<String>,
}

/// `POST /api/query/` and `POST /api/gemini-query/`
pub async fn ai_query(
    State(state): Shared,
    body: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(%rejection, "rejected query body");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": rejection.body_text() })),
            )
                .into_response();
        }
    };

    match answer(&state, &request).await {
        Ok(text) => Json(json!({ "response": text })).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn answer(state: &AppState, request: &QueryRequest) -> Result<String> {
    if request.question.trim().is_empty() {
        return Err(AppError::EmptyQuery);
    }
    let stats = state.stats.summary(Utc::now()).await?;
    let user_stats = scoped_user(state, request.user.as_deref()).await?;
    state
        .insights
        .answer(&stats, user_stats.as_ref(), &request.question)
        .await
}
