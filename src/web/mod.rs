//! HTTP surface: dashboard pages, upload form and JSON API on one axum router.

pub mod error;
pub mod handlers;
pub mod pages;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{AppError, Result};

pub use state::AppState;

/// Build the application router around shared state.
#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_upload_bytes;
    Router::new()
        .route("/", get(handlers::dashboard))
        .route(
            "/upload/",
            get(handlers::upload_form).post(handlers::upload_submit),
        )
        .route("/tasks/", get(handlers::tasks_page))
        .route("/api/stats/", get(handlers::stats_api))
        .route("/api/trends/", get(handlers::trends_api))
        .route("/api/team/", get(handlers::team_api))
        .route("/api/projects/", get(handlers::projects_api))
        .route("/api/predict/", get(handlers::predict_api))
        .route("/api/users/{name}/", get(handlers::user_api))
        .route("/api/tasks/", get(handlers::tasks_api))
        .route("/api/upload/", post(handlers::upload_api))
        .route("/api/ai-insights/", get(handlers::ai_insights))
        .route("/api/query/", post(handlers::ai_query))
        .route("/api/gemini-query/", post(handlers::ai_query))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Bind the configured address and serve until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Config` if the address is invalid or the bind fails.
pub async fn serve(state: Arc<AppState>, ct: CancellationToken) -> Result<()> {
    let bind: SocketAddr = format!("{}:{}", state.config.http_host, state.config.http_port)
        .parse()
        .map_err(|err| AppError::Config(format!("invalid bind address: {err}")))?;
    let listener = TcpListener::bind(bind)
        .await
        .map_err(|err| AppError::Config(format!("failed to bind {bind}: {err}")))?;
    serve_on(listener, state, ct).await
}

/// Serve on an already-bound listener until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Io` if the server loop fails.
pub async fn serve_on(
    listener: TcpListener,
    state: Arc<AppState>,
    ct: CancellationToken,
) -> Result<()> {
    let addr = listener
        .local_addr()
        .map_err(|err| AppError::Io(format!("listener has no address: {err}")))?;
    info!(%addr, "starting HTTP dashboard");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await
        .map_err(|err| AppError::Io(format!("HTTP server error: {err}")))?;

    info!("HTTP dashboard shut down");
    Ok(())
}
