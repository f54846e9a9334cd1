//! Shared helpers for HTTP-level integration tests.
//!
//! Builds an `AppState` over in-memory `SQLite` and a temp data dir, and
//! serves it on an ephemeral port.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use pulsevo::config::GlobalConfig;
use pulsevo::insight::{DisabledGenerator, InsightService, TextGenerator};
use pulsevo::persistence::db;
use pulsevo::web::{self, AppState};
use pulsevo::Result;
use tokio_util::sync::CancellationToken;

/// Generator that always answers with the same text.
pub struct CannedGenerator(pub &'static str);

impl TextGenerator for CannedGenerator {
    fn generate<'a>(
        &'a self,
        _prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move { Ok(self.0.to_owned()) })
    }
}

/// A running server plus everything that must outlive it.
pub struct TestServer {
    pub base_url: String,
    pub state: Arc<AppState>,
    pub ct: CancellationToken,
    pub _data_dir: tempfile::TempDir,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.ct.cancel();
    }
}

/// Default upload cap for test servers.
pub const TEST_UPLOAD_LIMIT: usize = 1_048_576;

/// Build a `GlobalConfig` rooted at `data_dir` with AI disabled.
pub fn test_config(data_dir: &str, max_upload_bytes: usize) -> GlobalConfig {
    let toml = format!(
        r#"
data_dir = '{dir}'
http_port = 0
max_upload_bytes = {max_upload_bytes}

[ai]
enabled = false
"#,
        dir = data_dir.replace('\\', "\\\\"),
    );
    GlobalConfig::from_toml_str(&toml).expect("valid test config")
}

/// Build a complete `AppState` with in-memory `SQLite`.
pub async fn test_app_state(
    config: GlobalConfig,
    generator: Arc<dyn TextGenerator>,
) -> Arc<AppState> {
    let database = db::connect_memory().await.expect("db connect");
    let state = AppState::new(
        Arc::new(config),
        Arc::new(database),
        InsightService::new(generator),
    )
    .expect("app state");
    Arc::new(state)
}

/// Serve a fresh state whose AI relay is disabled.
pub async fn spawn_server() -> TestServer {
    spawn_server_with(Arc::new(DisabledGenerator::new("AI insights are disabled"))).await
}

/// Serve a fresh state using `generator` for AI answers.
pub async fn spawn_server_with(generator: Arc<dyn TextGenerator>) -> TestServer {
    spawn_server_custom(generator, TEST_UPLOAD_LIMIT).await
}

/// Serve a fresh state with a disabled AI relay and a custom upload cap.
pub async fn spawn_server_with_limit(max_upload_bytes: usize) -> TestServer {
    spawn_server_custom(
        Arc::new(DisabledGenerator::new("AI insights are disabled")),
        max_upload_bytes,
    )
    .await
}

async fn spawn_server_custom(
    generator: Arc<dyn TextGenerator>,
    max_upload_bytes: usize,
) -> TestServer {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = test_config(temp.path().to_str().expect("utf8 path"), max_upload_bytes);
    let state = test_app_state(config, generator).await;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral");
    let addr = listener.local_addr().expect("local addr");

    let ct = CancellationToken::new();
    let server_state = Arc::clone(&state);
    let server_ct = ct.clone();
    tokio::spawn(async move {
        let _ = web::serve_on(listener, server_state, server_ct).await;
    });

    TestServer {
        base_url: format!("http://{addr}"),
        state,
        ct,
        _data_dir: temp,
    }
}

/// Multipart form carrying `content` as the `file` field.
pub fn file_form(name: &str, content: &str) -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(content.as_bytes().to_vec()).file_name(name.to_owned());
    reqwest::multipart::Form::new().part("file", part)
}

/// Client that does not follow redirects, so `303` responses stay visible.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("client")
}

pub const SAMPLE_CSV: &str = "\
task_id,title,assignee,status,created_at,completed_at,project,priority
T-1,Write report,Alice,Open,2026-03-01 09:00:00,,Apollo,High
T-2,Ship release,Alice,Completed,2026-03-02 08:00:00,2026-03-05 17:45:00,Apollo,Low
T-3,Review PR,Bob,In Progress,2026-03-03 10:00:00,,Borealis,
T-4,Fix login,Bob,blocked,2026-03-03 11:00:00,,Borealis,
";
