//! Shared state handed to every request handler.

use std::sync::Arc;

use crate::config::GlobalConfig;
use crate::ingest::upload_store::UploadStore;
use crate::ingest::Ingestor;
use crate::insight::InsightService;
use crate::persistence::db::Database;
use crate::persistence::task_repo::TaskRepo;
use crate::stats::Aggregator;
use crate::Result;

use super::pages::Pages;

/// Everything a handler needs, built once by the composition root.
pub struct AppState {
    /// Validated configuration.
    pub config: Arc<GlobalConfig>,
    /// Task repository.
    pub tasks: TaskRepo,
    /// Read-only aggregation queries.
    pub stats: Aggregator,
    /// Upload pipeline.
    pub ingestor: Ingestor,
    /// AI relay.
    pub insights: InsightService,
    /// HTML templates.
    pub pages: Pages,
}

impl AppState {
    /// Wire repositories, the pipeline, and templates around `db`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the upload directory cannot be created, or
    /// `AppError::Config` if a template fails to compile.
    pub fn new(
        config: Arc<GlobalConfig>,
        db: Arc<Database>,
        insights: InsightService,
    ) -> Result<Self> {
        let tasks = TaskRepo::new(Arc::clone(&db));
        let store = UploadStore::new(config.uploads_dir())?;
        Ok(Self {
            stats: Aggregator::new(db),
            ingestor: Ingestor::new(tasks.clone(), store),
            pages: Pages::new()?,
            tasks,
            insights,
            config,
        })
    }
}
