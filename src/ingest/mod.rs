//! Dataset ingestion: archive the raw upload, parse it, normalize each row,
//! and upsert the resulting records by `task_id`.

pub mod columns;
pub mod normalize;
pub mod sheet;
pub mod upload_store;

use std::path::Path;

use bytes::Bytes;
use serde::Serialize;
use tracing::{info, warn};

use crate::models::task::TaskRecord;
use crate::persistence::task_repo::TaskRepo;
use crate::{AppError, Result};

use self::columns::ColumnIndex;
use self::normalize::{normalize_row, RowRejection};
use self::sheet::Sheet;
use self::upload_store::UploadStore;

/// Message returned for unsupported upload extensions.
pub const UNSUPPORTED_FORMAT_MESSAGE: &str = "Please upload CSV or Excel file.";

/// Spreadsheet flavour, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    /// `.csv`
    Csv,
    /// `.xlsx` or `.xls`
    Excel,
}

impl UploadFormat {
    /// Detect the format from a file name, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Format` for any other extension.
    pub fn from_file_name(name: &str) -> Result<Self> {
        let ext = Path::new(name.trim())
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("xlsx" | "xls") => Ok(Self::Excel),
            _ => Err(AppError::Format(UNSUPPORTED_FORMAT_MESSAGE.into())),
        }
    }

    fn read(self, bytes: &[u8]) -> Result<Sheet> {
        match self {
            Self::Csv => sheet::read_csv(bytes),
            Self::Excel => sheet::read_excel(bytes),
        }
    }
}

/// A data row that could not be stored.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based data-row number (the header is row 0).
    pub row: usize,
    /// Human-readable cause.
    pub reason: String,
}

/// Records parsed from one spreadsheet, plus the rows that were rejected.
#[derive(Debug, Clone, Default)]
pub struct ParsedBatch {
    /// Data rows seen, blank rows included.
    pub rows_read: usize,
    /// Records ready for upsert, in file order.
    pub records: Vec<TaskRecord>,
    /// Rejected rows.
    pub skipped: Vec<SkippedRow>,
}

/// Outcome of one ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    /// Name the client sent.
    pub file_name: String,
    /// Where the raw bytes were archived.
    pub stored_as: String,
    /// Hex SHA-256 of the raw bytes.
    pub sha256: String,
    /// Data rows seen.
    pub rows_read: usize,
    /// Records created.
    pub inserted: usize,
    /// Records overwritten.
    pub updated: usize,
    /// Rows that could not be stored.
    pub skipped: Vec<SkippedRow>,
}

/// Parse spreadsheet bytes into records.
///
/// # Errors
///
/// Returns `AppError::Format` if the bytes are unreadable, or
/// `AppError::Schema` if required columns are missing.
pub fn parse_upload(format: UploadFormat, bytes: &[u8]) -> Result<ParsedBatch> {
    let sheet = format.read(bytes)?;
    let index = ColumnIndex::from_headers(&sheet.headers)?;

    let mut batch = ParsedBatch {
        rows_read: sheet.rows.len(),
        ..ParsedBatch::default()
    };
    for (i, row) in sheet.rows.iter().enumerate() {
        match normalize_row(&index, row) {
            Ok(record) => batch.records.push(record),
            Err(RowRejection::Blank) => {}
            Err(RowRejection::Invalid(reason)) => batch.skipped.push(SkippedRow { row: i + 1, reason }),
        }
    }
    Ok(batch)
}

/// Ingestion pipeline bound to a repository and an upload archive.
#[derive(Clone)]
pub struct Ingestor {
    repo: TaskRepo,
    store: UploadStore,
}

impl Ingestor {
    /// Create a pipeline writing to `repo` and archiving into `store`.
    #[must_use]
    pub fn new(repo: TaskRepo, store: UploadStore) -> Self {
        Self { repo, store }
    }

    /// Archive, parse, and upsert one uploaded file.
    ///
    /// The raw bytes are archived first, so they survive format and schema
    /// failures. The batch is committed in a single transaction.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Format` or `AppError::Schema` for client mistakes,
    /// `AppError::Io` if archiving fails, and `AppError::Db` if the upsert fails.
    pub async fn ingest(&self, file_name: &str, data: Bytes) -> Result<IngestReport> {
        let stored = {
            let store = self.store.clone();
            let name = file_name.to_owned();
            let data = data.clone();
            tokio::task::spawn_blocking(move || store.save(&name, &data))
                .await
                .map_err(|err| AppError::Io(format!("upload archive task panicked: {err}")))??
        };
        info!(
            file_name,
            stored_as = %stored.path.display(),
            bytes = stored.bytes_written,
            sha256 = %stored.sha256,
            "upload archived"
        );

        let format = UploadFormat::from_file_name(file_name).inspect_err(|_| {
            warn!(file_name, "rejected upload with unsupported extension");
        })?;

        let batch = tokio::task::spawn_blocking(move || parse_upload(format, &data))
            .await
            .map_err(|err| AppError::Io(format!("parse task panicked: {err}")))?
            .inspect_err(|err| warn!(file_name, %err, "upload could not be parsed"))?;

        let outcome = self.repo.upsert_batch(&batch.records).await?;
        info!(
            file_name,
            rows = batch.rows_read,
            inserted = outcome.inserted,
            updated = outcome.updated,
            skipped = batch.skipped.len(),
            "dataset ingested"
        );

        Ok(IngestReport {
            file_name: file_name.to_owned(),
            stored_as: stored.path.display().to_string(),
            sha256: stored.sha256,
            rows_read: batch.rows_read,
            inserted: outcome.inserted,
            updated: outcome.updated,
            skipped: batch.skipped,
        })
    }
}
