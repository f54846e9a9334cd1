//! Durable archive of raw uploaded files.
//!
//! Every upload is written here before parsing, whether or not it parses.
//! Writes go to a temporary file in the same directory which is then
//! atomically renamed (`persist`) so a crash never leaves a partial file.

use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::{AppError, Result};

/// Longest sanitized original name kept in the stored file name.
const MAX_NAME_CHARS: usize = 120;

/// Summary of an archived upload.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    /// Absolute path of the archived file.
    pub path: PathBuf,
    /// Hex SHA-256 of the content.
    pub sha256: String,
    /// Number of bytes written.
    pub bytes_written: usize,
}

/// Directory-backed upload archive.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    /// Open the archive at `dir`, creating it if missing.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|err| {
            AppError::Io(format!(
                "failed to create upload directory {}: {err}",
                dir.display()
            ))
        })?;
        Ok(Self { dir })
    }

    /// Write `content` under a collision-free name derived from `original_name`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` on temp-file creation, write, or rename failure.
    pub fn save(&self, original_name: &str, content: &[u8]) -> Result<StoredUpload> {
        let uid = Uuid::new_v4().simple().to_string();
        let file_name = format!(
            "{}-{}-{}",
            Utc::now().format("%Y%m%dT%H%M%SZ"),
            uid.get(..8).unwrap_or(&uid),
            sanitize_file_name(original_name)
        );
        let target = self.dir.join(file_name);

        let mut tmp = NamedTempFile::new_in(&self.dir)
            .map_err(|err| AppError::Io(format!("failed to create temporary file: {err}")))?;
        tmp.write_all(content)
            .map_err(|err| AppError::Io(format!("failed to write temporary file: {err}")))?;
        tmp.persist(&target).map_err(|err| {
            AppError::Io(format!(
                "failed to persist upload to {}: {err}",
                target.display()
            ))
        })?;

        Ok(StoredUpload {
            path: target,
            sha256: format!("{:x}", Sha256::digest(content)),
            bytes_written: content.len(),
        })
    }
}

/// Keep only the final path component and replace anything outside
/// `[A-Za-z0-9._-]` with `_`.
#[must_use]
pub fn sanitize_file_name(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_CHARS)
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".into()
    } else {
        cleaned.to_owned()
    }
}
