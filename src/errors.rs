//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Persistence failure when interacting with `SQLite`.
    Db(String),
    /// Uploaded file has an unsupported extension or cannot be read as a spreadsheet.
    Format(String),
    /// Uploaded spreadsheet lacks required columns (sorted list of missing names).
    Schema(Vec<String>),
    /// Upload body exceeded the configured limit (in bytes).
    PayloadTooLarge(usize),
    /// Free-text question was blank.
    EmptyQuery,
    /// External text-generation call failed (network, auth, quota, bad payload).
    Service(String),
    /// Requested entity does not exist.
    NotFound(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl AppError {
    /// Whether the failure was caused by the caller's input rather than the server.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Format(_) | Self::Schema(_) | Self::PayloadTooLarge(_) | Self::EmptyQuery
        )
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Db(msg) => write!(f, "db: {msg}"),
            Self::Format(msg) => write!(f, "format: {msg}"),
            Self::Schema(missing) => {
                write!(f, "schema: missing required columns: {}", missing.join(", "))
            }
            Self::PayloadTooLarge(limit) => {
                write!(f, "payload too large: upload exceeds the {limit}-byte limit")
            }
            Self::EmptyQuery => write!(f, "empty query: please provide a question"),
            Self::Service(msg) => write!(f, "service: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Db(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self::Service(err.to_string())
    }
}
