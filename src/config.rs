//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::{AppError, Result};

/// Keyring service name under which the AI provider key is stored.
pub const KEYRING_SERVICE: &str = "pulsevo";

/// Environment variables consulted, in order, when the keychain has no AI key.
pub const AI_KEY_ENV_VARS: [&str; 2] = ["PULSEVO_AI_API_KEY", "GEMINI_API_KEY"];

/// Generative-AI provider settings.
///
/// The API key is loaded at runtime via OS keychain or environment variables,
/// never from the TOML config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct AiConfig {
    /// Whether the insight endpoints may call the external service.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Model identifier passed to the provider.
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL of the Generative Language API.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Request timeout; unset means the HTTP client default (none).
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    /// Provider API key (populated at runtime).
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: default_model(),
            endpoint: default_endpoint(),
            timeout_seconds: None,
            api_key: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_model() -> String {
    "gemini-1.5-flash".into()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com".into()
}

fn default_http_host() -> String {
    "127.0.0.1".into()
}

fn default_http_port() -> u16 {
    8000
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Directory holding the `SQLite` database and the raw upload archive.
    pub data_dir: PathBuf,
    /// Interface the HTTP server binds to.
    #[serde(default = "default_http_host")]
    pub http_host: String,
    /// HTTP port for the dashboard and JSON API.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Largest accepted upload body in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Generative-AI provider settings.
    #[serde(default)]
    pub ai: AiConfig,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and normalize paths.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the AI provider key from OS keychain with env-var fallback.
    ///
    /// A missing key is not fatal: the insight endpoints then answer with a
    /// fallback message instead of generated text.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the keychain lookup task panics.
    pub async fn load_credentials(&mut self) -> Result<()> {
        if !self.ai.enabled {
            return Ok(());
        }
        self.ai.api_key = load_credential("ai_api_key").await?;
        if self.ai.api_key.is_none() {
            warn!("no AI provider key found; AI insights will report the service as unavailable");
        }
        Ok(())
    }

    /// Path of the `SQLite` database file.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("pulsevo.db")
    }

    /// Directory where raw uploads are archived.
    #[must_use]
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    fn validate(&mut self) -> Result<()> {
        if self.max_upload_bytes == 0 {
            return Err(AppError::Config(
                "max_upload_bytes must be greater than zero".into(),
            ));
        }

        if self.ai.model.trim().is_empty() {
            return Err(AppError::Config("ai.model must not be empty".into()));
        }

        if self.ai.timeout_seconds == Some(0) {
            return Err(AppError::Config(
                "ai.timeout_seconds must be greater than zero when set".into(),
            ));
        }

        fs::create_dir_all(&self.data_dir)
            .map_err(|err| AppError::Config(format!("data_dir cannot be created: {err}")))?;
        self.data_dir = self
            .data_dir
            .canonicalize()
            .map_err(|err| AppError::Config(format!("data_dir invalid: {err}")))?;

        Ok(())
    }
}

/// Read the AI key from the first non-empty environment variable in
/// [`AI_KEY_ENV_VARS`].
#[must_use]
pub fn credential_from_env() -> Option<String> {
    AI_KEY_ENV_VARS
        .iter()
        .filter_map(|key| env::var(key).ok())
        .map(|value| value.trim().to_owned())
        .find(|value| !value.is_empty())
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str) -> Result<Option<String>> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.trim().is_empty() => return Ok(Some(value.trim().to_owned())),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    Ok(credential_from_env())
}
