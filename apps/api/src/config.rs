use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

/// Model name forwarded to the search backend for resume/job analysis.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-lite";
/// Advisory upload ceiling shown on the form and enforced on submit (32 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Fails at startup only if the search backend URL is missing; an absent
/// API key is tolerated and surfaces as a required-field warning on submit.
#[derive(Debug, Clone)]
pub struct Config {
    pub search_backend_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_api_key_source: Option<KeySource>,
    pub gemini_model: String,
    pub max_upload_bytes: usize,
    pub search_timeout: Duration,
    pub search_retention: Duration,
    /// Reject PDFs with no extractable text before dispatching a search.
    pub resume_text_check: bool,
    pub port: u16,
    pub rust_log: String,
}

/// Where the Gemini API key was found.
#[derive(Debug, Clone, PartialEq)]
pub enum KeySource {
    Environment,
    SecretsFile(PathBuf),
}

impl Config {
    /// Loads configuration. Nothing is logged here because it runs before the
    /// tracing subscriber exists; see [`Config::log_startup`].
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let secrets_file =
            std::env::var("SECRETS_FILE").unwrap_or_else(|_| "secrets.toml".to_string());

        let (gemini_api_key, gemini_api_key_source) = resolve_api_key(
            non_empty_env("GEMINI_API_KEY"),
            Path::new(&secrets_file),
        )?
        .unzip();

        Ok(Config {
            search_backend_url: require_env("SEARCH_BACKEND_URL")?
                .trim_end_matches('/')
                .to_string(),
            gemini_api_key,
            gemini_api_key_source,
            gemini_model: non_empty_env("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            search_timeout: Duration::from_secs(parse_env("SEARCH_TIMEOUT_SECS", 300)?),
            search_retention: Duration::from_secs(parse_env("SEARCH_RETENTION_SECS", 3600)?),
            resume_text_check: parse_env("RESUME_TEXT_CHECK", true)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

impl Config {
    /// Reports configuration facts operators need once logging is up.
    pub fn log_startup(&self) {
        match &self.gemini_api_key_source {
            Some(KeySource::Environment) => info!("Loaded GEMINI_API_KEY from the environment"),
            Some(KeySource::SecretsFile(path)) => {
                info!("Loaded GEMINI_API_KEY from {}", path.display())
            }
            None => {
                warn!("GEMINI_API_KEY is not configured; searches will be refused until it is set")
            }
        }
        if !self.resume_text_check {
            info!("Resume text check disabled");
        }
    }
}

/// The environment value wins over the secrets file.
fn resolve_api_key(
    from_env: Option<String>,
    secrets_file: &Path,
) -> Result<Option<(String, KeySource)>> {
    if let Some(key) = from_env {
        return Ok(Some((key, KeySource::Environment)));
    }
    Ok(read_secret(secrets_file, "GEMINI_API_KEY")?
        .map(|key| (key, KeySource::SecretsFile(secrets_file.to_path_buf()))))
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match non_empty_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        None => Ok(default),
    }
}

/// Reads a single string value from a TOML secrets file.
/// A missing file is not an error; a malformed one is.
fn read_secret(path: &Path, key: &str) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read secrets file {}", path.display()))?;
    lookup_secret(&raw, key)
        .with_context(|| format!("Failed to parse secrets file {}", path.display()))
}

fn lookup_secret(raw: &str, key: &str) -> Result<Option<String>> {
    let table: toml::Table = raw.parse()?;
    Ok(table
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

#[cfg(test)]
impl Config {
    /// Configuration used by handler and dispatcher tests.
    pub fn for_tests() -> Self {
        Config {
            search_backend_url: "http://127.0.0.1:9".to_string(),
            gemini_api_key: Some("test-key".to_string()),
            gemini_api_key_source: Some(KeySource::Environment),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            search_timeout: Duration::from_secs(5),
            search_retention: Duration::from_secs(3600),
            resume_text_check: false,
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}
