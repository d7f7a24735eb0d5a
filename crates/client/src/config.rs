//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CROPCARE_API_BASE_URL` - Backend base URL (e.g., `http://192.168.1.10:8002`)
//!
//! ## Optional
//! - `CROPCARE_STORAGE_PATH` - JSON file backing local storage (default: in-memory)
//! - `CROPCARE_LOG_JSON` - Emit JSON log lines (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// CropCare client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, without trailing slash
    pub api_base_url: Url,
    /// File backing local storage; `None` keeps storage in memory
    pub storage_path: Option<PathBuf>,
    /// Emit logs as JSON instead of human-readable lines
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = parse_base_url(
            "CROPCARE_API_BASE_URL",
            &get_required_env("CROPCARE_API_BASE_URL")?,
        )?;
        let storage_path = get_optional_env("CROPCARE_STORAGE_PATH").map(PathBuf::from);
        let log_json = parse_bool(
            "CROPCARE_LOG_JSON",
            &get_env_or_default("CROPCARE_LOG_JSON", "false"),
        )?;

        Ok(Self {
            api_base_url,
            storage_path,
            log_json,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Build a configuration for the given base URL with every optional
    /// setting at its default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` is not an http(s) URL.
    pub fn for_base_url(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url("CROPCARE_API_BASE_URL", base_url)?,
            storage_path: None,
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
        })
    }

    /// Base URL as a string without a trailing slash, ready for path joins.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.api_base_url.as_str().trim_end_matches('/')
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse and validate the backend base URL.
fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "URL must have a host".to_string(),
        ));
    }

    Ok(url)
}

/// Parse a boolean flag (`true`/`false`/`1`/`0`/`yes`/`no`).
fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_valid() {
        let url = parse_base_url("TEST_URL", "http://192.168.1.10:8002").unwrap();
        assert_eq!(url.host_str(), Some("192.168.1.10"));
        assert_eq!(url.port(), Some(8002));
    }

    #[test]
    fn test_parse_base_url_rejects_other_schemes() {
        let err = parse_base_url("TEST_URL", "ftp://example.com").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn test_parse_base_url_rejects_garbage() {
        assert!(parse_base_url("TEST_URL", "not a url").is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("K", "true").unwrap());
        assert!(parse_bool("K", "YES").unwrap());
        assert!(!parse_bool("K", "0").unwrap());
        assert!(!parse_bool("K", "").unwrap());
        assert!(parse_bool("K", "maybe").is_err());
    }

    #[test]
    fn test_base_url_strips_trailing_slash() {
        let config = ClientConfig::for_base_url("https://api.example.com/v1/").unwrap();
        assert_eq!(config.base_url(), "https://api.example.com/v1");

        let config = ClientConfig::for_base_url("http://localhost:8002").unwrap();
        assert_eq!(config.base_url(), "http://localhost:8002");
    }
}
