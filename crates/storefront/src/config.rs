//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `AUTOPARTS_API_URL` - REST backend base URL (default: `http://localhost:3000/api`)
//! - `AUTOPARTS_SESSION_FILE` - Where the session token is persisted
//!   (default: `.autoparts-session.json`)
//! - `AUTOPARTS_HTTP_TIMEOUT_SECS` - Request timeout in seconds (default: none)
//! - `AUTOPARTS_PRODUCT_CACHE_TTL_SECS` - Product cache lifetime (default: 300)
//! - `AUTOPARTS_USE_SANDBOX` - Prefer sandbox payment URLs (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:3000/api";
const DEFAULT_SESSION_FILE: &str = ".autoparts-session.json";
const DEFAULT_PRODUCT_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST backend, without a trailing slash.
    pub api_url: Url,
    /// File used to persist the session token and user.
    pub session_file: PathBuf,
    /// Optional per-request timeout.
    pub http_timeout: Option<Duration>,
    /// Lifetime of cached product lookups.
    pub product_cache_ttl: Duration,
    /// Prefer sandbox checkout URLs from the payment provider.
    pub use_sandbox: bool,
    /// Sentry DSN for error tracking.
    pub sentry_dsn: Option<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_api_url(&get_env_or_default("AUTOPARTS_API_URL", DEFAULT_API_URL))
            .map_err(|e| ConfigError::InvalidEnvVar("AUTOPARTS_API_URL".to_string(), e))?;
        let session_file =
            PathBuf::from(get_env_or_default("AUTOPARTS_SESSION_FILE", DEFAULT_SESSION_FILE));
        let http_timeout = get_optional_env("AUTOPARTS_HTTP_TIMEOUT_SECS")
            .map(|v| parse_secs("AUTOPARTS_HTTP_TIMEOUT_SECS", &v))
            .transpose()?;
        let product_cache_ttl = get_optional_env("AUTOPARTS_PRODUCT_CACHE_TTL_SECS")
            .map(|v| parse_secs("AUTOPARTS_PRODUCT_CACHE_TTL_SECS", &v))
            .transpose()?
            .unwrap_or(Duration::from_secs(DEFAULT_PRODUCT_CACHE_TTL_SECS));
        let use_sandbox = get_optional_env("AUTOPARTS_USE_SANDBOX")
            .map(|v| parse_bool("AUTOPARTS_USE_SANDBOX", &v))
            .transpose()?
            .unwrap_or(false);
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            api_url,
            session_file,
            http_timeout,
            product_cache_ttl,
            use_sandbox,
            sentry_dsn,
        })
    }

    /// Build a configuration for the given backend with all defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL is not an absolute
    /// http(s) URL.
    pub fn for_api_url(api_url: &str) -> Result<Self, ConfigError> {
        let api_url = parse_api_url(api_url)
            .map_err(|e| ConfigError::InvalidEnvVar("AUTOPARTS_API_URL".to_string(), e))?;
        Ok(Self {
            api_url,
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            http_timeout: None,
            product_cache_ttl: Duration::from_secs(DEFAULT_PRODUCT_CACHE_TTL_SECS),
            use_sandbox: false,
            sentry_dsn: None,
        })
    }

    /// Base URL as a string without a trailing slash.
    #[must_use]
    pub fn get_api_url(&self) -> &str {
        self.api_url.as_str().trim_end_matches('/')
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse and validate the backend base URL.
fn parse_api_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("URL must have a host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("URL must not contain a query or fragment".to_string());
    }
    Ok(url)
}

fn parse_secs(key: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
