//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `ROCKETSHOES_API_URL` - Base URL of the products/stock API (default: `http://localhost:3333`)
//! - `ROCKETSHOES_API_TOKEN` - Bearer token sent with every API request
//! - `ROCKETSHOES_API_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `ROCKETSHOES_PRODUCT_CACHE_TTL_SECS` - Product details cache TTL (default: 300)
//! - `ROCKETSHOES_STORAGE_PATH` - Local storage file (default: `.rocketshoes/storage.json`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:3333";
const DEFAULT_TIMEOUT_SECS: &str = "10";
const DEFAULT_PRODUCT_CACHE_TTL_SECS: &str = "300";
const DEFAULT_STORAGE_PATH: &str = ".rocketshoes/storage.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart application configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Products/stock API configuration
    pub api: ApiConfig,
    /// Path of the local key-value storage file
    pub storage_path: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "production", "staging")
    pub sentry_environment: Option<String>,
}

/// Products/stock REST API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL; always ends with `/` so relative paths join under it
    pub base_url: Url,
    /// Optional bearer token
    pub token: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
    /// How long product details stay cached (stock is never cached)
    pub product_cache_ttl: Duration,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .field("product_cache_ttl", &self.product_cache_ttl)
            .finish()
    }
}

impl ApiConfig {
    /// Configuration for an API at `base_url` with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` is not an absolute URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("ROCKETSHOES_API_URL", base_url)?,
            token: None,
            timeout: Duration::from_secs(10),
            product_cache_ttl: Duration::from_secs(300),
        })
    }

    fn from_source(source: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = get_or_default(source, "ROCKETSHOES_API_URL", DEFAULT_API_URL);
        Ok(Self {
            base_url: parse_base_url("ROCKETSHOES_API_URL", &base_url)?,
            token: source("ROCKETSHOES_API_TOKEN")
                .filter(|token| !token.is_empty())
                .map(SecretString::from),
            timeout: get_secs(source, "ROCKETSHOES_API_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            product_cache_ttl: get_secs(
                source,
                "ROCKETSHOES_PRODUCT_CACHE_TTL_SECS",
                DEFAULT_PRODUCT_CACHE_TTL_SECS,
            )?,
        })
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_source(&|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_source(source: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            api: ApiConfig::from_source(source)?,
            storage_path: PathBuf::from(get_or_default(
                source,
                "ROCKETSHOES_STORAGE_PATH",
                DEFAULT_STORAGE_PATH,
            )),
            sentry_dsn: source("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: source("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a variable with a default value.
fn get_or_default(source: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    source(key).unwrap_or_else(|| default.to_string())
}

/// Get a whole number of seconds.
fn get_secs(
    source: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<Duration, ConfigError> {
    get_or_default(source, key, default)
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a base URL, forcing a trailing slash so `join("stock/1")` appends.
fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
