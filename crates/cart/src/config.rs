//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CART_API_URL` - Base URL of the storefront API (e.g., `http://localhost:3333`)
//!
//! ## Optional
//! - `CART_API_TOKEN` - Bearer token sent with every API request
//! - `CART_STORAGE_DIR` - Directory holding the cart snapshot (default: `.rocketshoes`)
//! - `CART_STORAGE_KEY` - Storage slot for the cart snapshot (default: `cart`)
//! - `CART_HTTP_TIMEOUT_SECS` - API request timeout in seconds (default: 10)
//! - `CART_PRODUCT_CACHE_TTL_SECS` - Product metadata cache TTL in seconds (default: 300)

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Default storage slot for the cart snapshot.
pub const DEFAULT_STORAGE_KEY: &str = "cart";

const DEFAULT_STORAGE_DIR: &str = ".rocketshoes";
const DEFAULT_HTTP_TIMEOUT_SECS: &str = "10";
const DEFAULT_PRODUCT_CACHE_TTL_SECS: &str = "300";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart application configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Storefront API configuration
    pub api: ApiConfig,
    /// Directory for the file-backed snapshot
    pub storage_dir: PathBuf,
    /// Storage slot name for the snapshot
    pub storage_key: String,
}

/// Storefront API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL; `/stock/{id}` and `/products/{id}` are resolved against it
    pub base_url: Url,
    /// Optional bearer token
    pub token: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
    /// How long product metadata stays cached
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
    /// Configuration for `base_url` with default timeout and cache TTL.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            token: None,
            timeout: Duration::from_secs(10),
            product_cache_ttl: Duration::from_secs(300),
        }
    }
}

impl CartConfig {
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

        Self::from_source(&|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    fn from_source(source: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api = ApiConfig::from_source(source)?;
        let storage_dir =
            PathBuf::from(get_or_default(source, "CART_STORAGE_DIR", DEFAULT_STORAGE_DIR));
        let storage_key = get_or_default(source, "CART_STORAGE_KEY", DEFAULT_STORAGE_KEY);
        if storage_key.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "CART_STORAGE_KEY".to_string(),
                "must not be empty".to_string(),
            ));
        }

        Ok(Self {
            api,
            storage_dir,
            storage_key,
        })
    }
}

impl ApiConfig {
    fn from_source(source: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = parse_base_url("CART_API_URL", &get_required(source, "CART_API_URL")?)?;
        let token = source("CART_API_TOKEN")
            .filter(|token| !token.is_empty())
            .map(SecretString::from);
        let timeout = get_seconds(source, "CART_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;
        let product_cache_ttl = get_seconds(
            source,
            "CART_PRODUCT_CACHE_TTL_SECS",
            DEFAULT_PRODUCT_CACHE_TTL_SECS,
        )?;

        Ok(Self {
            base_url,
            token,
            timeout,
            product_cache_ttl,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required variable.
fn get_required(source: &dyn Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    source(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a variable with a default value.
fn get_or_default(source: &dyn Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    source(key).unwrap_or_else(|| default.to_string())
}

/// Get a duration given in whole seconds.
fn get_seconds(
    source: &dyn Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<Duration, ConfigError> {
    get_or_default(source, key, default)
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse and validate an http(s) base URL.
fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    Ok(url)
}
