//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CATALOG_API_URL` - Base URL of the product catalog REST API
//!
//! ## Optional
//! - `SHOPFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `SHOPFRONT_PORT` - Listen port (default: 3000)
//! - `SHOPFRONT_BASE_URL` - Public URL for the storefront (default: `http://localhost:3000`)
//! - `CATALOG_API_TOKEN` - Bearer token for the catalog API
//! - `SHOPFRONT_CART_DIR` - Directory for persisted carts (default: data/carts)
//! - `SHOPFRONT_CURRENCY` - ISO 4217 display currency (default: USD)
//! - `SHOPFRONT_CHECKOUT_DELAY_MS` - Simulated payment delay (default: 1500)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance sample rate (default: 0.1)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use shopfront_core::CurrencyCode;
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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Product catalog API configuration
    pub catalog: CatalogConfig,
    /// Cart persistence and checkout settings
    pub cart: CartConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Product catalog API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct CatalogConfig {
    /// Base URL, e.g. `https://catalog.example.com/v1/`
    pub base_url: Url,
    /// Optional bearer token
    pub api_token: Option<SecretString>,
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("base_url", &self.base_url.as_str())
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Cart and checkout settings.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Directory holding one JSON file per cart
    pub storage_dir: PathBuf,
    /// Currency used to display prices
    pub currency: CurrencyCode,
    /// How long the simulated payment takes
    pub checkout_delay: Duration,
}

impl StorefrontConfig {
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

        let host = parse_env("SHOPFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("SHOPFRONT_PORT", "3000")?;
        let base_url = get_env_or_default("SHOPFRONT_BASE_URL", "http://localhost:3000");

        let catalog = CatalogConfig::from_env()?;
        let cart = CartConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            catalog,
            cart,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl CatalogConfig {
    /// Load the catalog settings on their own, for tools that only talk to
    /// the catalog.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `CATALOG_API_URL` is missing or not a URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = get_required_env("CATALOG_API_URL")?;
        Ok(Self {
            base_url: parse_base_url(&raw)
                .map_err(|e| ConfigError::InvalidEnvVar("CATALOG_API_URL".to_string(), e))?,
            api_token: get_optional_env("CATALOG_API_TOKEN").map(SecretString::from),
        })
    }
}

impl CartConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let delay_ms: u64 = parse_env("SHOPFRONT_CHECKOUT_DELAY_MS", "1500")?;
        Ok(Self {
            storage_dir: PathBuf::from(get_env_or_default("SHOPFRONT_CART_DIR", "data/carts")),
            currency: parse_env("SHOPFRONT_CURRENCY", "USD")?,
            checkout_delay: Duration::from_millis(delay_ms),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a catalog base URL, making sure relative joins keep its path.
///
/// `https://host/v1` and `https://host/v1/` both become `https://host/v1/`.
///
/// # Errors
///
/// Returns a description of the problem if `raw` is not an absolute URL.
pub fn parse_base_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if url.cannot_be_a_base() {
        return Err("URL cannot be used as a base".to_string());
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> StorefrontConfig {
        StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            catalog: CatalogConfig {
                base_url: parse_base_url("http://catalog.test/v1").unwrap(),
                api_token: Some(SecretString::from("catalog-token")),
            },
            cart: CartConfig {
                storage_dir: PathBuf::from("data/carts"),
                currency: CurrencyCode::USD,
                checkout_delay: Duration::from_millis(0),
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        }
    }

    #[test]
    fn test_socket_addr() {
        let config = config();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert!(!config.is_secure());
    }

    #[test]
    fn test_parse_base_url_adds_trailing_slash() {
        let url = parse_base_url("https://catalog.example.com/v1").unwrap();
        assert_eq!(url.as_str(), "https://catalog.example.com/v1/");
        assert_eq!(
            url.join("products").unwrap().as_str(),
            "https://catalog.example.com/v1/products"
        );
    }

    #[test]
    fn test_parse_base_url_rejects_garbage() {
        assert!(parse_base_url("not a url").is_err());
        assert!(parse_base_url("mailto:shop@example.com").is_err());
    }

    #[test]
    fn test_parse_value_errors_name_the_variable() {
        let err = parse_value::<u16>("SHOPFRONT_PORT", "eighty").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "SHOPFRONT_PORT"));

        let currency: CurrencyCode = parse_value("SHOPFRONT_CURRENCY", "eur").unwrap();
        assert_eq!(currency, CurrencyCode::EUR);
    }

    #[test]
    fn test_catalog_debug_redacts_token() {
        let debug = format!("{:?}", config().catalog);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("catalog-token"));
    }
}
