//! Product catalog REST API client.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP with `reqwest`
//! - The catalog is the source of truth for products; nothing is stored locally
//! - In-memory caching via `moka` for API responses (5 minute TTL)
//!
//! # Endpoints
//!
//! ```text
//! GET {base}/products        -> [Product]
//! GET {base}/products/{id}   -> Product
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use shopfront_storefront::catalog::CatalogClient;
//!
//! let client = CatalogClient::new(&config.catalog);
//! let product = client.get_product(&ProductId::new("P1")).await?;
//! let candidate = product.candidate(selection)?;
//! ```

mod cache;
mod conversions;
pub mod types;

pub use conversions::SelectionError;
pub use types::{Product, ProductImage, VariantOption};

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use shopfront_core::ProductId;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::CatalogConfig;
use cache::{CacheKey, CacheValue};

/// Errors that can occur when talking to the catalog API.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the catalog.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success status.
    #[error("Catalog returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The configured base URL cannot have paths appended.
    #[error("Invalid catalog URL: {0}")]
    InvalidUrl(String),
}

// =============================================================================
// CatalogClient
// =============================================================================

/// Client for the product catalog API.
///
/// Cheap to clone; clones share the HTTP connection pool and the cache.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: Url,
    api_token: Option<SecretString>,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogClient {
    /// Create a new catalog API client.
    #[must_use]
    pub fn new(config: &CatalogConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(CatalogClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.clone(),
                api_token: config.api_token.clone(),
                cache,
            }),
        }
    }

    /// Build `{base}/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, CatalogError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CatalogError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Execute a GET request and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CatalogError> {
        let mut request = self
            .inner
            .client
            .get(url.clone())
            .header("Accept", "application/json");
        if let Some(token) = &self.inner.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(url.path().to_string()));
        }

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CatalogError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Catalog API returned non-success status"
            );
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body: response_text.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse catalog response"
            );
            CatalogError::Parse(e)
        })
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, CatalogError> {
        let cache_key = CacheKey::Product(id.clone());

        // Check cache
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&["products", id.as_str()])?;
        let product: Product = self.get_json(url).await?;

        // Cache the result
        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// List all products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for product list");
            return Ok(products);
        }

        let url = self.endpoint(&["products"])?;
        let products: Vec<Product> = self.get_json(url).await?;
        debug!(count = products.len(), "Fetched product list");

        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::parse_base_url;

    fn client_for(server: &MockServer, token: Option<&str>) -> CatalogClient {
        CatalogClient::new(&CatalogConfig {
            base_url: parse_base_url(&format!("{}/v1", server.uri())).unwrap(),
            api_token: token.map(|t| SecretString::from(t.to_string())),
        })
    }

    fn product_json(id: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "slug": "pineapple-tee",
            "name": "Pineapple Tee",
            "price": "24.00",
            "stock": 3,
            "variants": [{"name": "size", "values": ["S", "M"]}]
        })
    }

    #[test]
    fn test_catalog_error_display() {
        let err = CatalogError::NotFound("/v1/products/P9".to_string());
        assert_eq!(err.to_string(), "Not found: /v1/products/P9");

        let err = CatalogError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }

    #[tokio::test]
    async fn test_get_product_sends_token_and_caches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/products/P1"))
            .and(header("Authorization", "Bearer secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(product_json("P1")))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("secret-token"));
        let first = client.get_product(&ProductId::new("P1")).await.unwrap();
        let second = client.get_product(&ProductId::new("P1")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.stock, 3);
    }

    #[tokio::test]
    async fn test_get_product_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/products/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .get_product(&ProductId::new("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rate_limited_reads_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/products"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
            .mount(&server)
            .await;

        let err = client_for(&server, None).list_products().await.unwrap_err();
        assert!(matches!(err, CatalogError::RateLimited(30)));
    }

    #[tokio::test]
    async fn test_server_error_is_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/products"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client_for(&server, None).list_products().await.unwrap_err();
        assert!(matches!(err, CatalogError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_list_products() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/products"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([product_json("P1"), product_json("P2")])),
            )
            .mount(&server)
            .await;

        let products = client_for(&server, None).list_products().await.unwrap();
        let ids: Vec<_> = products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["P1", "P2"]);
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/products/P1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .get_product(&ProductId::new("P1"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }
}
