//! Application state shared across handlers.

use std::sync::{Arc, Mutex};

use shopfront_core::cart::{CartError, CartStore, Notice};

use crate::catalog::CatalogClient;
use crate::config::StorefrontConfig;
use crate::error::AppError;
use crate::storage::FileStorage;

/// A cart opened for the duration of one request.
pub type RequestCart<'a> = CartStore<&'a mut FileStorage, &'a mut Vec<Notice>>;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the catalog client and cart storage.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: CatalogClient,
    carts: Mutex<FileStorage>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `carts` - Storage for persisted carts
    #[must_use]
    pub fn new(config: StorefrontConfig, carts: FileStorage) -> Self {
        let catalog = CatalogClient::new(&config.catalog);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                carts: Mutex::new(carts),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the catalog API client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    /// Check that cart storage accepts writes.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage lock is poisoned or the directory is
    /// not writable.
    pub fn check_cart_storage(&self) -> Result<(), AppError> {
        let storage = self.lock_carts()?;
        storage
            .check_writable()
            .map_err(|e| AppError::Cart(e.into()))
    }

    /// Open the cart stored under `key`, run `f` against it, and release it.
    ///
    /// Runs on the blocking thread pool: the storage lock is held while the
    /// snapshot is read, `f` runs, and the result is written back. Notices
    /// emitted by the cart are appended to `notices`.
    ///
    /// A snapshot that cannot be read is discarded and the shopper gets an
    /// empty cart.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or `f` fails.
    pub async fn with_cart<T, F>(
        &self,
        key: &str,
        notices: &mut Vec<Notice>,
        f: F,
    ) -> Result<T, AppError>
    where
        T: Send + 'static,
        F: FnOnce(&mut RequestCart<'_>) -> Result<T, CartError> + Send + 'static,
    {
        let state = self.clone();
        let key = key.to_string();
        let span = tracing::Span::current();

        let (result, mut emitted) = tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            let mut emitted = Vec::new();
            let result = state.with_cart_blocking(&key, &mut emitted, f);
            (result, emitted)
        })
        .await
        .map_err(|e| AppError::Internal(format!("cart task failed: {e}")))?;

        notices.append(&mut emitted);
        result
    }

    fn with_cart_blocking<T, F>(
        &self,
        key: &str,
        notices: &mut Vec<Notice>,
        f: F,
    ) -> Result<T, AppError>
    where
        F: FnOnce(&mut RequestCart<'_>) -> Result<T, CartError>,
    {
        let mut storage = self.lock_carts()?;
        let (mut cart, discarded) = CartStore::open_or_reset(&mut *storage, key, notices)?;
        if let Some(e) = discarded {
            tracing::warn!(key, error = %e, "Discarded unreadable cart snapshot");
        }

        Ok(f(&mut cart)?)
    }

    fn lock_carts(&self) -> Result<std::sync::MutexGuard<'_, FileStorage>, AppError> {
        self.inner
            .carts
            .lock()
            .map_err(|_| AppError::Internal("cart storage lock poisoned".to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use rust_decimal::Decimal;
    use shopfront_core::cart::{CartOutcome, ItemCandidate};
    use shopfront_core::{CurrencyCode, ProductId, VariantSelection};

    use super::*;
    use crate::config::{CartConfig, CatalogConfig, parse_base_url};

    fn state_in(dir: &std::path::Path) -> AppState {
        let config = StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            catalog: CatalogConfig {
                base_url: parse_base_url("http://catalog.invalid").unwrap(),
                api_token: None,
            },
            cart: CartConfig {
                storage_dir: dir.to_path_buf(),
                currency: CurrencyCode::USD,
                checkout_delay: Duration::ZERO,
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        AppState::new(config, FileStorage::new(dir).unwrap())
    }

    fn tee() -> ItemCandidate {
        ItemCandidate {
            product_id: ProductId::new("P1"),
            variant_selection: VariantSelection::new(),
            name: "Tee".to_string(),
            slug: "tee".to_string(),
            image_url: None,
            unit_price: Decimal::new(500, 2),
            stock_limit: 4,
        }
    }

    #[tokio::test]
    async fn test_with_cart_persists_between_calls() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        let mut notices = Vec::new();

        let outcome = state
            .with_cart("cart-a", &mut notices, |cart| cart.add_item(tee()))
            .await
            .unwrap();
        assert_eq!(outcome, CartOutcome::Added);
        assert_eq!(notices.len(), 1);

        let count = state
            .with_cart("cart-a", &mut notices, |cart| Ok(cart.item_count()))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_unreadable_snapshot_is_reset() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cart-b.json"), "not json").unwrap();
        let state = state_in(dir.path());

        let empty = state
            .with_cart("cart-b", &mut Vec::new(), |cart| Ok(cart.is_empty()))
            .await
            .unwrap();
        assert!(empty);
        assert!(!dir.path().join("cart-b.json").exists());
    }

    #[test]
    fn test_check_cart_storage() {
        let dir = tempfile::tempdir().unwrap();
        assert!(state_in(dir.path()).check_cart_storage().is_ok());
    }
}
