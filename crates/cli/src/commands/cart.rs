//! Cart inspection and editing commands.
//!
//! Each command opens the cart stored under `--cart` in `--dir`, applies one
//! operation, prints what happened, and exits. The cart is saved by the
//! store itself whenever an operation changes it.
//!
//! # Environment Variables
//!
//! - `CATALOG_API_URL` - Catalog base URL (only for `add-product`)
//! - `CATALOG_API_TOKEN` - Optional bearer token for the catalog
//! - `SHOPFRONT_CURRENCY` - Currency used by `show` (default: USD)

use std::io::Write;
use std::path::PathBuf;

use rust_decimal::Decimal;
use shopfront_core::cart::{
    CartError, CartOutcome, CartStore, ItemCandidate, Notice, StorageError,
};
use shopfront_core::{CurrencyCode, Price, ProductId, VariantSelection};
use shopfront_storefront::catalog::{CatalogClient, CatalogError, SelectionError};
use shopfront_storefront::config::{CatalogConfig, ConfigError};
use shopfront_storefront::storage::FileStorage;
use thiserror::Error;

/// Errors that can occur during cart commands.
#[derive(Debug, Error)]
pub enum CartCommandError {
    /// Opening the cart directory failed.
    #[error("Cart storage error: {0}")]
    Storage(#[from] StorageError),

    /// Loading or saving the cart failed.
    #[error("{0}")]
    Cart(#[from] CartError),

    /// Catalog configuration is missing or invalid.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Fetching the product failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// The options do not fit the product.
    #[error("Invalid selection: {0}")]
    Selection(#[from] SelectionError),

    /// Writing output failed.
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which cart a command operates on.
#[derive(Debug, Clone)]
pub struct CartTarget {
    pub dir: PathBuf,
    pub key: String,
}

impl CartTarget {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            key: key.into(),
        }
    }

    fn open(&self) -> Result<CartStore<FileStorage, Vec<Notice>>, CartCommandError> {
        let storage = FileStorage::new(&self.dir)?;
        Ok(CartStore::open(storage, self.key.clone(), Vec::new())?)
    }
}

/// A hand-described item for `cart add`.
#[derive(Debug, Clone)]
pub struct ItemSpec {
    pub product: String,
    pub options: Vec<(String, String)>,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub stock: u32,
    pub image: Option<String>,
}

impl ItemSpec {
    #[must_use]
    pub fn into_candidate(self) -> ItemCandidate {
        ItemCandidate {
            product_id: ProductId::new(self.product),
            variant_selection: self.options.into_iter().collect(),
            name: self.name,
            slug: self.slug,
            image_url: self.image,
            unit_price: self.price,
            stock_limit: self.stock,
        }
    }
}

/// Parse an `axis=value` option argument.
///
/// # Errors
///
/// Returns a message if there is no `=` or either side is empty.
pub fn parse_option(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((axis, value)) if !axis.trim().is_empty() && !value.trim().is_empty() => {
            Ok((axis.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected axis=value, got {raw:?}")),
    }
}

/// `SHOPFRONT_CURRENCY`, falling back to USD.
fn display_currency() -> CurrencyCode {
    std::env::var("SHOPFRONT_CURRENCY")
        .ok()
        .and_then(|code| code.parse().ok())
        .unwrap_or_default()
}

fn selection(options: Vec<(String, String)>) -> VariantSelection {
    options.into_iter().collect()
}

/// Print the cart's lines and totals.
///
/// # Errors
///
/// Returns an error if the cart cannot be loaded or output fails.
pub fn show(target: &CartTarget, out: &mut impl Write) -> Result<(), CartCommandError> {
    let cart = target.open()?;
    let currency = display_currency();

    if cart.is_empty() {
        writeln!(out, "Cart {} is empty", cart.key())?;
        return Ok(());
    }

    writeln!(out, "Cart {}", cart.key())?;
    for item in cart.items() {
        let variant = item
            .variant_selection
            .label()
            .map(|label| format!(" ({label})"))
            .unwrap_or_default();
        writeln!(
            out,
            "  {} x {}{} [{}] @ {} = {}  (stock {})",
            item.quantity,
            item.name,
            variant,
            item.product_id,
            Price::new(item.unit_price, currency),
            Price::new(item.line_total(), currency),
            item.stock_limit,
        )?;
    }
    writeln!(
        out,
        "{} items, total {}",
        cart.item_count(),
        Price::new(cart.total(), currency)
    )?;
    Ok(())
}

/// Add one unit of `candidate`.
///
/// # Errors
///
/// Returns an error if the cart cannot be loaded or saved.
pub fn add(
    target: &CartTarget,
    candidate: ItemCandidate,
    out: &mut impl Write,
) -> Result<CartOutcome, CartCommandError> {
    let mut cart = target.open()?;
    let outcome = cart.add_item(candidate)?;
    report(&cart, outcome, out)?;
    Ok(outcome)
}

/// Fetch `product` from the catalog and add one unit.
///
/// # Errors
///
/// Returns an error if the catalog is not configured or unreachable, the
/// options do not fit the product, or the cart cannot be saved.
pub async fn add_product(
    target: &CartTarget,
    product: &str,
    options: Vec<(String, String)>,
    out: &mut impl Write,
) -> Result<CartOutcome, CartCommandError> {
    let config = CatalogConfig::from_env()?;
    let client = CatalogClient::new(&config);

    tracing::info!(product_id = product, "Fetching product from catalog");
    let product = client.get_product(&ProductId::new(product)).await?;
    let candidate = product.candidate(selection(options))?;

    add(target, candidate, out)
}

/// Remove a line.
///
/// # Errors
///
/// Returns an error if the cart cannot be loaded or saved.
pub fn remove(
    target: &CartTarget,
    product: &str,
    options: Vec<(String, String)>,
    out: &mut impl Write,
) -> Result<CartOutcome, CartCommandError> {
    let mut cart = target.open()?;
    let outcome = cart.remove_item(&ProductId::new(product), &selection(options))?;
    report(&cart, outcome, out)?;
    Ok(outcome)
}

/// Set a line's quantity.
///
/// # Errors
///
/// Returns an error if the cart cannot be loaded or saved.
pub fn set_quantity(
    target: &CartTarget,
    product: &str,
    options: Vec<(String, String)>,
    quantity: i64,
    out: &mut impl Write,
) -> Result<CartOutcome, CartCommandError> {
    let mut cart = target.open()?;
    let outcome = cart.update_quantity(&ProductId::new(product), &selection(options), quantity)?;
    report(&cart, outcome, out)?;
    Ok(outcome)
}

/// Remove every line.
///
/// # Errors
///
/// Returns an error if the cart cannot be loaded or saved.
pub fn clear(target: &CartTarget, out: &mut impl Write) -> Result<CartOutcome, CartCommandError> {
    let mut cart = target.open()?;
    let outcome = cart.clear()?;
    report(&cart, outcome, out)?;
    Ok(outcome)
}

/// Print the notices an operation produced, or a fallback for silent ones.
fn report(
    cart: &CartStore<FileStorage, Vec<Notice>>,
    outcome: CartOutcome,
    out: &mut impl Write,
) -> std::io::Result<()> {
    if cart.notifier().is_empty() {
        if outcome == CartOutcome::NotFound {
            writeln!(out, "No matching line in cart {}", cart.key())?;
        }
        return Ok(());
    }

    for notice in cart.notifier() {
        writeln!(out, "{}", notice.message)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tee(stock: u32) -> ItemCandidate {
        ItemSpec {
            product: "P1".to_string(),
            options: vec![
                ("size".to_string(), "M".to_string()),
                ("color".to_string(), "red".to_string()),
            ],
            name: "Tee".to_string(),
            slug: "tee".to_string(),
            price: Decimal::new(1999, 2),
            stock,
            image: None,
        }
        .into_candidate()
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_parse_option() {
        assert_eq!(
            parse_option("size = M").unwrap(),
            ("size".to_string(), "M".to_string())
        );
        assert!(parse_option("size").is_err());
        assert!(parse_option("=M").is_err());
        assert!(parse_option("size=").is_err());
    }

    #[test]
    fn test_add_show_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let target = CartTarget::new(dir.path(), "cli-cart");

        let mut buf = Vec::new();
        assert_eq!(add(&target, tee(2), &mut buf).unwrap(), CartOutcome::Added);
        add(&target, tee(2), &mut buf).unwrap();
        assert_eq!(
            add(&target, tee(2), &mut buf).unwrap(),
            CartOutcome::StockExceeded { limit: 2 }
        );
        let printed = output(buf);
        assert!(printed.contains("Tee added to cart"));
        assert!(printed.contains("Only 2 of Tee available"));

        let mut buf = Vec::new();
        show(&target, &mut buf).unwrap();
        let printed = output(buf);
        assert!(printed.contains("2 x Tee (red / M) [P1] @ $19.99 = $39.98"));
        assert!(printed.contains("2 items, total $39.98"));

        let mut buf = Vec::new();
        clear(&target, &mut buf).unwrap();
        show(&target, &mut buf).unwrap();
        assert!(output(buf).contains("Cart cli-cart is empty"));
    }

    #[test]
    fn test_option_order_does_not_matter() {
        let dir = tempfile::tempdir().unwrap();
        let target = CartTarget::new(dir.path(), "cli-cart");
        add(&target, tee(5), &mut Vec::new()).unwrap();

        let reversed = vec![
            ("color".to_string(), "red".to_string()),
            ("size".to_string(), "M".to_string()),
        ];
        let outcome = set_quantity(&target, "P1", reversed.clone(), 4, &mut Vec::new()).unwrap();
        assert_eq!(outcome, CartOutcome::QuantityUpdated { quantity: 4 });

        assert_eq!(
            remove(&target, "P1", reversed.clone(), &mut Vec::new()).unwrap(),
            CartOutcome::Removed
        );

        let mut buf = Vec::new();
        assert_eq!(
            remove(&target, "P1", reversed, &mut buf).unwrap(),
            CartOutcome::NotFound
        );
        assert!(output(buf).contains("No matching line"));
    }

    #[test]
    fn test_corrupt_cart_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();
        let target = CartTarget::new(dir.path(), "broken");

        assert!(matches!(
            show(&target, &mut Vec::new()),
            Err(CartCommandError::Cart(_))
        ));
    }
}
