//! Domain types for the product catalog API.
//!
//! These mirror the catalog's JSON responses. Field names are camelCase on
//! the wire.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use shopfront_core::ProductId;

// =============================================================================
// Image Types
// =============================================================================

/// Product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    #[serde(default)]
    pub alt: Option<String>,
}

// =============================================================================
// Variant Types
// =============================================================================

/// One option axis a shopper must choose, e.g. `size` with `S`, `M`, `L`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantOption {
    /// Axis name.
    pub name: String,
    /// Allowed values, in display order.
    pub values: Vec<String>,
}

// =============================================================================
// Product Types
// =============================================================================

/// A product record as served by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Opaque catalog identifier.
    pub id: ProductId,
    /// URL-friendly name.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Long description (plain text).
    #[serde(default)]
    pub description: Option<String>,
    /// Current unit price.
    pub price: Decimal,
    /// Original price when on sale.
    #[serde(default)]
    pub compare_at_price: Option<Decimal>,
    /// Units available. Trusted as an upper bound for cart quantities.
    #[serde(deserialize_with = "stock_ceiling")]
    pub stock: u32,
    /// Images, first is the featured one.
    #[serde(default)]
    pub images: Vec<ProductImage>,
    /// Option axes; empty for products without variants.
    #[serde(default)]
    pub variants: Vec<VariantOption>,
}

impl Product {
    /// Featured image, if any.
    #[must_use]
    pub fn featured_image(&self) -> Option<&ProductImage> {
        self.images.first()
    }

    /// Whether any units can be added to a cart.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Accept any JSON number as a stock count: negatives become 0, fractions
/// are floored, and values past `u32::MAX` saturate.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn stock_ceiling<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let n = serde_json::Number::deserialize(deserializer)?;
    if let Some(v) = n.as_u64() {
        return Ok(u32::try_from(v).unwrap_or(u32::MAX));
    }
    if n.is_i64() {
        return Ok(0);
    }

    let v = n
        .as_f64()
        .ok_or_else(|| serde::de::Error::custom(format!("invalid stock: {n}")))?
        .floor();
    if v <= 0.0 {
        Ok(0)
    } else if v >= f64::from(u32::MAX) {
        Ok(u32::MAX)
    } else {
        Ok(v as u32)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_product_from_catalog_json() {
        let json = r#"{
            "id": "P1",
            "slug": "pineapple-tee",
            "name": "Pineapple Tee",
            "price": "24.00",
            "compareAtPrice": 30,
            "stock": 4,
            "images": [{"url": "https://cdn.example.com/tee.jpg"}],
            "variants": [{"name": "size", "values": ["S", "M"]}]
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id.as_str(), "P1");
        assert_eq!(product.price, Decimal::new(2400, 2));
        assert_eq!(product.compare_at_price, Some(Decimal::new(30, 0)));
        assert_eq!(product.description, None);
        assert!(product.in_stock());
        assert_eq!(
            product.featured_image().map(|i| i.url.as_str()),
            Some("https://cdn.example.com/tee.jpg")
        );
    }

    fn with_stock(stock: &str) -> String {
        format!(
            r#"{{"id": "P1", "slug": "tee", "name": "Tee", "price": "24.00", "stock": {stock}}}"#
        )
    }

    #[test]
    fn test_stock_is_decoded_leniently() {
        for (raw, expected) in [
            ("4", 4),
            ("-1", 0),
            ("5.0", 5),
            ("2.9", 2),
            ("-0.5", 0),
            ("1e12", u32::MAX),
        ] {
            let product: Product = serde_json::from_str(&with_stock(raw)).unwrap();
            assert_eq!(product.stock, expected, "stock {raw}");
        }
        assert!(serde_json::from_str::<Product>(&with_stock(r#""lots""#)).is_err());
    }

    #[test]
    fn test_listing_survives_negative_stock() {
        let listing = format!("[{}, {}]", with_stock("3"), with_stock("-4"));
        let products: Vec<Product> = serde_json::from_str(&listing).unwrap();

        assert_eq!(products.len(), 2);
        assert!(products[0].in_stock());
        assert!(!products[1].in_stock());
    }
}
