//! Line items and their identity.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ProductId, VariantSelection};

/// Identity of a cart entry: product plus chosen variant combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineKey {
    pub product_id: ProductId,
    pub variant_selection: VariantSelection,
}

impl LineKey {
    #[must_use]
    pub const fn new(product_id: ProductId, variant_selection: VariantSelection) -> Self {
        Self {
            product_id,
            variant_selection,
        }
    }
}

/// A fully resolved line item that has not been placed in a cart yet.
///
/// Price and stock are snapshots taken from the catalog when the shopper
/// adds the item; the cart never refreshes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemCandidate {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_selection: VariantSelection,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub unit_price: Decimal,
    pub stock_limit: u32,
}

impl ItemCandidate {
    /// Identity this candidate would have in a cart.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey::new(self.product_id.clone(), self.variant_selection.clone())
    }

    /// Place the candidate in a cart with the given quantity.
    #[must_use]
    pub fn with_quantity(self, quantity: u32) -> LineItem {
        LineItem {
            product_id: self.product_id,
            variant_selection: self.variant_selection,
            name: self.name,
            slug: self.slug,
            image_url: self.image_url,
            unit_price: self.unit_price,
            quantity,
            stock_limit: self.stock_limit,
        }
    }
}

/// One row in the cart.
///
/// `1 <= quantity <= stock_limit` holds for every item held by a
/// [`CartStore`](super::CartStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_selection: VariantSelection,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub stock_limit: u32,
}

impl LineItem {
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey::new(self.product_id.clone(), self.variant_selection.clone())
    }

    /// Whether this item has the identity described by `product_id` and
    /// `variant_selection`.
    #[must_use]
    pub fn matches(&self, product_id: &ProductId, variant_selection: &VariantSelection) -> bool {
        self.product_id == *product_id && self.variant_selection == *variant_selection
    }

    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// Copy of this item with a different quantity.
    #[must_use]
    pub fn with_quantity(&self, quantity: u32) -> Self {
        Self {
            quantity,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> ItemCandidate {
        ItemCandidate {
            product_id: ProductId::new("P1"),
            variant_selection: VariantSelection::from_pairs([("color", "red")]),
            name: "Pineapple Tee".to_string(),
            slug: "pineapple-tee".to_string(),
            image_url: None,
            unit_price: Decimal::new(1250, 2),
            stock_limit: 5,
        }
    }

    #[test]
    fn test_line_total() {
        let item = candidate().with_quantity(3);
        assert_eq!(item.line_total(), Decimal::new(3750, 2));
    }

    #[test]
    fn test_matches_uses_product_and_variant() {
        let item = candidate().with_quantity(1);
        let red = VariantSelection::from_pairs([("color", "red")]);
        let blue = VariantSelection::from_pairs([("color", "blue")]);

        assert!(item.matches(&ProductId::new("P1"), &red));
        assert!(!item.matches(&ProductId::new("P1"), &blue));
        assert!(!item.matches(&ProductId::new("P2"), &red));
        assert_eq!(item.key(), candidate().key());
    }

    #[test]
    fn test_camel_case_wire_names() {
        let json = serde_json::to_value(candidate().with_quantity(1)).unwrap_or_default();
        assert!(json.get("productId").is_some());
        assert!(json.get("variantSelection").is_some());
        assert!(json.get("unitPrice").is_some());
        assert!(json.get("stockLimit").is_some());
        assert!(json.get("imageUrl").is_some());
    }
}
