//! The cart aggregate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{LineItem, LineKey};
use crate::types::{ProductId, VariantSelection};

/// Ordered line items plus the cart drawer flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub is_open: bool,
}

impl CartState {
    /// `sum(unit_price * quantity)`, unrounded.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(LineItem::line_total).sum()
    }

    /// `sum(quantity)`.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// The line with the given identity, if present.
    #[must_use]
    pub fn find(&self, product_id: &ProductId, variant_selection: &VariantSelection) -> Option<&LineItem> {
        self.items
            .iter()
            .find(|item| item.matches(product_id, variant_selection))
    }

    /// The line with the given key, if present.
    #[must_use]
    pub fn get(&self, key: &LineKey) -> Option<&LineItem> {
        self.find(&key.product_id, &key.variant_selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::ItemCandidate;

    fn item(id: &str, price: i64, quantity: u32) -> LineItem {
        ItemCandidate {
            product_id: ProductId::new(id),
            variant_selection: VariantSelection::new(),
            name: id.to_string(),
            slug: id.to_lowercase(),
            image_url: None,
            unit_price: Decimal::new(price, 2),
            stock_limit: 10,
        }
        .with_quantity(quantity)
    }

    #[test]
    fn test_empty_state() {
        let state = CartState::default();
        assert_eq!(state.total(), Decimal::ZERO);
        assert_eq!(state.item_count(), 0);
        assert!(!state.is_open);
    }

    #[test]
    fn test_totals() {
        let state = CartState {
            items: vec![item("A", 1000, 2), item("B", 250, 3)],
            is_open: false,
        };
        assert_eq!(state.total(), Decimal::new(2750, 2));
        assert_eq!(state.item_count(), 5);
    }

    #[test]
    fn test_find() {
        let state = CartState {
            items: vec![item("A", 1000, 2)],
            is_open: false,
        };
        assert!(state.find(&ProductId::new("A"), &VariantSelection::new()).is_some());
        assert!(state.find(&ProductId::new("B"), &VariantSelection::new()).is_none());
    }
}
