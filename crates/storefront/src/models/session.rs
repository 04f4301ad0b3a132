//! Session-related types.
//!
//! Types stored in the session to tie a browser to its cart and its last
//! confirmed order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopfront_core::cart::LineItem;
use shopfront_core::{OrderNumber, ProductId, VariantSelection};
use uuid::Uuid;

/// Random per-browser cart identifier.
///
/// The cart itself lives in cart storage; the session only holds this token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartToken(Uuid);

impl CartToken {
    /// Generate a fresh token.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Key under which this browser's cart is stored.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("cart-{}", self.0)
    }
}

/// One purchased line as shown on the confirmation page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedLine {
    pub product_id: ProductId,
    pub variant_selection: VariantSelection,
    pub name: String,
    pub quantity: u32,
    pub line_total: Decimal,
}

impl From<&LineItem> for ConfirmedLine {
    fn from(item: &LineItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            variant_selection: item.variant_selection.clone(),
            name: item.name.clone(),
            quantity: item.quantity,
            line_total: item.line_total(),
        }
    }
}

/// The most recent simulated order, kept only in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub order_number: OrderNumber,
    pub email: String,
    pub lines: Vec<ConfirmedLine>,
    pub total: Decimal,
    pub placed_at: DateTime<Utc>,
}

impl OrderConfirmation {
    /// Build a confirmation for `items` with a fresh order number.
    #[must_use]
    pub fn new(email: String, items: &[LineItem]) -> Self {
        let lines: Vec<ConfirmedLine> = items.iter().map(ConfirmedLine::from).collect();
        let total = lines.iter().map(|line| line.line_total).sum();
        Self {
            order_number: generate_order_number(),
            email,
            lines,
            total,
            placed_at: Utc::now(),
        }
    }
}

/// `SF-` followed by eight uppercase hex characters.
#[must_use]
pub fn generate_order_number() -> OrderNumber {
    let hex = Uuid::new_v4().simple().to_string();
    let suffix: String = hex.chars().take(8).collect::<String>().to_uppercase();
    OrderNumber::new(format!("SF-{suffix}"))
}

/// Session keys.
pub mod keys {
    /// Key for storing the browser's cart token.
    pub const CART_TOKEN: &str = "cart_token";

    /// Key for the last order confirmation.
    pub const LAST_ORDER: &str = "last_order";
}

#[cfg(test)]
mod tests {
    use shopfront_core::cart::ItemCandidate;

    use super::*;

    #[test]
    fn test_storage_key_is_a_valid_cart_key() {
        let key = CartToken::generate().storage_key();
        assert!(key.starts_with("cart-"));
        assert!(
            key.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_order_number_format() {
        let number = generate_order_number();
        let s = number.as_str();
        assert_eq!(s.len(), 11);
        assert!(s.starts_with("SF-"));
        assert!(
            s.chars()
                .skip(3)
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }

    #[test]
    fn test_confirmation_totals() {
        let item = ItemCandidate {
            product_id: ProductId::new("P1"),
            variant_selection: VariantSelection::new(),
            name: "Tee".to_string(),
            slug: "tee".to_string(),
            image_url: None,
            unit_price: Decimal::new(1000, 2),
            stock_limit: 5,
        }
        .with_quantity(3);

        let confirmation = OrderConfirmation::new("a@example.com".to_string(), &[item]);
        assert_eq!(confirmation.total, Decimal::new(3000, 2));
        assert_eq!(confirmation.lines.len(), 1);
    }
}
