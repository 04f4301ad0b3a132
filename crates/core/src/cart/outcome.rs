//! Results of cart operations.

use serde::Serialize;

/// What a cart operation did.
///
/// None of these are errors: a refused add or an update that targets a
/// missing line leaves the cart untouched and says so here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CartOutcome {
    /// A new line was appended with quantity 1.
    Added,
    /// An existing line now has `quantity`.
    QuantityUpdated { quantity: u32 },
    /// The matching line was dropped.
    Removed,
    /// Every line was dropped.
    Cleared,
    /// The requested quantity is above the line's stock ceiling.
    StockExceeded { limit: u32 },
    /// The candidate has no stock at all.
    OutOfStock,
    /// No line matches the given identity.
    NotFound,
}

impl CartOutcome {
    /// Whether the cart state changed.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(
            self,
            Self::Added | Self::QuantityUpdated { .. } | Self::Removed | Self::Cleared
        )
    }

    /// Whether the operation was refused because of the stock ceiling.
    #[must_use]
    pub const fn is_stock_refusal(&self) -> bool {
        matches!(self, Self::StockExceeded { .. } | Self::OutOfStock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applied_outcomes() {
        assert!(CartOutcome::Added.is_applied());
        assert!(CartOutcome::QuantityUpdated { quantity: 2 }.is_applied());
        assert!(CartOutcome::Removed.is_applied());
        assert!(CartOutcome::Cleared.is_applied());
        assert!(!CartOutcome::StockExceeded { limit: 2 }.is_applied());
        assert!(!CartOutcome::OutOfStock.is_applied());
        assert!(!CartOutcome::NotFound.is_applied());
    }

    #[test]
    fn test_serialized_tag() {
        let json = serde_json::to_string(&CartOutcome::StockExceeded { limit: 3 }).unwrap_or_default();
        assert_eq!(json, r#"{"outcome":"stock_exceeded","limit":3}"#);
    }
}
