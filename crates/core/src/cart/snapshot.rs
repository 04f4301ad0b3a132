//! Persisted cart format.
//!
//! A snapshot is a single JSON object:
//!
//! ```json
//! { "version": 1, "items": [ ... ], "isOpen": false }
//! ```
//!
//! Snapshots written before the `version` field existed are read as
//! version 0. Every snapshot is normalized on load so the line-item
//! invariants hold even if the stored data was edited by hand.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{CartState, LineItem};

/// Version written by this build.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Errors reading or writing a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The stored value is not a valid snapshot document.
    #[error("invalid cart snapshot: {0}")]
    Json(#[from] serde_json::Error),

    /// The snapshot was written by a newer build.
    #[error("cart snapshot version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRef<'a> {
    version: u32,
    items: &'a [LineItem],
    is_open: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSnapshot {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    items: Vec<LineItem>,
    #[serde(default)]
    is_open: bool,
}

/// Serialize `state` as a current-version snapshot.
///
/// # Errors
///
/// Returns [`SnapshotError::Json`] if serialization fails.
pub fn encode(state: &CartState) -> Result<String, SnapshotError> {
    let snapshot = SnapshotRef {
        version: SNAPSHOT_VERSION,
        items: &state.items,
        is_open: state.is_open,
    };
    Ok(serde_json::to_string(&snapshot)?)
}

/// Parse a snapshot, migrating older versions and normalizing the items.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or the version is newer than
/// [`SNAPSHOT_VERSION`].
pub fn decode(raw: &str) -> Result<CartState, SnapshotError> {
    let stored: StoredSnapshot = serde_json::from_str(raw)?;

    if stored.version > SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            found: stored.version,
            supported: SNAPSHOT_VERSION,
        });
    }

    // Version 0 and 1 share the same shape; only normalization differs in
    // practice, because version 0 writers did not enforce the stock ceiling.
    Ok(CartState {
        items: normalize(stored.items),
        is_open: stored.is_open,
    })
}

/// Enforce `1 <= quantity <= stock_limit` and unique identities.
///
/// Duplicates are merged into the first occurrence, summing quantities and
/// clamping to that occurrence's stock ceiling.
#[must_use]
pub fn normalize(items: Vec<LineItem>) -> Vec<LineItem> {
    let mut out: Vec<LineItem> = Vec::with_capacity(items.len());

    for item in items {
        if item.quantity == 0 || item.stock_limit == 0 {
            continue;
        }

        if let Some(existing) = out
            .iter_mut()
            .find(|e| e.matches(&item.product_id, &item.variant_selection))
        {
            existing.quantity = existing
                .quantity
                .saturating_add(item.quantity)
                .min(existing.stock_limit);
        } else {
            let quantity = item.quantity.min(item.stock_limit);
            out.push(LineItem { quantity, ..item });
        }
    }

    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::cart::ItemCandidate;
    use crate::types::{ProductId, VariantSelection};

    fn item(id: &str, variant: &[(&str, &str)], quantity: u32, stock: u32) -> LineItem {
        ItemCandidate {
            product_id: ProductId::new(id),
            variant_selection: VariantSelection::from_pairs(variant.iter().copied()),
            name: id.to_string(),
            slug: id.to_lowercase(),
            image_url: None,
            unit_price: Decimal::new(500, 2),
            stock_limit: stock,
        }
        .with_quantity(quantity)
    }

    #[test]
    fn test_encode_then_decode_preserves_state() {
        let state = CartState {
            items: vec![item("A", &[("size", "M")], 2, 4), item("B", &[], 1, 1)],
            is_open: true,
        };
        let raw = encode(&state).unwrap();
        assert!(raw.contains("\"version\":1"));
        assert!(raw.contains("\"isOpen\":true"));
        assert_eq!(decode(&raw).unwrap(), state);
    }

    #[test]
    fn test_legacy_snapshot_without_version() {
        let raw = r#"{
            "items": [{
                "productId": "P1",
                "variantSelection": {"size": "M", "color": "red"},
                "name": "Tee",
                "slug": "tee",
                "imageUrl": null,
                "unitPrice": "10",
                "quantity": 5,
                "stockLimit": 3
            }],
            "isOpen": false
        }"#;

        let state = decode(raw).unwrap();
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.items[0].quantity, 3);
        assert_eq!(
            state.items[0].variant_selection,
            VariantSelection::from_pairs([("color", "red"), ("size", "M")])
        );
    }

    #[test]
    fn test_future_version_is_rejected() {
        let err = decode(r#"{"version": 99, "items": [], "isOpen": false}"#).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::UnsupportedVersion {
                found: 99,
                supported: SNAPSHOT_VERSION
            }
        ));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        assert!(matches!(decode("{not json"), Err(SnapshotError::Json(_))));
    }

    #[test]
    fn test_normalize_merges_and_drops() {
        let items = vec![
            item("A", &[("color", "red")], 2, 3),
            item("B", &[], 0, 5),
            item("C", &[], 1, 0),
            item("A", &[("color", "red")], 2, 3),
        ];
        let out = normalize(items);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].product_id.as_str(), "A");
        assert_eq!(out[0].quantity, 3);
    }
}
