//! The cart store: a persisted line-item ledger.

use rust_decimal::Decimal;

use super::snapshot::{self, SnapshotError};
use super::{
    CartError, CartOutcome, CartState, CartStorage, ItemCandidate, LineItem, LineKey,
    NoopNotifier, Notice, Notifier,
};
use crate::types::{ProductId, VariantSelection};

/// Storage key used when a caller has no better one.
pub const DEFAULT_CART_KEY: &str = "shopfront-cart";

/// Authoritative local record of what the shopper intends to buy.
///
/// The store owns its [`CartState`], a storage backend, and a notifier.
/// Every operation runs to completion synchronously:
///
/// 1. compute the new item list (never mutated in place),
/// 2. emit a [`Notice`] for outcomes that have one,
/// 3. write a snapshot if the state changed.
///
/// If the write fails the error is returned, but the in-memory state has
/// already moved on; callers decide whether to retry or discard the store.
///
/// # Example
///
/// ```
/// use rust_decimal::Decimal;
/// use shopfront_core::cart::{CartOutcome, CartStore, ItemCandidate, MemoryStorage};
/// use shopfront_core::{ProductId, VariantSelection};
///
/// let mut cart = CartStore::empty(MemoryStorage::new(), "cart");
/// let tee = ItemCandidate {
///     product_id: ProductId::new("P1"),
///     variant_selection: VariantSelection::from_pairs([("color", "red")]),
///     name: "Tee".into(),
///     slug: "tee".into(),
///     image_url: None,
///     unit_price: Decimal::new(10, 0),
///     stock_limit: 2,
/// };
///
/// assert_eq!(cart.add_item(tee.clone())?, CartOutcome::Added);
/// assert_eq!(cart.add_item(tee.clone())?, CartOutcome::QuantityUpdated { quantity: 2 });
/// assert_eq!(cart.add_item(tee)?, CartOutcome::StockExceeded { limit: 2 });
/// assert_eq!(cart.total(), Decimal::new(20, 0));
/// # Ok::<(), shopfront_core::cart::CartError>(())
/// ```
#[derive(Debug)]
pub struct CartStore<S, N = NoopNotifier> {
    state: CartState,
    storage: S,
    notifier: N,
    key: String,
}

impl<S: CartStorage> CartStore<S, NoopNotifier> {
    /// A fresh, empty cart that does not emit notices. Nothing is read from
    /// `storage`; the first mutation overwrites whatever is stored under `key`.
    pub fn empty(storage: S, key: impl Into<String>) -> Self {
        Self::with_notifier(storage, key, NoopNotifier)
    }
}

impl<S: CartStorage, N: Notifier> CartStore<S, N> {
    /// A fresh, empty cart reporting to `notifier`.
    pub fn with_notifier(storage: S, key: impl Into<String>, notifier: N) -> Self {
        Self {
            state: CartState::default(),
            storage,
            notifier,
            key: key.into(),
        }
    }

    /// Rehydrate the cart stored under `key`, or start empty if nothing is
    /// stored there.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read or the stored snapshot
    /// is malformed or from a newer version.
    pub fn open(storage: S, key: impl Into<String>, notifier: N) -> Result<Self, CartError> {
        let key = key.into();
        let state = match storage.load(&key)? {
            Some(raw) => snapshot::decode(&raw)?,
            None => CartState::default(),
        };

        Ok(Self {
            state,
            storage,
            notifier,
            key,
        })
    }

    /// Like [`open`](Self::open), but a snapshot that does not decode is
    /// deleted and the cart starts empty. The decode error is handed back so
    /// the caller can log it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read, or the unreadable
    /// snapshot cannot be deleted.
    pub fn open_or_reset(
        mut storage: S,
        key: impl Into<String>,
        notifier: N,
    ) -> Result<(Self, Option<SnapshotError>), CartError> {
        let key = key.into();
        let (state, discarded) = match storage.load(&key)? {
            Some(raw) => match snapshot::decode(&raw) {
                Ok(state) => (state, None),
                Err(e) => {
                    storage.remove(&key)?;
                    (CartState::default(), Some(e))
                }
            },
            None => (CartState::default(), None),
        };

        let cart = Self {
            state,
            storage,
            notifier,
            key,
        };
        Ok((cart, discarded))
    }

    /// Dispose of the store, handing back its backend and notifier.
    pub fn into_parts(self) -> (S, N) {
        (self.storage, self.notifier)
    }

    // =========================================================================
    // Read accessors
    // =========================================================================

    #[must_use]
    pub const fn state(&self) -> &CartState {
        &self.state
    }

    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.state.items
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.state.is_open
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.items.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.state.items.len()
    }

    /// `sum(unit_price * quantity)` over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.state.total()
    }

    /// `sum(quantity)` over all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.state.item_count()
    }

    /// Quantity held for `key`, if the line exists.
    #[must_use]
    pub fn quantity_of(&self, key: &LineKey) -> Option<u32> {
        self.state.get(key).map(|item| item.quantity)
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub const fn notifier(&self) -> &N {
        &self.notifier
    }

    pub const fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of `candidate`.
    ///
    /// Merges into an existing line with the same identity, bounded by that
    /// line's stock ceiling. A new line needs a positive stock ceiling.
    ///
    /// # Errors
    ///
    /// Returns an error only if persisting the new state fails.
    pub fn add_item(&mut self, candidate: ItemCandidate) -> Result<CartOutcome, CartError> {
        let existing = self
            .state
            .find(&candidate.product_id, &candidate.variant_selection)
            .map(|item| (item.quantity, item.stock_limit));

        let outcome = match existing {
            Some((quantity, stock_limit)) => {
                let new_quantity = quantity.saturating_add(1);
                if new_quantity <= stock_limit {
                    self.state.items = self.replace_quantity(
                        &candidate.product_id,
                        &candidate.variant_selection,
                        new_quantity,
                    );
                    CartOutcome::QuantityUpdated {
                        quantity: new_quantity,
                    }
                } else {
                    CartOutcome::StockExceeded { limit: stock_limit }
                }
            }
            None if candidate.stock_limit > 0 => {
                let name = candidate.name.clone();
                let mut items = self.state.items.clone();
                items.push(candidate.with_quantity(1));
                self.state.items = items;
                return self.finish(CartOutcome::Added, &name);
            }
            None => CartOutcome::OutOfStock,
        };

        self.finish(outcome, &candidate.name)
    }

    /// Drop the line with the given identity. Removing a missing line is a
    /// no-op that reports [`CartOutcome::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns an error only if persisting the new state fails.
    pub fn remove_item(
        &mut self,
        product_id: &ProductId,
        variant_selection: &VariantSelection,
    ) -> Result<CartOutcome, CartError> {
        let Some(name) = self
            .state
            .find(product_id, variant_selection)
            .map(|item| item.name.clone())
        else {
            return Ok(CartOutcome::NotFound);
        };

        self.state.items = self.without(product_id, variant_selection);
        self.finish(CartOutcome::Removed, &name)
    }

    /// Set the quantity of a line.
    ///
    /// `new_quantity <= 0` removes the line; a quantity above the line's
    /// stock ceiling is refused and leaves the line unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error only if persisting the new state fails.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        variant_selection: &VariantSelection,
        new_quantity: i64,
    ) -> Result<CartOutcome, CartError> {
        let Some((name, stock_limit)) = self
            .state
            .find(product_id, variant_selection)
            .map(|item| (item.name.clone(), item.stock_limit))
        else {
            return Ok(CartOutcome::NotFound);
        };

        if new_quantity <= 0 {
            self.state.items = self.without(product_id, variant_selection);
            return self.finish(CartOutcome::Removed, &name);
        }

        let outcome = match u32::try_from(new_quantity) {
            Ok(quantity) if quantity <= stock_limit => {
                self.state.items = self.replace_quantity(product_id, variant_selection, quantity);
                CartOutcome::QuantityUpdated { quantity }
            }
            _ => CartOutcome::StockExceeded { limit: stock_limit },
        };

        self.finish(outcome, &name)
    }

    /// Empty the cart. Always succeeds as far as the cart is concerned.
    ///
    /// # Errors
    ///
    /// Returns an error only if persisting the new state fails.
    pub fn clear(&mut self) -> Result<CartOutcome, CartError> {
        self.state.items = Vec::new();
        self.finish(CartOutcome::Cleared, "")
    }

    /// Show the cart drawer.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting the flag fails.
    pub fn open_cart(&mut self) -> Result<(), CartError> {
        self.set_open(true)
    }

    /// Hide the cart drawer.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting the flag fails.
    pub fn close_cart(&mut self) -> Result<(), CartError> {
        self.set_open(false)
    }

    fn set_open(&mut self, is_open: bool) -> Result<(), CartError> {
        if self.state.is_open == is_open {
            return Ok(());
        }
        self.state.is_open = is_open;
        self.persist()
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn replace_quantity(
        &self,
        product_id: &ProductId,
        variant_selection: &VariantSelection,
        quantity: u32,
    ) -> Vec<LineItem> {
        self.state
            .items
            .iter()
            .map(|item| {
                if item.matches(product_id, variant_selection) {
                    item.with_quantity(quantity)
                } else {
                    item.clone()
                }
            })
            .collect()
    }

    fn without(&self, product_id: &ProductId, variant_selection: &VariantSelection) -> Vec<LineItem> {
        self.state
            .items
            .iter()
            .filter(|item| !item.matches(product_id, variant_selection))
            .cloned()
            .collect()
    }

    fn finish(&mut self, outcome: CartOutcome, name: &str) -> Result<CartOutcome, CartError> {
        if let Some(notice) = Notice::for_outcome(outcome, name) {
            self.notifier.notify(notice);
        }
        if outcome.is_applied() {
            self.persist()?;
        }
        Ok(outcome)
    }

    fn persist(&mut self) -> Result<(), CartError> {
        let raw = snapshot::encode(&self.state)?;
        self.storage.save(&self.key, &raw)?;
        Ok(())
    }
}
