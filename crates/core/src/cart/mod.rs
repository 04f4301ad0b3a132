//! Client-side shopping cart.
//!
//! # Overview
//!
//! - [`CartStore`] - the line-item ledger and its operations
//! - [`LineItem`], [`ItemCandidate`], [`LineKey`] - rows and their identity
//! - [`CartOutcome`] - what each operation did
//! - [`Notice`], [`Notifier`] - shopper-facing messages
//! - [`CartStorage`], [`MemoryStorage`] - persistence backends
//! - [`snapshot`] - the versioned JSON format written to storage
//!
//! Two lines are the same entry when their product ID and variant selection
//! are equal. Variant selections are sorted maps, so the order in which the
//! options were chosen does not matter.

mod line_item;
mod notice;
mod outcome;
pub mod snapshot;
mod state;
mod storage;
mod store;

pub use line_item::{ItemCandidate, LineItem, LineKey};
pub use notice::{NoopNotifier, Notice, NoticeLevel, Notifier};
pub use outcome::CartOutcome;
pub use snapshot::{SNAPSHOT_VERSION, SnapshotError};
pub use state::CartState;
pub use storage::{CartStorage, MemoryStorage, StorageError};
pub use store::{CartStore, DEFAULT_CART_KEY};

use thiserror::Error;

/// Errors from loading or persisting a cart.
#[derive(Debug, Error)]
pub enum CartError {
    /// The storage backend failed.
    #[error("cart storage error: {0}")]
    Storage(#[from] StorageError),

    /// The stored snapshot could not be read or written.
    #[error("cart snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}
