//! Shopper-facing notices emitted by the cart store.
//!
//! Notices are a presentation side channel. Callers that need to branch on
//! what happened should use the returned [`CartOutcome`] instead.

use serde::{Deserialize, Serialize};

use super::CartOutcome;

/// Severity of a notice, used by the UI to pick a toast style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
}

/// A short, human-readable message about a cart change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    /// Default notice for an outcome affecting the item called `name`.
    ///
    /// Returns `None` for outcomes that are silent (`NotFound`).
    #[must_use]
    pub fn for_outcome(outcome: CartOutcome, name: &str) -> Option<Self> {
        let notice = match outcome {
            CartOutcome::Added => Self::new(NoticeLevel::Success, format!("{name} added to cart")),
            CartOutcome::QuantityUpdated { quantity } => Self::new(
                NoticeLevel::Success,
                format!("{name} quantity updated to {quantity}"),
            ),
            CartOutcome::Removed => {
                Self::new(NoticeLevel::Info, format!("{name} removed from cart"))
            }
            CartOutcome::Cleared => Self::new(NoticeLevel::Info, "Cart cleared"),
            CartOutcome::StockExceeded { limit } => Self::new(
                NoticeLevel::Warning,
                format!("Only {limit} of {name} available"),
            ),
            CartOutcome::OutOfStock => {
                Self::new(NoticeLevel::Warning, format!("{name} is out of stock"))
            }
            CartOutcome::NotFound => return None,
        };
        Some(notice)
    }
}

/// Sink for notices.
pub trait Notifier {
    fn notify(&mut self, notice: Notice);
}

/// Discards every notice.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&mut self, _notice: Notice) {}
}

/// Collects notices in order, e.g. to render them after a request.
impl Notifier for Vec<Notice> {
    fn notify(&mut self, notice: Notice) {
        self.push(notice);
    }
}

impl<N: Notifier + ?Sized> Notifier for &mut N {
    fn notify(&mut self, notice: Notice) {
        (**self).notify(notice);
    }
}
