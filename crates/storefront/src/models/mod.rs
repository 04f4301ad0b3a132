//! Domain models for the storefront.

pub mod session;

pub use session::{CartToken, ConfirmedLine, OrderConfirmation, keys as session_keys};
