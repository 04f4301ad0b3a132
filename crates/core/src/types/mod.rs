//! Core types for Shopfront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod variant;

pub use id::*;
pub use price::{CurrencyCode, Price, UnknownCurrency};
pub use variant::VariantSelection;
