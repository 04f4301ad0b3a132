//! Shopfront Core - Shared types and the shopping cart store.
//!
//! This crate provides the types used across all Shopfront components:
//! - `storefront` - Public-facing web shop
//! - `cli` - Command-line cart tools
//!
//! # Architecture
//!
//! The core crate contains types, traits, and the synchronous cart store.
//! No network access, no HTTP clients, no filesystem code. Persistence goes
//! through the [`cart::CartStorage`] trait so backends live with their users.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, and variant selections
//! - [`cart`] - Line items, the cart store, and its snapshot format

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use types::*;
