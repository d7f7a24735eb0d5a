//! CropCare Core - Shared domain types.
//!
//! This crate provides the types used by every part of the CropCare client:
//! - `client` - API client, local storage, and the application store
//! - `integration-tests` - End-to-end tests against a mock backend
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no persistence. Cart aggregation lives here because it is a pure
//! function of the cart and product snapshots.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, prices, quantities, statuses, input validation,
//!   and the product/cart/order models

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
