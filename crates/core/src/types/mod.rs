//! Core types for CropCare.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod catalog;
pub mod id;
pub mod mobile;
pub mod order;
pub mod price;
pub mod quantity;
pub mod status;

pub use cart::{CartLine, cart_item_count, cart_total};
pub use catalog::Product;
pub use id::*;
pub use mobile::{MobileNumber, MobileNumberError, OtpCode, OtpError};
pub use order::{Order, OrderLine};
pub use price::{CurrencyCode, Price};
pub use quantity::Quantity;
pub use status::*;
