//! Cart lines and cart aggregation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::catalog::Product;
use super::id::ProductId;
use super::quantity::Quantity;

/// One product-quantity pair in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product in the cart.
    pub product_id: ProductId,
    /// How many units (always `1..=99`).
    pub quantity: Quantity,
}

impl CartLine {
    /// Create a cart line.
    #[must_use]
    pub const fn new(product_id: ProductId, quantity: Quantity) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Sum of `quantity * price` over the cart.
///
/// Lines whose product is not in `products` are skipped rather than treated
/// as an error, so a stale cart never blocks the total.
#[must_use]
pub fn cart_total(lines: &[CartLine], products: &[Product]) -> Decimal {
    lines
        .iter()
        .filter_map(|line| {
            products
                .iter()
                .find(|p| p.id == line.product_id)
                .map(|p| p.price * Decimal::from(line.quantity.get()))
        })
        .sum()
}

/// Total number of units across all lines.
#[must_use]
pub fn cart_item_count(lines: &[CartLine]) -> u32 {
    lines.iter().map(|l| l.quantity.get()).sum()
}
