//! Order history model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{OrderId, ProductId};
use super::quantity::Quantity;
use super::status::{OrderStatus, PaymentMethod};

/// One line of a placed order.
///
/// `price` is the unit price captured when the order was placed, so later
/// catalog price changes never rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    /// Ordered product.
    pub product_id: ProductId,
    /// Units ordered.
    pub quantity: Quantity,
    /// Unit price snapshot.
    pub price: Decimal,
}

impl OrderLine {
    /// Line subtotal (`quantity * price`).
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity.get())
    }
}

/// A placed order as shown in the order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Order id assigned by the backend.
    pub id: OrderId,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Delivery address.
    pub address: String,
    /// Payment method.
    pub payment_method: PaymentMethod,
    /// Ordered lines.
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// Order total from the price snapshots.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(OrderLine::subtotal).sum()
    }

    /// Total number of units ordered.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity.get()).sum()
    }
}
