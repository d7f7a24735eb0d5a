//! Conversions from wire types to `cropcare_core` domain types.
//!
//! The backend is lenient about what it sends, so these conversions are too:
//! quantities are clamped, unknown status strings fall back to the default,
//! and timestamps accept several encodings.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use tracing::warn;

use cropcare_core::{CartLine, Order, OrderLine, OrderStatus, PaymentMethod, Quantity};

use super::types::{ApiCart, ApiOrder};

/// Convert a cart response to cart lines.
///
/// Lines with a non-positive quantity are dropped; quantities above the
/// maximum are capped.
#[must_use]
pub fn convert_cart(cart: ApiCart) -> Vec<CartLine> {
    cart.items
        .into_iter()
        .filter_map(|item| Quantity::clamp(item.quantity).map(|q| CartLine::new(item.product_id, q)))
        .collect()
}

/// Convert an order response to an [`Order`].
#[must_use]
pub fn convert_order(order: ApiOrder) -> Order {
    let status = order.status.as_deref().map_or_else(OrderStatus::default, |raw| {
        raw.parse().unwrap_or_else(|e| {
            warn!(order_id = %order.id, error = %e, "Unknown order status, using default");
            OrderStatus::default()
        })
    });

    let payment_method = order
        .payment_method
        .as_deref()
        .map_or_else(PaymentMethod::default, |raw| {
            raw.parse().unwrap_or_else(|e| {
                warn!(order_id = %order.id, error = %e, "Unknown payment method, using default");
                PaymentMethod::default()
            })
        });

    let created_at = order
        .created_at
        .as_ref()
        .and_then(parse_timestamp)
        .unwrap_or_else(|| {
            warn!(order_id = %order.id, "Missing or unparseable order timestamp");
            DateTime::<Utc>::UNIX_EPOCH
        });

    let lines = order
        .items
        .into_iter()
        .filter_map(|item| {
            Quantity::clamp(item.quantity).map(|quantity| OrderLine {
                product_id: item.product_id,
                quantity,
                price: item.price,
            })
        })
        .collect();

    Order {
        id: order.id,
        created_at,
        status,
        address: order.address,
        payment_method,
        lines,
    }
}

/// Convert a list of order responses.
#[must_use]
pub fn convert_orders(orders: Vec<ApiOrder>) -> Vec<Order> {
    orders.into_iter().map(convert_order).collect()
}

/// Parse a timestamp sent as RFC 3339, a naive ISO 8601 datetime (taken as
/// UTC), or epoch milliseconds.
fn parse_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                        .ok()
                        .map(|naive| Utc.from_utc_datetime(&naive))
                })
        }
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}
