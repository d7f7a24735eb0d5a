//! Product catalog model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// A treatment product offered in the shop.
///
/// Server-owned; the client only ever holds a read-only snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product id.
    pub id: ProductId,
    /// Display name (e.g., "Neem Oil Spray").
    pub name: String,
    /// Unit price in rupees.
    pub price: Decimal,
    /// Pack size label (e.g., "250 ml").
    pub unit: Option<String>,
    /// Free-form tags (e.g., `["organic", "spray"]`).
    #[serde(default)]
    pub tags: Vec<String>,
    /// Longer description, if the backend has one.
    #[serde(default)]
    pub description: Option<String>,
    /// Image URLs.
    #[serde(default)]
    pub images: Vec<String>,
    /// Units in stock.
    #[serde(default)]
    pub stock_quantity: i64,
    /// Whether the product is currently sold.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

impl Product {
    /// The unit price with currency, for display.
    #[must_use]
    pub fn unit_price(&self) -> Price {
        Price::inr(self.price)
    }

    /// Whether the product carries the given tag (case-insensitive).
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_defaults_optional_fields() {
        let product: Product =
            serde_json::from_str(r#"{"id":"p1","name":"Neem Oil Spray","price":199,"unit":"250 ml"}"#)
                .unwrap();
        assert_eq!(product.price, Decimal::from(199));
        assert!(product.tags.is_empty());
        assert!(product.is_active);
        assert_eq!(product.unit_price().display(), "₹199");
    }

    #[test]
    fn test_has_tag() {
        let product: Product = serde_json::from_str(
            r#"{"id":"p1","name":"Neem Oil Spray","price":199,"unit":null,"tags":["Organic","spray"]}"#,
        )
        .unwrap();
        assert!(product.has_tag("organic"));
        assert!(!product.has_tag("fungicide"));
    }
}
