//! Status enums for various entities.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a status string is not recognised.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct StatusParseError {
    /// Which enum failed to parse.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Placed,
    Shipped,
    Delivered,
}

impl OrderStatus {
    /// Wire representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Placed => "PLACED",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PLACED" => Ok(Self::Placed),
            "SHIPPED" => Ok(Self::Shipped),
            "DELIVERED" => Ok(Self::Delivered),
            _ => Err(StatusParseError {
                kind: "order status",
                value: s.to_string(),
            }),
        }
    }
}

/// How an order is paid for.
///
/// Cash on delivery is the only method the backend accepts today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    Cod,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cod => write!(f, "COD"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "COD" => Ok(Self::Cod),
            _ => Err(StatusParseError {
                kind: "payment method",
                value: s.to_string(),
            }),
        }
    }
}

/// Category of an issue found by plant analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionKind {
    Disease,
    Deficiency,
    Pest,
    #[serde(other)]
    Other,
}
