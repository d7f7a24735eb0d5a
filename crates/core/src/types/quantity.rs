//! Cart line quantity.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A cart or order line quantity in the range `1..=99`.
///
/// Raw quantities from user input or the backend go through [`Quantity::clamp`]:
/// anything non-positive means "remove the line" and yields `None`, anything
/// above [`Quantity::MAX`] is capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(u8);

impl Quantity {
    /// Largest quantity a single line may hold.
    pub const MAX: u8 = 99;

    /// A quantity of one.
    pub const ONE: Self = Self(1);

    /// Clamp a raw quantity into the valid range.
    ///
    /// Returns `None` when `raw <= 0`.
    #[must_use]
    pub fn clamp(raw: i64) -> Option<Self> {
        if raw <= 0 {
            return None;
        }
        let capped = raw.min(i64::from(Self::MAX));
        u8::try_from(capped).ok().map(Self)
    }

    /// Get the quantity as a `u32`.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0 as u32
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for Quantity {
    type Error = String;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::clamp(raw).ok_or_else(|| format!("quantity must be positive (got {raw})"))
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.get()
    }
}
