//! Wire types for the CropCare backend.
//!
//! These mirror the JSON the backend sends and accepts. They stay separate
//! from the `cropcare_core` domain types; see [`super::conversions`] for the
//! mapping.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cropcare_core::{MobileNumber, OrderId, OtpCode, ProductId};

// =============================================================================
// Error Bodies
// =============================================================================

/// Error body shape (`{"detail": ...}`).
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    /// A message string, or a list of validation errors.
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

// =============================================================================
// Cart Types
// =============================================================================

/// A cart as returned by `/cart` endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCart {
    /// Server-side cart id.
    #[serde(default)]
    pub cart_id: Option<String>,
    /// Cart items.
    #[serde(default)]
    pub items: Vec<ApiCartItem>,
    /// Server-computed total.
    #[serde(default)]
    pub total: Decimal,
}

/// One item in an [`ApiCart`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCartItem {
    /// Product id.
    pub product_id: ProductId,
    /// Raw quantity (clamped during conversion).
    pub quantity: i64,
    /// Product name at the time of the response.
    #[serde(default)]
    pub product_name: Option<String>,
    /// Product price at the time of the response.
    #[serde(default)]
    pub product_price: Option<Decimal>,
}

/// Body for `POST /cart/items`.
#[derive(Debug, Clone, Serialize)]
pub struct AddToCartRequest<'a> {
    /// Product to add.
    pub product_id: &'a ProductId,
    /// Units to add.
    pub quantity: u32,
}

// =============================================================================
// Order Types
// =============================================================================

/// An order as returned by `/orders` endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiOrder {
    /// Order id.
    pub id: OrderId,
    /// Status string (e.g., "PLACED").
    #[serde(default)]
    pub status: Option<String>,
    /// Server-computed total.
    #[serde(default)]
    pub total_amount: Option<Decimal>,
    /// Delivery address.
    #[serde(default)]
    pub address: String,
    /// Payment method string (e.g., "COD").
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Creation time: RFC 3339, naive ISO 8601, or epoch milliseconds.
    #[serde(default)]
    pub created_at: Option<serde_json::Value>,
    /// Ordered items.
    #[serde(default)]
    pub items: Vec<ApiOrderItem>,
}

/// One item in an [`ApiOrder`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiOrderItem {
    /// Product id.
    pub product_id: ProductId,
    /// Raw quantity (clamped during conversion).
    pub quantity: i64,
    /// Unit price snapshot.
    pub price: Decimal,
    /// Product name snapshot.
    #[serde(default)]
    pub product_name: Option<String>,
}

/// Body for `POST /orders`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderRequest<'a> {
    /// Delivery address.
    pub address: &'a str,
}

// =============================================================================
// User & Auth Types
// =============================================================================

/// Body for `PUT /auth/user`. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateUserRequest {
    /// Preferred language code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Body for `POST /auth/request-otp`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOtpRequest<'a> {
    /// Number to send the code to.
    pub mobile_number: &'a MobileNumber,
}

/// Response of `POST /auth/request-otp`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestOtpResponse {
    /// Whether a code was sent.
    #[serde(default)]
    pub success: bool,
    /// Failure reason, if any.
    #[serde(default)]
    pub message: Option<String>,
}

/// Body for `POST /auth/verify-otp`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest<'a> {
    /// Number the code was sent to.
    pub mobile_number: &'a MobileNumber,
    /// The code the user typed.
    pub otp: &'a OtpCode,
}

/// Response of a successful `POST /auth/verify-otp`.
#[derive(Clone, Deserialize)]
pub struct VerifyOtpResponse {
    /// Bearer token for authenticated calls.
    pub access_token: String,
    /// Token for renewing the access token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Profile of the logged-in user.
    #[serde(default)]
    pub user: serde_json::Value,
}

impl std::fmt::Debug for VerifyOtpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifyOtpResponse")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// Profile of the logged-in user.
///
/// Only the fields the app reads are typed; everything else is kept in
/// `extra` so the stored profile round-trips unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Mobile number used to log in.
    #[serde(
        default,
        rename = "mobileNumber",
        alias = "mobile_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub mobile_number: Option<String>,
    /// Preferred language code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserProfile {
    /// User id as a string, whether the backend sent a number or a string.
    #[must_use]
    pub fn id_string(&self) -> Option<String> {
        match self.id.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}
