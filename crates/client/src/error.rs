//! Error types for backend calls, plus Sentry helpers.
//!
//! Every API operation returns `Result<T, ApiError>`. The `Display` text of an
//! `ApiError` is the human-readable message the app shows the user, so status
//! mappings produce final strings such as "Authentication required" or
//! "Failed to fetch cart: Internal Server Error".

use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request never completed (DNS, connection refused, TLS, ...).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Backend answered 401 on a bearer-authenticated endpoint.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Resource-specific 404 (e.g., "Product not found").
    #[error("{0}")]
    NotFound(String),

    /// Resource-specific 400 (e.g., "Cart is empty").
    #[error("{0}")]
    BadRequest(String),

    /// Any other non-success status.
    #[error("{message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message shown to the user.
        message: String,
    },

    /// Backend answered 2xx but reported failure in the body (OTP flows).
    #[error("{0}")]
    Rejected(String),

    /// Response body could not be decoded.
    #[error("Unexpected response: {0}")]
    Parse(String),

    /// Input rejected before any request was made.
    #[error("{0}")]
    Invalid(String),

    /// Reading a local file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Local storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// Whether the user must log in again.
    #[must_use]
    pub const fn is_auth_required(&self) -> bool {
        matches!(self, Self::AuthenticationRequired)
    }

    /// HTTP status attached to this error, if the backend produced one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::AuthenticationRequired => Some(401),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the error is worth reporting to Sentry.
    ///
    /// User-caused failures (bad input, expired login, empty cart) are not.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Status { .. } | Self::Parse(_) | Self::Io(_) | Self::Storage(_)
        )
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Capture an error to Sentry if it is reportable.
pub fn report(err: &ApiError) {
    if err.is_reportable() {
        let event_id = sentry::capture_error(err);
        tracing::error!(
            error = %err,
            sentry_event_id = %event_id,
            "Backend call failed"
        );
    }
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "p1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

/// Set the Sentry user context after login.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context on logout.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        assert_eq!(
            ApiError::AuthenticationRequired.to_string(),
            "Authentication required"
        );
        assert_eq!(
            ApiError::NotFound("Product not found".to_string()).to_string(),
            "Product not found"
        );
        let err = ApiError::Status {
            status: 500,
            message: "Failed to fetch cart: Internal Server Error".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to fetch cart: Internal Server Error");
    }

    #[test]
    fn test_api_error_status() {
        assert_eq!(ApiError::AuthenticationRequired.status(), Some(401));
        assert_eq!(
            ApiError::Status {
                status: 503,
                message: String::new()
            }
            .status(),
            Some(503)
        );
        assert_eq!(ApiError::Rejected("no".to_string()).status(), None);
    }

    #[test]
    fn test_reportable_classification() {
        assert!(!ApiError::AuthenticationRequired.is_reportable());
        assert!(!ApiError::BadRequest("Cart is empty".to_string()).is_reportable());
        assert!(!ApiError::Invalid("bad".to_string()).is_reportable());
        assert!(ApiError::Parse("eof".to_string()).is_reportable());
        assert!(
            ApiError::Status {
                status: 500,
                message: String::new()
            }
            .is_reportable()
        );
    }

    #[test]
    fn test_breadcrumb_without_client_is_noop() {
        add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "p1")]));
        clear_sentry_user();
    }
}
