//! CropCare backend API client.
//!
//! # Architecture
//!
//! - One [`ApiClient`] for every backend resource; each resource lives in its
//!   own module (`products`, `cart`, `orders`, `user`, `auth`, `plant`)
//! - The bearer token is read from [`LocalStorage`] on every call, so a login
//!   or logout takes effect on the next request without rebuilding the client
//! - Every request carries a fresh `x-request-id` for backend log correlation
//! - Single products are cached in memory via `moka` (5 minute TTL)
//! - No retries, no timeouts: a failed call surfaces immediately
//!
//! # Status handling
//!
//! | Status | Result |
//! |---|---|
//! | 401 on an authenticated endpoint | [`ApiError::AuthenticationRequired`] |
//! | 404 / 400 where the endpoint defines a message | [`ApiError::NotFound`] / [`ApiError::BadRequest`] |
//! | anything else | [`ApiError::Status`] with "Failed to <verb> <resource>: <reason>" |

mod auth;
mod cart;
pub mod conversions;
mod orders;
mod plant;
mod products;
mod user;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use secrecy::ExposeSecret;
use tracing::debug;
use uuid::Uuid;

use cropcare_core::{Product, ProductId};

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::session::Session;
use crate::storage::LocalStorage;

pub use types::*;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// How long a single product stays cached.
const PRODUCT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Maximum number of body characters copied into logs.
const LOG_BODY_LIMIT: usize = 500;

// =============================================================================
// Endpoint error mapping
// =============================================================================

/// How an endpoint turns a non-success status into an [`ApiError`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct Endpoint {
    /// Completes "Failed to ..." (e.g., "fetch cart").
    pub action: &'static str,
    /// Whether the request carries the bearer token.
    pub authenticated: bool,
    /// Message for a 404, if the endpoint has a specific one.
    pub not_found: Option<&'static str>,
    /// Fallback message for a 400 without a `detail` body.
    pub bad_request: Option<&'static str>,
    /// Prefer the body's `detail` over the generic message for any failure.
    pub detail_from_body: bool,
}

impl Endpoint {
    pub(crate) const fn authenticated(action: &'static str) -> Self {
        Self {
            action,
            authenticated: true,
            not_found: None,
            bad_request: None,
            detail_from_body: false,
        }
    }

    pub(crate) const fn with_not_found(mut self, message: &'static str) -> Self {
        self.not_found = Some(message);
        self
    }

    pub(crate) const fn with_bad_request(mut self, fallback: &'static str) -> Self {
        self.bad_request = Some(fallback);
        self
    }

    pub(crate) const fn with_detail_from_body(mut self) -> Self {
        self.detail_from_body = true;
        self
    }
}

/// Map a non-success response to the error the caller sees.
pub(crate) fn map_failure(status: StatusCode, body: &str, endpoint: &Endpoint) -> ApiError {
    if status == StatusCode::UNAUTHORIZED && endpoint.authenticated {
        return ApiError::AuthenticationRequired;
    }

    if status == StatusCode::NOT_FOUND
        && let Some(message) = endpoint.not_found
    {
        return ApiError::NotFound(message.to_string());
    }

    if status == StatusCode::BAD_REQUEST
        && let Some(fallback) = endpoint.bad_request
    {
        return ApiError::BadRequest(error_detail(body).unwrap_or_else(|| fallback.to_string()));
    }

    if endpoint.detail_from_body
        && let Some(detail) = error_detail(body)
    {
        return ApiError::Status {
            status: status.as_u16(),
            message: detail,
        };
    }

    ApiError::Status {
        status: status.as_u16(),
        message: format!("Failed to {}: {}", endpoint.action, status_text(status)),
    }
}

/// Reason phrase for a status (e.g., "Internal Server Error").
pub(crate) fn status_text(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown Status")
}

/// Extract a non-empty `detail` string from an error body.
pub(crate) fn error_detail(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .and_then(|d| match d {
            serde_json::Value::String(s) => Some(s),
            // Validation errors arrive as a list of objects with a `msg`
            serde_json::Value::Array(items) => items
                .iter()
                .find_map(|i| i.get("msg").and_then(serde_json::Value::as_str))
                .map(str::to_string),
            _ => None,
        })
        .filter(|s| !s.trim().is_empty())
}

/// Truncate a body for logging.
pub(crate) fn truncate_body(body: &str) -> String {
    body.chars().take(LOG_BODY_LIMIT).collect()
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the CropCare backend.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    storage: LocalStorage,
    products: Cache<ProductId, Product>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig, storage: LocalStorage) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("cropcare-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let products = Cache::builder()
            .max_capacity(1000)
            .time_to_live(PRODUCT_CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url().to_string(),
                storage,
                products,
            }),
        })
    }

    /// Backend base URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Local storage the client reads its bearer token from.
    #[must_use]
    pub fn storage(&self) -> &LocalStorage {
        &self.inner.storage
    }

    /// Typed session view over the client's storage.
    #[must_use]
    pub fn session(&self) -> Session {
        Session::new(self.inner.storage.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Start a request with the common headers.
    ///
    /// When `authenticated` is set, the bearer token is read from storage now;
    /// a missing token simply omits the `Authorization` header.
    async fn request(&self, method: Method, path: &str, authenticated: bool) -> RequestBuilder {
        let request_id = Uuid::new_v4().to_string();
        debug!(method = method.as_str(), path, request_id = %request_id, "Sending request");

        let mut builder = self
            .inner
            .client
            .request(method, self.url(path))
            .header(REQUEST_ID_HEADER, request_id);

        if authenticated
            && let Some(token) = self.session().access_token().await
        {
            match HeaderValue::from_str(&format!("Bearer {}", token.expose_secret())) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    builder = builder.header(AUTHORIZATION, value);
                }
                Err(_) => tracing::warn!("Stored access token is not a valid header value"),
            }
        }

        builder
    }

    /// Start a request carrying a JSON content type.
    async fn json_request(&self, method: Method, path: &str, authenticated: bool) -> RequestBuilder {
        self.request(method, path, authenticated)
            .await
            .header(CONTENT_TYPE, "application/json")
    }

    /// Send a request and map non-success statuses through `endpoint`.
    async fn send(&self, builder: RequestBuilder, endpoint: &Endpoint) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!(
            status = %status,
            action = endpoint.action,
            body = %truncate_body(&body),
            "Backend returned non-success status"
        );
        Err(map_failure(status, &body, endpoint))
    }

    /// Decode a successful response body as JSON.
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate_body(&text),
                "Failed to parse backend response"
            );
            ApiError::Parse(e.to_string())
        })
    }

    /// Decode a body that should be a JSON array; anything else is empty.
    async fn decode_list<T: DeserializeOwned>(response: Response) -> Result<Vec<T>> {
        let value: serde_json::Value = Self::decode(response).await?;
        if !value.is_array() {
            tracing::warn!("Expected a JSON array, treating response as empty");
            return Ok(Vec::new());
        }
        serde_json::from_value(value).map_err(|e| ApiError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CART: Endpoint = Endpoint::authenticated("fetch cart");

    #[test]
    fn test_map_failure_unauthorized() {
        let err = map_failure(StatusCode::UNAUTHORIZED, "", &CART);
        assert!(err.is_auth_required());
        assert_eq!(err.to_string(), "Authentication required");
    }

    #[test]
    fn test_map_failure_unauthorized_on_public_endpoint_is_generic() {
        let endpoint = Endpoint {
            authenticated: false,
            ..Endpoint::authenticated("analyze plant")
        };
        let err = map_failure(StatusCode::UNAUTHORIZED, "", &endpoint);
        assert_eq!(err.to_string(), "Failed to analyze plant: Unauthorized");
    }

    #[test]
    fn test_map_failure_generic_message() {
        let err = map_failure(StatusCode::INTERNAL_SERVER_ERROR, "boom", &CART);
        assert_eq!(err.to_string(), "Failed to fetch cart: Internal Server Error");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_map_failure_not_found() {
        let endpoint = Endpoint::authenticated("fetch product").with_not_found("Product not found");
        let err = map_failure(StatusCode::NOT_FOUND, "", &endpoint);
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "Product not found"));

        // Endpoints without a 404 message fall back to the generic text
        let err = map_failure(StatusCode::NOT_FOUND, "", &CART);
        assert_eq!(err.to_string(), "Failed to fetch cart: Not Found");
    }

    #[test]
    fn test_map_failure_bad_request_uses_detail() {
        let endpoint = Endpoint::authenticated("create order").with_bad_request("Cart is empty");
        let err = map_failure(
            StatusCode::BAD_REQUEST,
            r#"{"detail":"Address too short"}"#,
            &endpoint,
        );
        assert_eq!(err.to_string(), "Address too short");

        let err = map_failure(StatusCode::BAD_REQUEST, "not json", &endpoint);
        assert_eq!(err.to_string(), "Cart is empty");
    }

    #[test]
    fn test_map_failure_detail_from_body() {
        let endpoint = Endpoint::authenticated("update user").with_detail_from_body();
        let err = map_failure(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail":[{"loc":["body","language"],"msg":"unsupported language"}]}"#,
            &endpoint,
        );
        assert_eq!(err.to_string(), "unsupported language");

        let err = map_failure(StatusCode::CONFLICT, "{}", &endpoint);
        assert_eq!(err.to_string(), "Failed to update user: Conflict");
    }

    #[test]
    fn test_error_detail_ignores_blank() {
        assert_eq!(error_detail(r#"{"detail":"  "}"#), None);
        assert_eq!(error_detail(r#"{"detail":42}"#), None);
        assert_eq!(error_detail(r#"{"detail":"nope"}"#).as_deref(), Some("nope"));
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(2000);
        assert_eq!(truncate_body(&long).len(), LOG_BODY_LIMIT);
        assert_eq!(truncate_body("short"), "short");
    }
}
