//! Integration test support for the CropCare client.
//!
//! [`MockBackend`] is an in-process axum server on `127.0.0.1:0` that speaks
//! the CropCare REST API closely enough to drive `ApiClient` and `AppStore`
//! end to end. Tests can read and modify its state between calls.
//!
//! # Routes
//!
//! ```text
//! GET    /products              - Product list (bearer)
//! GET    /products/{id}         - Product detail (bearer)
//! GET    /cart                  - Current cart (bearer)
//! POST   /cart/items            - Add to cart (bearer)
//! PUT    /cart/items/{id}       - Set quantity via ?quantity= (bearer)
//! DELETE /cart/items/{id}       - Remove line (bearer)
//! DELETE /cart                  - Clear cart (bearer)
//! GET    /orders                - Order list, newest first (bearer)
//! GET    /orders/{id}           - Order detail (bearer)
//! POST   /orders                - Create order from cart (bearer)
//! PUT    /auth/user             - Update profile (bearer)
//! POST   /auth/request-otp      - Send OTP
//! POST   /auth/verify-otp       - Verify OTP
//! POST   /plant/analyze         - Analyze photo (multipart)
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use cropcare_client::{ApiClient, AppStore, ClientConfig, LocalStorage, storage::keys};
use cropcare_core::{Product, ProductId};

/// Bearer token the mock accepts.
pub const TEST_TOKEN: &str = "test-token";

/// Refresh token returned on login.
pub const TEST_REFRESH_TOKEN: &str = "test-refresh-token";

/// The only OTP the mock accepts.
pub const TEST_OTP: &str = "123456";

/// Mobile numbers starting with this digit are refused an OTP.
pub const BLOCKED_PREFIX: char = '0';

/// Timestamp stamped on created orders.
pub const ORDER_CREATED_AT: &str = "2025-06-01T10:00:00Z";

/// A request the mock received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method (e.g., "GET").
    pub method: String,
    /// Path without query string.
    pub path: String,
    /// Query string, if any.
    pub query: Option<String>,
    /// `x-request-id` header, if sent.
    pub request_id: Option<String>,
    /// `Authorization` header, if sent.
    pub authorization: Option<String>,
}

/// A photo received on `/plant/analyze`.
#[derive(Debug, Clone)]
pub struct ReceivedUpload {
    /// Multipart field name.
    pub field: String,
    /// File name on the part.
    pub file_name: Option<String>,
    /// Content type on the part.
    pub content_type: Option<String>,
    /// Uploaded bytes.
    pub bytes: Vec<u8>,
}

/// Mutable backend state.
#[derive(Debug, Default)]
pub struct BackendState {
    /// Catalog.
    pub products: Vec<Product>,
    /// Cart lines as raw `(product_id, quantity)` pairs, in insertion order.
    pub cart: Vec<(String, i64)>,
    /// Orders in wire format, newest first.
    pub orders: Vec<Value>,
    /// Every request, in arrival order.
    pub requests: Vec<RecordedRequest>,
    /// Every photo upload.
    pub uploads: Vec<ReceivedUpload>,
    /// Last body received on `PUT /auth/user`.
    pub last_user_update: Option<Value>,
    /// Replaces the `GET /products` body when set.
    pub products_body: Option<Value>,
    /// Status and raw body returned by `/plant/analyze`.
    pub plant_response: (u16, String),
    /// Forced statuses keyed by "METHOD /path"; the body is empty.
    pub forced_status: HashMap<String, u16>,
    next_order: u32,
}

impl BackendState {
    fn cart_json(&self) -> Value {
        let mut total = Decimal::ZERO;
        let items: Vec<Value> = self
            .cart
            .iter()
            .map(|(id, quantity)| {
                let product = self.products.iter().find(|p| p.id.as_str() == id);
                if let Some(p) = product {
                    total += p.price * Decimal::from(*quantity);
                }
                json!({
                    "product_id": id,
                    "quantity": quantity,
                    "product_name": product.map(|p| p.name.clone()),
                    "product_price": product.map(|p| p.price),
                })
            })
            .collect();
        json!({"cart_id": "cart-1", "items": items, "total": total})
    }

    /// Number of requests received for `method` and `path`.
    #[must_use]
    pub fn count(&self, method: &str, path: &str) -> usize {
        self.requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

/// The leaf-rust answer wrapped in a model-output envelope.
#[must_use]
pub fn leaf_rust_envelope() -> String {
    json!({
        "output": [{"content": [{"text": "{\"disease_name\":\"Leaf Rust\"}"}]}]
    })
    .to_string()
}

/// A catalog product.
#[must_use]
pub fn product(id: &str, name: &str, price: i64) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        price: Decimal::from(price),
        unit: None,
        tags: Vec::new(),
        description: None,
        images: Vec::new(),
        stock_quantity: 50,
        is_active: true,
    }
}

/// The default catalog.
#[must_use]
pub fn sample_products() -> Vec<Product> {
    vec![
        product("p1", "Neem Oil Spray", 199),
        product("p2", "Copper Fungicide", 299),
        product("p3", "NPK Fertilizer", 349),
        product("p4", "Micronutrient Mix", 129),
    ]
}

type SharedState = Arc<Mutex<BackendState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, BackendState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process mock of the CropCare backend.
///
/// The server stops when the value is dropped.
pub struct MockBackend {
    addr: SocketAddr,
    state: SharedState,
    handle: JoinHandle<()>,
}

impl MockBackend {
    /// Start a backend seeded with [`sample_products`].
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state: SharedState = Arc::new(Mutex::new(BackendState {
            products: sample_products(),
            plant_response: (200, leaf_rust_envelope()),
            ..BackendState::default()
        }));

        let app = Router::new()
            .route("/products", get(list_products))
            .route("/products/{id}", get(get_product))
            .route("/cart", get(get_cart).delete(clear_cart))
            .route("/cart/items", post(add_to_cart))
            .route("/cart/items/{id}", put(update_cart_item).delete(remove_from_cart))
            .route("/orders", get(list_orders).post(create_order))
            .route("/orders/{id}", get(get_order))
            .route("/auth/user", put(update_user))
            .route("/auth/request-otp", post(request_otp))
            .route("/auth/verify-otp", post(verify_otp))
            .route("/plant/analyze", post(analyze_plant))
            .layer(middleware::from_fn_with_state(state.clone(), record_request))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            addr,
            state,
            handle,
        })
    }

    /// Base URL of the server.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Lock the backend state.
    pub fn state(&self) -> MutexGuard<'_, BackendState> {
        lock(&self.state)
    }

    /// An API client with empty in-memory storage (logged out).
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn client(&self) -> ApiClient {
        self.client_with(LocalStorage::in_memory())
    }

    /// An API client over the given storage.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn client_with(&self, storage: LocalStorage) -> ApiClient {
        let config = ClientConfig::for_base_url(&self.base_url()).expect("mock base URL is valid");
        ApiClient::new(&config, storage).expect("client builds")
    }

    /// A store whose storage already holds [`TEST_TOKEN`].
    ///
    /// # Panics
    ///
    /// Panics if storage or the client cannot be set up.
    #[allow(clippy::expect_used)]
    pub async fn logged_in_store(&self) -> AppStore {
        let storage = LocalStorage::in_memory();
        storage
            .multi_set(&[
                (keys::ACCESS_TOKEN, TEST_TOKEN.to_string()),
                (keys::IS_LOGGED_IN, "true".to_string()),
            ])
            .await
            .expect("in-memory storage write");
        AppStore::new(self.client_with(storage.clone()), storage)
    }

    /// A store with empty storage (no token).
    #[must_use]
    pub fn logged_out_store(&self) -> AppStore {
        let storage = LocalStorage::in_memory();
        AppStore::new(self.client_with(storage.clone()), storage)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// =============================================================================
// Middleware
// =============================================================================

/// Record every request and apply forced statuses.
async fn record_request(State(state): State<SharedState>, request: Request, next: Next) -> Response {
    let recorded = {
        let header = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };
        RecordedRequest {
            method: request.method().to_string(),
            path: request.uri().path().to_string(),
            query: request.uri().query().map(String::from),
            request_id: header("x-request-id"),
            authorization: header(AUTHORIZATION.as_str()),
        }
    };

    let forced = {
        let mut state = lock(&state);
        let key = format!("{} {}", recorded.method, recorded.path);
        state.requests.push(recorded);
        state.forced_status.get(&key).copied()
    };

    if let Some(code) = forced {
        return StatusCode::from_u16(code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response();
    }

    next.run(request).await
}

fn authorized(headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("Bearer {TEST_TOKEN}");
    match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Not authenticated"})),
        )
            .into_response()),
    }
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

// =============================================================================
// Products
// =============================================================================

async fn list_products(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    if let Err(response) = authorized(&headers) {
        return response;
    }
    let state = lock(&state);
    match &state.products_body {
        Some(body) => Json(body.clone()).into_response(),
        None => Json(json!(state.products)).into_response(),
    }
}

async fn get_product(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = authorized(&headers) {
        return response;
    }
    let state = lock(&state);
    state.products.iter().find(|p| p.id.as_str() == id).map_or_else(
        || detail(StatusCode::NOT_FOUND, "Product not found"),
        |p| Json(json!(p)).into_response(),
    )
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Deserialize)]
struct AddToCartBody {
    product_id: String,
    quantity: i64,
}

#[derive(Deserialize)]
struct QuantityQuery {
    quantity: i64,
}

async fn get_cart(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    if let Err(response) = authorized(&headers) {
        return response;
    }
    Json(lock(&state).cart_json()).into_response()
}

async fn add_to_cart(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<AddToCartBody>,
) -> Response {
    if let Err(response) = authorized(&headers) {
        return response;
    }
    let mut state = lock(&state);
    if !state.products.iter().any(|p| p.id.as_str() == body.product_id) {
        return detail(StatusCode::NOT_FOUND, "Product not found");
    }
    match state.cart.iter().position(|(id, _)| *id == body.product_id) {
        Some(index) => {
            if let Some((_, quantity)) = state.cart.get_mut(index) {
                *quantity += body.quantity;
            }
        }
        None => state.cart.push((body.product_id, body.quantity)),
    }
    Json(state.cart_json()).into_response()
}

async fn update_cart_item(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<QuantityQuery>,
) -> Response {
    if let Err(response) = authorized(&headers) {
        return response;
    }
    let mut state = lock(&state);
    if let Some((_, quantity)) = state.cart.iter_mut().find(|(line, _)| *line == id) {
        *quantity = query.quantity;
    }
    Json(state.cart_json()).into_response()
}

async fn remove_from_cart(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = authorized(&headers) {
        return response;
    }
    let mut state = lock(&state);
    state.cart.retain(|(line, _)| *line != id);
    Json(state.cart_json()).into_response()
}

async fn clear_cart(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    if let Err(response) = authorized(&headers) {
        return response;
    }
    let mut state = lock(&state);
    state.cart.clear();
    Json(state.cart_json()).into_response()
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Deserialize)]
struct CreateOrderBody {
    address: String,
}

async fn list_orders(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    if let Err(response) = authorized(&headers) {
        return response;
    }
    Json(json!(lock(&state).orders)).into_response()
}

async fn get_order(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = authorized(&headers) {
        return response;
    }
    let state = lock(&state);
    state
        .orders
        .iter()
        .find(|o| o["id"] == id.as_str())
        .map_or_else(
            || detail(StatusCode::NOT_FOUND, "Order not found"),
            |o| Json(o.clone()).into_response(),
        )
}

async fn create_order(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<CreateOrderBody>,
) -> Response {
    if let Err(response) = authorized(&headers) {
        return response;
    }
    let mut state = lock(&state);
    if state.cart.is_empty() {
        // Bare 400 so the client falls back to its own message
        return StatusCode::BAD_REQUEST.into_response();
    }

    state.next_order += 1;
    let id = format!("ORD-{}", state.next_order);
    let mut total = Decimal::ZERO;
    let items: Vec<Value> = state
        .cart
        .iter()
        .filter_map(|(product_id, quantity)| {
            let product = state.products.iter().find(|p| p.id.as_str() == product_id)?;
            total += product.price * Decimal::from(*quantity);
            Some(json!({
                "product_id": product_id,
                "quantity": quantity,
                "price": product.price,
                "product_name": product.name,
            }))
        })
        .collect();

    let order = json!({
        "id": id,
        "status": "PLACED",
        "total_amount": total,
        "address": body.address,
        "payment_method": "COD",
        "created_at": ORDER_CREATED_AT,
        "items": items,
    });
    state.orders.insert(0, order.clone());
    state.cart.clear();
    Json(order).into_response()
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OtpBody {
    mobile_number: String,
    #[serde(default)]
    otp: Option<String>,
}

async fn update_user(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = authorized(&headers) {
        return response;
    }
    if body["language"] == "xx" {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "Unsupported language");
    }
    lock(&state).last_user_update = Some(body.clone());
    Json(body).into_response()
}

async fn request_otp(Json(body): Json<OtpBody>) -> Response {
    if body.mobile_number.starts_with(BLOCKED_PREFIX) {
        return Json(json!({"success": false, "message": "Number is blocked"})).into_response();
    }
    Json(json!({"success": true})).into_response()
}

async fn verify_otp(Json(body): Json<OtpBody>) -> Response {
    if body.otp.as_deref() != Some(TEST_OTP) {
        return StatusCode::BAD_REQUEST.into_response();
    }
    Json(json!({
        "access_token": TEST_TOKEN,
        "refresh_token": TEST_REFRESH_TOKEN,
        "user": {"id": 42, "mobileNumber": body.mobile_number, "village": "Rampur"},
    }))
    .into_response()
}

// =============================================================================
// Plant analysis
// =============================================================================

async fn analyze_plant(State(state): State<SharedState>, mut multipart: Multipart) -> Response {
    let mut uploads = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        };
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(String::from);
        let content_type = field.content_type().map(String::from);
        match field.bytes().await {
            Ok(bytes) => uploads.push(ReceivedUpload {
                field: name,
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            }),
            Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        }
    }

    let mut state = lock(&state);
    state.uploads.extend(uploads);
    let (code, body) = state.plant_response.clone();
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        [("content-type", "application/json")],
        body,
    )
        .into_response()
}
