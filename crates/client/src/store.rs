//! Application store: products, cart and orders with per-slice state.
//!
//! The backend owns all data. The store keeps the last fetched snapshot of
//! each slice and never edits the cart locally: every cart mutation is a
//! backend call followed by a full cart reload. Order history is the one
//! exception; it is also persisted to local storage so it can be shown
//! before the first fetch, and its status can be updated locally.
//!
//! Overlapping calls are neither serialized nor deduplicated; whichever
//! reload finishes last wins.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use cropcare_core::{
    CartLine, Order, OrderId, OrderStatus, Product, ProductId, Quantity, cart_item_count,
    cart_total,
};

use crate::api::ApiClient;
use crate::api::conversions::convert_cart;
use crate::error::{ApiError, Result, add_breadcrumb, report};
use crate::session::Session;
use crate::storage::{LocalStorage, keys};

/// Address used when checkout is submitted without one.
pub const ADDRESS_NOT_PROVIDED: &str = "Address not provided";

/// One independently loaded part of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceKind {
    Products,
    Cart,
    Orders,
}

/// Loading and error state of a slice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SliceStatus {
    /// A fetch or mutation is in flight.
    pub loading: bool,
    /// Message of the last failure, cleared by the next successful fetch.
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct Slice<T> {
    data: T,
    status: SliceStatus,
}

impl<T> Slice<T> {
    fn replace(&mut self, data: T) {
        self.data = data;
        self.status = SliceStatus::default();
    }
}

#[derive(Debug, Default)]
struct StoreState {
    products: Slice<Vec<Product>>,
    cart: Slice<Vec<CartLine>>,
    orders: Slice<Vec<Order>>,
}

impl StoreState {
    fn status_mut(&mut self, kind: SliceKind) -> &mut SliceStatus {
        match kind {
            SliceKind::Products => &mut self.products.status,
            SliceKind::Cart => &mut self.cart.status,
            SliceKind::Orders => &mut self.orders.status,
        }
    }

    fn status(&self, kind: SliceKind) -> &SliceStatus {
        match kind {
            SliceKind::Products => &self.products.status,
            SliceKind::Cart => &self.cart.status,
            SliceKind::Orders => &self.orders.status,
        }
    }
}

/// Checkout form input.
#[derive(Debug, Clone, Default)]
pub struct PlaceOrder {
    /// Delivery address as typed.
    pub address: String,
}

/// The application store.
///
/// Cheaply cloneable via `Arc`; clones share the same state.
#[derive(Clone)]
pub struct AppStore {
    inner: Arc<AppStoreInner>,
}

struct AppStoreInner {
    api: ApiClient,
    storage: LocalStorage,
    state: RwLock<StoreState>,
}

impl std::fmt::Debug for AppStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppStore")
            .field("api", &self.inner.api)
            .finish_non_exhaustive()
    }
}

impl AppStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(api: ApiClient, storage: LocalStorage) -> Self {
        Self {
            inner: Arc::new(AppStoreInner {
                api,
                storage,
                state: RwLock::new(StoreState::default()),
            }),
        }
    }

    /// The API client the store calls.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Session view over the store's storage.
    #[must_use]
    pub fn session(&self) -> Session {
        Session::new(self.inner.storage.clone())
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, kind: SliceKind) {
        self.write().status_mut(kind).loading = true;
    }

    /// Record a failure on a slice and hand the error back to the caller.
    fn fail(&self, kind: SliceKind, err: ApiError) -> ApiError {
        report(&err);
        warn!(slice = ?kind, error = %err, "Store operation failed");
        let mut state = self.write();
        let status = state.status_mut(kind);
        status.loading = false;
        status.error = Some(err.to_string());
        err
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Reload the product list.
    ///
    /// # Errors
    ///
    /// Returns the API error, which is also recorded on the products slice.
    #[instrument(skip(self))]
    pub async fn refresh_products(&self) -> Result<()> {
        self.begin(SliceKind::Products);
        match self.inner.api.list_products().await {
            Ok(products) => {
                debug!(count = products.len(), "Products reloaded");
                self.write().products.replace(products);
                Ok(())
            }
            Err(e) => Err(self.fail(SliceKind::Products, e)),
        }
    }

    /// Reload the cart.
    ///
    /// # Errors
    ///
    /// Returns the API error, which is also recorded on the cart slice.
    #[instrument(skip(self))]
    pub async fn refresh_cart(&self) -> Result<()> {
        self.begin(SliceKind::Cart);
        match self.inner.api.get_cart().await {
            Ok(cart) => {
                let lines = convert_cart(cart);
                debug!(lines = lines.len(), "Cart reloaded");
                self.write().cart.replace(lines);
                Ok(())
            }
            Err(e) => Err(self.fail(SliceKind::Cart, e)),
        }
    }

    /// Reload the order history and persist it.
    ///
    /// # Errors
    ///
    /// Returns the API error, which is also recorded on the orders slice.
    #[instrument(skip(self))]
    pub async fn refresh_orders(&self) -> Result<()> {
        self.begin(SliceKind::Orders);
        match self.inner.api.list_orders().await {
            Ok(orders) => {
                debug!(count = orders.len(), "Orders reloaded");
                self.write().orders.replace(orders);
                self.persist_orders().await;
                Ok(())
            }
            Err(e) => Err(self.fail(SliceKind::Orders, e)),
        }
    }

    /// Reload products, then cart, then orders.
    ///
    /// # Errors
    ///
    /// Returns the first error; later slices are not reloaded.
    pub async fn refresh_all(&self) -> Result<()> {
        self.refresh_products().await?;
        self.refresh_cart().await?;
        self.refresh_orders().await
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add units of a product, then reload the cart.
    ///
    /// The quantity is clamped to `1..=99`; a non-positive quantity does
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns the API error, which is also recorded on the cart slice.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_to_cart(&self, product_id: &ProductId, quantity: i64) -> Result<()> {
        let Some(quantity) = Quantity::clamp(quantity) else {
            debug!("Ignoring add with non-positive quantity");
            return Ok(());
        };

        add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));
        self.begin(SliceKind::Cart);
        if let Err(e) = self.inner.api.add_to_cart(product_id, quantity).await {
            return Err(self.fail(SliceKind::Cart, e));
        }
        self.refresh_cart().await
    }

    /// Set a line's quantity, then reload the cart.
    ///
    /// A non-positive quantity removes the line; above 99 is capped.
    ///
    /// # Errors
    ///
    /// Returns the API error, which is also recorded on the cart slice.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn set_cart_quantity(&self, product_id: &ProductId, quantity: i64) -> Result<()> {
        let Some(quantity) = Quantity::clamp(quantity) else {
            return self.remove_from_cart(product_id).await;
        };

        add_breadcrumb(
            "cart",
            "Changed quantity",
            Some(&[
                ("product_id", product_id.as_str()),
                ("quantity", quantity.to_string().as_str()),
            ]),
        );
        self.begin(SliceKind::Cart);
        if let Err(e) = self.inner.api.update_cart_item(product_id, quantity).await {
            return Err(self.fail(SliceKind::Cart, e));
        }
        self.refresh_cart().await
    }

    /// Remove a line, then reload the cart.
    ///
    /// # Errors
    ///
    /// Returns the API error, which is also recorded on the cart slice.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_from_cart(&self, product_id: &ProductId) -> Result<()> {
        add_breadcrumb("cart", "Removed from cart", Some(&[("product_id", product_id.as_str())]));
        self.begin(SliceKind::Cart);
        if let Err(e) = self.inner.api.remove_from_cart(product_id).await {
            return Err(self.fail(SliceKind::Cart, e));
        }
        self.refresh_cart().await
    }

    /// Empty the cart, then reload it.
    ///
    /// # Errors
    ///
    /// Returns the API error, which is also recorded on the cart slice.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<()> {
        add_breadcrumb("cart", "Cleared cart", None);
        self.begin(SliceKind::Cart);
        if let Err(e) = self.inner.api.clear_cart().await {
            return Err(self.fail(SliceKind::Cart, e));
        }
        self.refresh_cart().await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Place an order for the current cart.
    ///
    /// The new order is prepended to the history, the history is persisted,
    /// and the cart is reloaded. A failed cart reload is recorded on the cart
    /// slice but does not fail the order.
    ///
    /// # Errors
    ///
    /// Returns the API error from order creation, which is also recorded on
    /// the orders slice.
    #[instrument(skip(self, request))]
    pub async fn place_order(&self, request: PlaceOrder) -> Result<OrderId> {
        let trimmed = request.address.trim();
        let address = if trimmed.is_empty() {
            ADDRESS_NOT_PROVIDED
        } else {
            trimmed
        };

        add_breadcrumb("checkout", "Placing order", None);
        self.begin(SliceKind::Orders);
        let order = match self.inner.api.create_order(address).await {
            Ok(order) => order,
            Err(e) => return Err(self.fail(SliceKind::Orders, e)),
        };

        let order_id = order.id.clone();
        {
            let mut state = self.write();
            state.orders.data.retain(|o| o.id != order_id);
            state.orders.data.insert(0, order);
            state.orders.status = SliceStatus::default();
        }
        self.persist_orders().await;
        info!(order_id = %order_id, "Order placed");

        if let Err(e) = self.refresh_cart().await {
            warn!(error = %e, "Cart reload after order failed");
        }

        Ok(order_id)
    }

    /// Update an order's status in the local history and persist it.
    ///
    /// Returns `false` if the order is not in the history.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn set_order_status(&self, order_id: &OrderId, status: OrderStatus) -> bool {
        let found = {
            let mut state = self.write();
            if let Some(order) = state.orders.data.iter_mut().find(|o| &o.id == order_id) {
                order.status = status;
                true
            } else {
                false
            }
        };

        if found {
            self.persist_orders().await;
        } else {
            debug!("Order not in history");
        }
        found
    }

    /// Load the persisted order history.
    ///
    /// Malformed entries are skipped; an unreadable cache loads nothing.
    #[instrument(skip(self))]
    pub async fn hydrate(&self) {
        let raw = match self
            .inner
            .storage
            .get_json::<Vec<serde_json::Value>>(keys::ORDERS_CACHE)
            .await
        {
            Ok(raw) => raw.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Orders cache is unreadable, ignoring it");
                Vec::new()
            }
        };

        let total = raw.len();
        let orders: Vec<Order> = raw
            .into_iter()
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect();
        if orders.len() < total {
            warn!(skipped = total - orders.len(), "Skipped malformed cached orders");
        }

        debug!(count = orders.len(), "Orders hydrated");
        self.write().orders.data = orders;
    }

    async fn persist_orders(&self) {
        let orders = self.read().orders.data.clone();
        if let Err(e) = self.inner.storage.set_json(keys::ORDERS_CACHE, &orders).await {
            report(&ApiError::Storage(e));
        }
    }

    // =========================================================================
    // Snapshot lookups
    // =========================================================================

    /// All products.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.read().products.data.clone()
    }

    /// All cart lines.
    #[must_use]
    pub fn cart(&self) -> Vec<CartLine> {
        self.read().cart.data.clone()
    }

    /// Order history, newest first.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.read().orders.data.clone()
    }

    /// Loading and error state of a slice.
    #[must_use]
    pub fn status(&self, kind: SliceKind) -> SliceStatus {
        self.read().status(kind).clone()
    }

    /// Find a product by id.
    #[must_use]
    pub fn product_by_id(&self, id: &ProductId) -> Option<Product> {
        self.read()
            .products
            .data
            .iter()
            .find(|p| &p.id == id)
            .cloned()
    }

    /// Find an order by id.
    #[must_use]
    pub fn order_by_id(&self, id: &OrderId) -> Option<Order> {
        self.read().orders.data.iter().find(|o| &o.id == id).cloned()
    }

    /// Cart total over lines whose product is loaded.
    #[must_use]
    pub fn cart_total(&self) -> Decimal {
        let state = self.read();
        cart_total(&state.cart.data, &state.products.data)
    }

    /// Units across all cart lines.
    #[must_use]
    pub fn cart_item_count(&self) -> u32 {
        cart_item_count(&self.read().cart.data)
    }

    /// The `n` cheapest products.
    #[must_use]
    pub fn recommended_products(&self, n: usize) -> Vec<Product> {
        let mut products = self.products();
        products.sort_by(|a, b| a.price.cmp(&b.price));
        products.truncate(n);
        products
    }
}
