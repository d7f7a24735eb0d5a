//! Checkout and order history against the mock backend.

#![allow(clippy::unwrap_used)]

use cropcare_client::store::{ADDRESS_NOT_PROVIDED, PlaceOrder, SliceKind};
use cropcare_client::{AppStore, LocalStorage, storage::keys};
use cropcare_core::{OrderId, OrderStatus, PaymentMethod, ProductId};
use cropcare_integration_tests::{MockBackend, TEST_TOKEN};
use rust_decimal::Decimal;

fn place(address: &str) -> PlaceOrder {
    PlaceOrder {
        address: address.to_string(),
    }
}

#[tokio::test]
async fn test_place_order_snapshots_prices_and_clears_cart() {
    let backend = MockBackend::start().await.unwrap();
    let store = backend.logged_in_store().await;
    store.refresh_products().await.unwrap();
    store.add_to_cart(&ProductId::new("p1"), 2).await.unwrap();

    let order_id = store.place_order(place("  Village Road 4  ")).await.unwrap();

    let order = store.order_by_id(&order_id).unwrap();
    assert_eq!(order.lines.len(), 1);
    assert_eq!(order.lines[0].product_id, ProductId::new("p1"));
    assert_eq!(order.lines[0].quantity.get(), 2);
    assert_eq!(order.lines[0].price, Decimal::from(199));
    assert_eq!(order.total(), Decimal::from(398));
    assert_eq!(order.status, OrderStatus::Placed);
    assert_eq!(order.payment_method, PaymentMethod::Cod);
    assert_eq!(order.address, "Village Road 4");

    assert!(store.cart().is_empty());
    assert_eq!(store.cart_total(), Decimal::ZERO);
    assert_eq!(store.orders()[0].id, order_id);
}

#[tokio::test]
async fn test_place_order_prepends_to_history() {
    let backend = MockBackend::start().await.unwrap();
    let store = backend.logged_in_store().await;

    store.add_to_cart(&ProductId::new("p1"), 1).await.unwrap();
    let first = store.place_order(place("Farm 1")).await.unwrap();
    store.add_to_cart(&ProductId::new("p2"), 1).await.unwrap();
    let second = store.place_order(place("Farm 2")).await.unwrap();

    let ids: Vec<OrderId> = store.orders().into_iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![second, first]);
}

#[tokio::test]
async fn test_blank_address_is_replaced() {
    let backend = MockBackend::start().await.unwrap();
    let store = backend.logged_in_store().await;
    store.add_to_cart(&ProductId::new("p4"), 1).await.unwrap();

    let order_id = store.place_order(place("   ")).await.unwrap();

    assert_eq!(
        store.order_by_id(&order_id).unwrap().address,
        ADDRESS_NOT_PROVIDED
    );
    assert_eq!(backend.state().orders[0]["address"], ADDRESS_NOT_PROVIDED);
}

#[tokio::test]
async fn test_empty_cart_order_fails() {
    let backend = MockBackend::start().await.unwrap();
    let store = backend.logged_in_store().await;

    let err = store.place_order(place("Farm 1")).await.unwrap_err();

    assert_eq!(err.to_string(), "Cart is empty");
    assert_eq!(
        store.status(SliceKind::Orders).error.as_deref(),
        Some("Cart is empty")
    );
    assert!(store.orders().is_empty());
}

#[tokio::test]
async fn test_orders_cache_survives_restart() {
    let backend = MockBackend::start().await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");

    {
        let storage = LocalStorage::open(Some(&path)).await.unwrap();
        storage.set(keys::ACCESS_TOKEN, TEST_TOKEN).await.unwrap();
        let store = AppStore::new(backend.client_with(storage.clone()), storage);
        store.add_to_cart(&ProductId::new("p2"), 3).await.unwrap();
        store.place_order(place("Farm 9")).await.unwrap();
        let order_id = store.orders()[0].id.clone();
        assert!(store.set_order_status(&order_id, OrderStatus::Shipped).await);
    }

    let storage = LocalStorage::open(Some(&path)).await.unwrap();
    let store = AppStore::new(backend.client_with(storage.clone()), storage);
    store.hydrate().await;

    let orders = store.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].status, OrderStatus::Shipped);
    assert_eq!(orders[0].lines[0].quantity.get(), 3);
    // Hydration is local only
    assert_eq!(backend.state().count("GET", "/orders"), 0);
}

#[tokio::test]
async fn test_refresh_orders_replaces_history() {
    let backend = MockBackend::start().await.unwrap();
    let store = backend.logged_in_store().await;
    store.add_to_cart(&ProductId::new("p1"), 1).await.unwrap();
    store.place_order(place("Farm 1")).await.unwrap();

    // Backend history is the source of truth
    backend.state().orders.clear();
    store.refresh_orders().await.unwrap();
    assert!(store.orders().is_empty());
}

#[tokio::test]
async fn test_get_order_not_found() {
    let backend = MockBackend::start().await.unwrap();
    let store = backend.logged_in_store().await;

    let err = store
        .api()
        .get_order(&OrderId::new("ORD-404"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Order not found");
}

#[tokio::test]
async fn test_get_order_round_trip() {
    let backend = MockBackend::start().await.unwrap();
    let store = backend.logged_in_store().await;
    store.add_to_cart(&ProductId::new("p3"), 1).await.unwrap();
    let order_id = store.place_order(place("Farm 3")).await.unwrap();

    let order = store.api().get_order(&order_id).await.unwrap();
    assert_eq!(order.id, order_id);
    assert_eq!(order.created_at.to_rfc3339(), "2025-06-01T10:00:00+00:00");
}
