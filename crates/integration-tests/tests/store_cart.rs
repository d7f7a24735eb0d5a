//! Cart behaviour of the store against the mock backend.

#![allow(clippy::unwrap_used)]

use cropcare_client::store::{SliceKind, SliceStatus};
use cropcare_core::ProductId;
use cropcare_integration_tests::MockBackend;
use rust_decimal::Decimal;

fn id(s: &str) -> ProductId {
    ProductId::new(s)
}

#[tokio::test]
async fn test_add_to_cart_reloads_from_backend() {
    let backend = MockBackend::start().await.unwrap();
    let store = backend.logged_in_store().await;
    store.refresh_products().await.unwrap();

    store.add_to_cart(&id("p1"), 1).await.unwrap();
    store.add_to_cart(&id("p1"), 2).await.unwrap();

    let cart = store.cart();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0].quantity.get(), 3);
    assert_eq!(store.cart_item_count(), 3);
    assert_eq!(store.cart_total(), Decimal::from(597));

    let state = backend.state();
    assert_eq!(state.count("POST", "/cart/items"), 2);
    // Every mutation is followed by a full reload
    assert_eq!(state.count("GET", "/cart"), 2);
}

#[tokio::test]
async fn test_add_non_positive_quantity_sends_nothing() {
    let backend = MockBackend::start().await.unwrap();
    let store = backend.logged_in_store().await;

    store.add_to_cart(&id("p1"), 0).await.unwrap();

    assert!(backend.state().requests.is_empty());
    assert!(store.cart().is_empty());
}

#[tokio::test]
async fn test_set_quantity_zero_removes_line() {
    let backend = MockBackend::start().await.unwrap();
    let store = backend.logged_in_store().await;
    store.add_to_cart(&id("p1"), 2).await.unwrap();
    store.add_to_cart(&id("p2"), 1).await.unwrap();

    store.set_cart_quantity(&id("p1"), 0).await.unwrap();

    let cart = store.cart();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0].product_id, id("p2"));
    assert_eq!(backend.state().count("DELETE", "/cart/items/p1"), 1);
    assert_eq!(backend.state().count("PUT", "/cart/items/p1"), 0);
}

#[tokio::test]
async fn test_set_quantity_above_max_stores_99() {
    let backend = MockBackend::start().await.unwrap();
    let store = backend.logged_in_store().await;
    store.add_to_cart(&id("p3"), 1).await.unwrap();

    store.set_cart_quantity(&id("p3"), 250).await.unwrap();

    assert_eq!(store.cart()[0].quantity.get(), 99);
    let state = backend.state();
    let update = state
        .requests
        .iter()
        .find(|r| r.method == "PUT" && r.path == "/cart/items/p3")
        .unwrap();
    assert_eq!(update.query.as_deref(), Some("quantity=99"));
    assert_eq!(state.cart, vec![("p3".to_string(), 99)]);
}

#[tokio::test]
async fn test_cart_total_excludes_unknown_products() {
    let backend = MockBackend::start().await.unwrap();
    backend.state().cart = vec![("p1".to_string(), 2), ("discontinued".to_string(), 4)];
    let store = backend.logged_in_store().await;

    store.refresh_all().await.unwrap();

    assert_eq!(store.cart().len(), 2);
    assert_eq!(store.cart_item_count(), 6);
    assert_eq!(store.cart_total(), Decimal::from(398));
}

#[tokio::test]
async fn test_reload_drops_non_positive_lines() {
    let backend = MockBackend::start().await.unwrap();
    backend.state().cart = vec![("p1".to_string(), 0), ("p2".to_string(), -1), ("p4".to_string(), 1)];
    let store = backend.logged_in_store().await;

    store.refresh_cart().await.unwrap();

    let cart = store.cart();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0].product_id, id("p4"));
}

#[tokio::test]
async fn test_remove_and_clear() {
    let backend = MockBackend::start().await.unwrap();
    let store = backend.logged_in_store().await;
    store.add_to_cart(&id("p1"), 1).await.unwrap();
    store.add_to_cart(&id("p2"), 1).await.unwrap();

    store.remove_from_cart(&id("p1")).await.unwrap();
    assert_eq!(store.cart().len(), 1);

    store.clear_cart().await.unwrap();
    assert!(store.cart().is_empty());
    assert_eq!(backend.state().count("DELETE", "/cart"), 1);
}

#[tokio::test]
async fn test_unknown_product_sets_cart_error() {
    let backend = MockBackend::start().await.unwrap();
    let store = backend.logged_in_store().await;

    let err = store.add_to_cart(&id("nope"), 1).await.unwrap_err();

    assert_eq!(err.to_string(), "Product not found");
    let status = store.status(SliceKind::Cart);
    assert!(!status.loading);
    assert_eq!(status.error.as_deref(), Some("Product not found"));
}

#[tokio::test]
async fn test_successful_reload_clears_error() {
    let backend = MockBackend::start().await.unwrap();
    backend
        .state()
        .forced_status
        .insert("GET /cart".to_string(), 500);
    let store = backend.logged_in_store().await;

    let err = store.refresh_cart().await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to fetch cart: Internal Server Error");
    assert_eq!(err.status(), Some(500));

    backend.state().forced_status.clear();
    store.refresh_cart().await.unwrap();
    assert_eq!(store.status(SliceKind::Cart).error, None);
}

#[tokio::test]
async fn test_mutations_ignore_empty_success_bodies() {
    let backend = MockBackend::start().await.unwrap();
    let store = backend.logged_in_store().await;
    store.add_to_cart(&id("p1"), 1).await.unwrap();
    assert_eq!(store.cart().len(), 1);

    {
        // The backend clears the cart but answers 204 with no body
        let mut state = backend.state();
        state.cart.clear();
        state.forced_status.insert("DELETE /cart".to_string(), 204);
        state
            .forced_status
            .insert("POST /cart/items".to_string(), 204);
    }

    store.clear_cart().await.unwrap();
    assert!(store.cart().is_empty());
    assert_eq!(store.status(SliceKind::Cart), SliceStatus::default());

    store.add_to_cart(&id("p2"), 1).await.unwrap();
    assert_eq!(store.status(SliceKind::Cart).error, None);
}
