//! Authentication, request metadata and profile updates.

#![allow(clippy::unwrap_used)]

use cropcare_client::api::UpdateUserRequest;
use cropcare_client::{ApiError, LaunchRoute};
use cropcare_core::{MobileNumber, OrderId, OtpCode, ProductId, Quantity};
use cropcare_integration_tests::{MockBackend, TEST_OTP, TEST_REFRESH_TOKEN, TEST_TOKEN};
use secrecy::ExposeSecret;

fn mobile(s: &str) -> MobileNumber {
    MobileNumber::parse(s).unwrap()
}

#[tokio::test]
async fn test_bearer_endpoints_require_login() {
    let backend = MockBackend::start().await.unwrap();
    let client = backend.client();

    let errors: Vec<ApiError> = vec![
        client.list_products().await.unwrap_err(),
        client.get_cart().await.unwrap_err(),
        client.list_orders().await.unwrap_err(),
        client.create_order("Farm 1").await.unwrap_err(),
        client
            .update_user(&UpdateUserRequest::default())
            .await
            .unwrap_err(),
        client
            .add_to_cart(&ProductId::new("p1"), Quantity::ONE)
            .await
            .unwrap_err(),
        client.get_product(&ProductId::new("p1")).await.unwrap_err(),
        client.get_order(&OrderId::new("ORD-1")).await.unwrap_err(),
        client
            .update_cart_item(&ProductId::new("p1"), Quantity::ONE)
            .await
            .unwrap_err(),
        client
            .remove_from_cart(&ProductId::new("p1"))
            .await
            .unwrap_err(),
        client.clear_cart().await.unwrap_err(),
    ];
    assert_eq!(errors.len(), 11);

    for err in errors {
        assert!(err.is_auth_required(), "{err}");
        assert_eq!(err.to_string(), "Authentication required");
    }
}

#[tokio::test]
async fn test_logged_out_store_records_auth_error() {
    let backend = MockBackend::start().await.unwrap();
    let store = backend.logged_out_store();

    let err = store.refresh_all().await.unwrap_err();
    assert!(err.is_auth_required());
    assert!(store.products().is_empty());
}

#[tokio::test]
async fn test_requests_carry_request_id_and_token() {
    let backend = MockBackend::start().await.unwrap();
    let store = backend.logged_in_store().await;

    store.refresh_products().await.unwrap();
    store.refresh_cart().await.unwrap();

    let state = backend.state();
    assert_eq!(state.requests.len(), 2);
    let first = state.requests[0].request_id.clone().unwrap();
    let second = state.requests[1].request_id.clone().unwrap();
    assert_eq!(first.len(), 36);
    assert_ne!(first, second);
    for request in &state.requests {
        assert_eq!(
            request.authorization.as_deref(),
            Some(format!("Bearer {TEST_TOKEN}").as_str())
        );
    }
}

#[tokio::test]
async fn test_request_otp_blocked_number() {
    let backend = MockBackend::start().await.unwrap();
    let client = backend.client();

    client.request_otp(&mobile("9876543210")).await.unwrap();

    let err = client.request_otp(&mobile("0123456789")).await.unwrap_err();
    assert_eq!(err.to_string(), "Number is blocked");
    // OTP endpoints never send a token
    assert!(backend.state().requests.iter().all(|r| r.authorization.is_none()));
}

#[tokio::test]
async fn test_request_otp_without_body_uses_fallback() {
    let backend = MockBackend::start().await.unwrap();
    backend
        .state()
        .forced_status
        .insert("POST /auth/request-otp".to_string(), 503);

    let err = backend
        .client()
        .request_otp(&mobile("9876543210"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Failed to send OTP");
}

#[tokio::test]
async fn test_verify_otp_wrong_code() {
    let backend = MockBackend::start().await.unwrap();
    let client = backend.client();

    let err = client
        .verify_otp(&mobile("9876543210"), &OtpCode::parse("000000").unwrap())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Invalid OTP");
    assert!(!client.session().is_logged_in().await);
}

#[tokio::test]
async fn test_login_flow() {
    let backend = MockBackend::start().await.unwrap();
    let client = backend.client();
    let session = client.session();
    assert_eq!(session.launch_route().await, LaunchRoute::Language);

    let profile = client
        .verify_otp(&mobile("9876543210"), &OtpCode::parse(TEST_OTP).unwrap())
        .await
        .unwrap();

    assert_eq!(profile.id_string().as_deref(), Some("42"));
    assert_eq!(profile.mobile_number.as_deref(), Some("9876543210"));
    assert_eq!(profile.extra["village"], "Rampur");

    assert!(session.is_logged_in().await);
    assert_eq!(session.access_token().await.unwrap().expose_secret(), TEST_TOKEN);
    assert_eq!(
        session.refresh_token().await.unwrap().expose_secret(),
        TEST_REFRESH_TOKEN
    );
    assert_eq!(
        session.current_user().await.unwrap().id_string().as_deref(),
        Some("42")
    );

    session.skip_onboarding().await.unwrap();
    assert_eq!(session.launch_route().await, LaunchRoute::Home);

    // The stored token is picked up on the next call
    assert_eq!(client.list_products().await.unwrap().len(), 4);

    session.sign_out().await.unwrap();
    assert_eq!(session.launch_route().await, LaunchRoute::Login);
    assert!(client.list_products().await.unwrap_err().is_auth_required());
}

#[tokio::test]
async fn test_update_user() {
    let backend = MockBackend::start().await.unwrap();
    let store = backend.logged_in_store().await;

    store
        .api()
        .update_user(&UpdateUserRequest {
            language: Some("hi".to_string()),
            name: None,
        })
        .await
        .unwrap();
    assert_eq!(
        backend.state().last_user_update,
        Some(serde_json::json!({"language": "hi"}))
    );

    let err = store
        .api()
        .update_user(&UpdateUserRequest {
            language: Some("xx".to_string()),
            name: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Unsupported language");
}
