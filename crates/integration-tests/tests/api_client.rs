//! Backend client against the mock backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use gaojie_core::{OrderNumber, ProductId};
use gaojie_integration_tests::{BACKEND_COOKIE, GOOD_PASSWORD, MockBackend, ORDER_NUMBER};
use gaojie_storefront::api::{ApiClient, ApiError, BackendCredential, LoginRequest};

async fn client(backend: &MockBackend) -> ApiClient {
    ApiClient::new(&backend.backend_config(Duration::from_secs(5))).unwrap()
}

#[tokio::test]
async fn test_product_is_cached() {
    let backend = MockBackend::start().await;
    let api = client(&backend).await;
    let id = ProductId::from(1_u64);

    let first = api.product(&id).await.unwrap();
    let second = api.product(&id).await.unwrap();

    assert_eq!(first.name, "Ginseng Radiance Serum");
    assert_eq!(first, second);
    assert_eq!(backend.state.lock().product_requests, 1);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let backend = MockBackend::start().await;
    let api = client(&backend).await;

    let err = api.product(&ProductId::from(404_u64)).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(ref msg) if msg == "Product not found"));
}

#[tokio::test]
async fn test_listing_decodes_pagination() {
    let backend = MockBackend::start().await;
    let api = client(&backend).await;

    let list = api.products(&Default::default()).await.unwrap();
    assert_eq!(list.products.len(), 4);
    assert_eq!(list.pagination.unwrap().total, 4);
    assert!(!list.products[2].is_in_stock);
}

#[tokio::test]
async fn test_slow_backend_is_a_timeout() {
    let backend = MockBackend::start().await;
    backend.state.lock().product_delay = Some(Duration::from_secs(2));
    let api = ApiClient::new(&backend.backend_config(Duration::from_millis(200))).unwrap();

    let err = api.product(&ProductId::from(1_u64)).await.unwrap_err();
    assert!(matches!(err, ApiError::Timeout), "got {err:?}");
}

#[tokio::test]
async fn test_order_lookup() {
    let backend = MockBackend::start().await;
    let api = client(&backend).await;

    let order = api
        .order_by_number(&OrderNumber::new(ORDER_NUMBER), None)
        .await
        .unwrap();
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.total_amount.units(), 3082);
}

#[tokio::test]
async fn test_login_captures_backend_cookie() {
    let backend = MockBackend::start().await;
    let api = client(&backend).await;

    let auth = api
        .login(&LoginRequest {
            email: "somchai@example.com".to_string(),
            password: GOOD_PASSWORD.to_string(),
            remember_me: false,
        })
        .await
        .unwrap();
    let credential = auth.credential.unwrap();
    assert_eq!(credential.cookie(), BACKEND_COOKIE);
    assert_eq!(auth.user.email, "somchai@example.com");

    let user = api.me(&credential).await.unwrap();
    assert_eq!(user.first_name, "Somchai");
}

#[tokio::test]
async fn test_bad_password_is_unauthorized() {
    let backend = MockBackend::start().await;
    let api = client(&backend).await;

    let err = api
        .login(&LoginRequest {
            email: "somchai@example.com".to_string(),
            password: "wrong".to_string(),
            remember_me: false,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(ref msg) if msg == "Invalid email or password"));
}

#[tokio::test]
async fn test_stale_credential_is_unauthorized() {
    let backend = MockBackend::start().await;
    let api = client(&backend).await;

    let err = api
        .me(&BackendCredential::new("session=expired"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
}
