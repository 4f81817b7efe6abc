//! Sign-in through the storefront and the backend session cookie.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use gaojie_integration_tests::{GOOD_PASSWORD, MockBackend, TestStorefront};
use serde_json::json;

fn login_body(password: &str) -> serde_json::Value {
    json!({"email": " Somchai@Example.com ", "password": password})
}

#[tokio::test]
async fn test_signed_out_by_default() {
    let backend = MockBackend::start().await;
    let store = TestStorefront::start(&backend).await;

    let (status, body) = store.get("/api/auth/check").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], false);

    let (status, body) = store.get("/api/auth/profile").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Please sign in to continue");
}

#[tokio::test]
async fn test_login_then_profile_and_logout() {
    let backend = MockBackend::start().await;
    let store = TestStorefront::start(&backend).await;

    let (status, body) = store.post("/api/auth/login", &login_body(GOOD_PASSWORD)).await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    assert_eq!(body["user"]["first_name"], "Somchai");

    let (_, body) = store.get("/api/auth/check").await;
    assert_eq!(body["authenticated"], true);

    let (status, body) = store.get("/api/auth/profile").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "somchai@example.com");

    let (status, _) = store.post("/api/auth/logout", &json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = store.get("/api/auth/profile").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_password() {
    let backend = MockBackend::start().await;
    let store = TestStorefront::start(&backend).await;

    let (status, body) = store.post("/api/auth/login", &login_body("nope")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_cart_survives_sign_in_and_out() {
    let backend = MockBackend::start().await;
    let store = TestStorefront::start(&backend).await;
    store.add_to_cart(1, 2).await;

    store.post("/api/auth/login", &login_body(GOOD_PASSWORD)).await;
    let (_, body) = store.get("/api/cart").await;
    assert_eq!(body["cart"]["totals"]["item_count"], 2);

    store.post("/api/auth/logout", &json!({})).await;
    let (_, body) = store.get("/api/cart").await;
    assert_eq!(body["cart"]["totals"]["item_count"], 2);
}

#[tokio::test]
async fn test_register_validation() {
    let backend = MockBackend::start().await;
    let store = TestStorefront::start(&backend).await;

    let (status, body) = store
        .post(
            "/api/auth/register",
            &json!({
                "email": "new@example.com",
                "password": "short",
                "first_name": "Malee",
                "last_name": "Suksai",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Password must be at least 8 characters");
}
