//! Cart commands through the storefront API.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use gaojie_integration_tests::{MockBackend, TestStorefront};
use serde_json::json;

#[tokio::test]
async fn test_two_item_cart_totals() {
    let backend = MockBackend::start().await;
    let store = TestStorefront::start(&backend).await;

    let (status, body) = store.add_to_cart(1, 1).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Ginseng Radiance Serum added to cart");

    let (status, body) = store.add_to_cart(2, 1).await;
    assert_eq!(status, StatusCode::OK);

    let totals = &body["cart"]["totals"];
    assert_eq!(totals["subtotal"], 2880);
    assert_eq!(totals["shipping_fee"], 0);
    assert_eq!(totals["tax"], 202);
    assert_eq!(totals["grand_total"], 3082);
    assert_eq!(totals["item_count"], 2);
    assert_eq!(body["cart"]["free_shipping"]["qualifies"], true);

    let (_, count) = store.get("/api/cart/count").await;
    assert_eq!(count["count"], 2);
}

#[tokio::test]
async fn test_add_uses_backend_price() {
    let backend = MockBackend::start().await;
    let store = TestStorefront::start(&backend).await;

    let (status, body) = store
        .post(
            "/api/cart/items",
            &json!({"product_id": "1", "quantity": 1, "price": 1, "name": "Free stuff"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let line = &body["cart"]["lines"][0];
    assert_eq!(line["name"], "Ginseng Radiance Serum");
    assert_eq!(line["price"], 1290);
}

#[tokio::test]
async fn test_same_product_merges_into_one_line() {
    let backend = MockBackend::start().await;
    let store = TestStorefront::start(&backend).await;

    store.add_to_cart(1, 1).await;
    let (_, body) = store
        .post("/api/cart/items", &json!({"product_id": "1", "quantity": 2}))
        .await;

    let lines = body["cart"]["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["quantity"], 3);
}

#[tokio::test]
async fn test_add_quantity_is_capped() {
    let backend = MockBackend::start().await;
    let store = TestStorefront::start(&backend).await;

    let (status, body) = store.add_to_cart(4, 50).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cart"]["lines"][0]["quantity"], 10);
}

#[tokio::test]
async fn test_out_of_stock_product_is_refused() {
    let backend = MockBackend::start().await;
    let store = TestStorefront::start(&backend).await;

    let (status, body) = store.add_to_cart(3, 1).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Snail Repair Cream is out of stock");

    let (_, cart) = store.get("/api/cart").await;
    assert_eq!(cart["cart"]["is_empty"], true);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let backend = MockBackend::start().await;
    let store = TestStorefront::start(&backend).await;

    let (status, body) = store.add_to_cart(999, 1).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_promo_codes() {
    let backend = MockBackend::start().await;
    let store = TestStorefront::start(&backend).await;
    store.add_to_cart(1, 1).await;
    store.add_to_cart(2, 1).await;

    let (status, body) = store.post("/api/cart/promo", &json!({"code": "BOGUS"})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], "error");

    let (status, body) = store
        .post("/api/cart/promo", &json!({"code": " SAVE10 "}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["promo"]["code"], "save10");
    let totals = &body["cart"]["totals"];
    assert_eq!(totals["discount"], 288);
    assert_eq!(totals["discounted_subtotal"], 2592);
    assert_eq!(totals["tax"], 181);
    assert_eq!(totals["grand_total"], 2773);

    let (status, body) = store.delete("/api/cart/promo").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["cart"]["promo"].is_null());
    assert_eq!(body["cart"]["totals"]["grand_total"], 3082);
}

#[tokio::test]
async fn test_quantity_changes_and_removal() {
    let backend = MockBackend::start().await;
    let store = TestStorefront::start(&backend).await;
    store.add_to_cart(1, 1).await;

    let (_, body) = store
        .post(
            "/api/cart/items/quantity",
            &json!({"product_id": "1", "change": {"action": "set", "quantity": 0}}),
        )
        .await;
    assert_eq!(body["cart"]["lines"][0]["quantity"], 1);

    let (_, body) = store
        .post(
            "/api/cart/items/quantity",
            &json!({"product_id": "1", "change": {"action": "increment"}}),
        )
        .await;
    assert_eq!(body["cart"]["lines"][0]["quantity"], 2);

    let (status, _) = store
        .post(
            "/api/cart/items/quantity",
            &json!({"product_id": "2", "change": {"action": "increment"}}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = store.delete("/api/cart/items/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cart"]["is_empty"], true);
    assert_eq!(body["cart"]["totals"]["grand_total"], 0);
}

#[tokio::test]
async fn test_carts_are_per_session() {
    let backend = MockBackend::start().await;
    let first = TestStorefront::start(&backend).await;
    first.add_to_cart(1, 2).await;

    let other = reqwest::Client::new();
    let (_, body) = first.send(other.get(first.url("/api/cart"))).await;
    assert_eq!(body["cart"]["is_empty"], true);

    let (_, body) = first.get("/api/cart").await;
    assert_eq!(body["cart"]["totals"]["item_count"], 2);
}

#[tokio::test]
async fn test_clear_cart() {
    let backend = MockBackend::start().await;
    let store = TestStorefront::start(&backend).await;
    store.add_to_cart(1, 1).await;
    store.post("/api/cart/promo", &json!({"code": "save10"})).await;

    let (status, body) = store.delete("/api/cart").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cart"]["is_empty"], true);
    assert!(body["cart"]["promo"].is_null());
}
