//! Integration tests for the GAOJIE storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p gaojie-integration-tests
//! ```
//!
//! No external services are needed. Each test spawns a [`MockBackend`] (the
//! backend REST API plus the payment provider's token endpoint) on
//! `127.0.0.1:0` and, where it drives HTTP, a real storefront server in front
//! of it via [`TestStorefront`].
//!
//! # Test Categories
//!
//! - `api_client` - backend client against the mock
//! - `cart_flow` - cart commands through the storefront API
//! - `checkout_flow` - stepper, submission and failure handling
//! - `auth_flow` - sign-in and the backend session cookie

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use gaojie_storefront::config::{
    BackendConfig, LogFormat, PaymentConfig, StoreConfig, StorefrontConfig,
};
use gaojie_storefront::state::AppState;
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;

/// Order number handed out by the mock backend.
pub const ORDER_NUMBER: &str = "GJ20260101TEST";

/// Password the mock backend accepts.
pub const GOOD_PASSWORD: &str = "correct-horse-battery";

/// Cookie the mock backend sets on sign-in.
pub const BACKEND_COOKIE: &str = "session=mock-backend-session";

// =============================================================================
// MockBackend
// =============================================================================

/// What the mock has seen and how it should behave.
#[derive(Debug, Default)]
pub struct MockInner {
    /// Bodies received by `POST /api/orders/create`.
    pub orders: Vec<Value>,
    /// Requests to `GET /api/products/{id}`.
    pub product_requests: usize,
    /// Requests to the token endpoint.
    pub tokenize_requests: usize,
    /// Status returned by order creation when set (otherwise 201).
    pub order_failure: Option<u16>,
    /// Answer 200 with `"status": "error"` from order creation.
    pub order_rejected: bool,
    /// Refuse every card.
    pub decline_cards: bool,
    /// Sleep before answering product requests.
    pub product_delay: Option<Duration>,
    /// Sleep after recording an order and before answering.
    pub order_delay: Option<Duration>,
}

/// Shared mock state.
#[derive(Debug, Clone, Default)]
pub struct MockState(Arc<Mutex<MockInner>>);

impl MockState {
    /// Lock the state for inspection or reconfiguration.
    pub fn lock(&self) -> MutexGuard<'_, MockInner> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A running mock backend.
pub struct MockBackend {
    pub addr: SocketAddr,
    pub state: MockState,
}

impl MockBackend {
    /// Start the mock on an ephemeral port.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new()
            .route("/api/products", get(list_products))
            .route("/api/products/{id}", get(get_product))
            .route("/api/orders/create", post(create_order))
            .route("/api/orders/by-number/{number}", get(order_by_number))
            .route("/api/auth/login", post(login))
            .route("/api/auth/check", get(auth_check))
            .route("/api/auth/me", get(me))
            .route("/api/auth/logout", post(logout))
            .route("/tokens", post(tokenize))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    /// Backend API root.
    ///
    /// # Panics
    ///
    /// Panics if the address does not form a URL.
    #[must_use]
    pub fn api_url(&self) -> Url {
        Url::parse(&format!("http://{}/api/", self.addr)).expect("mock api url")
    }

    /// Payment token endpoint.
    ///
    /// # Panics
    ///
    /// Panics if the address does not form a URL.
    #[must_use]
    pub fn token_url(&self) -> Url {
        Url::parse(&format!("http://{}/tokens", self.addr)).expect("mock token url")
    }

    /// Backend client configuration pointing at the mock.
    #[must_use]
    pub fn backend_config(&self, timeout: Duration) -> BackendConfig {
        BackendConfig {
            api_url: self.api_url(),
            timeout,
        }
    }

    /// Storefront configuration pointing at the mock.
    #[must_use]
    pub fn storefront_config(&self) -> StorefrontConfig {
        StorefrontConfig {
            host: [127, 0, 0, 1].into(),
            port: 0,
            base_url: "http://127.0.0.1".to_string(),
            backend: self.backend_config(Duration::from_secs(5)),
            store: StoreConfig::default(),
            payment: PaymentConfig {
                token_url: self.token_url(),
                public_key: SecretString::from("pkey_test_5x8h2k".to_string()),
            },
            sentry_dsn: None,
            sentry_environment: None,
            log_format: LogFormat::Pretty,
        }
    }
}

fn product(id: &str) -> Option<Value> {
    let (name, slug, price, in_stock) = match id {
        "1" => ("Ginseng Radiance Serum", "ginseng-radiance-serum", 1290.0, true),
        "2" => ("Rose Hydrating Toner", "rose-hydrating-toner", 1590.0, true),
        "3" => ("Snail Repair Cream", "snail-repair-cream", 890.0, false),
        "4" => ("Lip Balm", "lip-balm", 120.0, true),
        _ => return None,
    };
    Some(json!({
        "id": id.parse::<u64>().ok()?,
        "name": name,
        "slug": slug,
        "price": price,
        "original_price": null,
        "category": "skincare",
        "is_in_stock": in_stock,
        "stock_quantity": if in_stock { 25 } else { 0 },
        "primary_image": format!("/static/images/{slug}.jpg"),
        "created_at": "2026-01-05T08:00:00.000000",
    }))
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"status": "error", "message": message}))).into_response()
}

fn has_backend_cookie(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains(BACKEND_COOKIE))
}

fn user() -> Value {
    json!({
        "id": 7,
        "email": "somchai@example.com",
        "first_name": "Somchai",
        "last_name": "Jaidee",
        "full_name": "Somchai Jaidee",
        "phone": "+66812345678",
        "is_verified": true,
        "newsletter_subscribed": false,
    })
}

async fn list_products() -> Json<Value> {
    let products: Vec<Value> = ["1", "2", "3", "4"].into_iter().filter_map(product).collect();
    Json(json!({
        "status": "success",
        "products": products,
        "pagination": {"page": 1, "per_page": 12, "total": 4, "pages": 1, "has_next": false, "has_prev": false},
    }))
}

async fn get_product(State(state): State<MockState>, Path(id): Path<String>) -> Response {
    let delay = {
        let mut inner = state.lock();
        inner.product_requests += 1;
        inner.product_delay
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    match product(&id) {
        Some(product) => Json(json!({"status": "success", "product": product})).into_response(),
        None => error_body(StatusCode::NOT_FOUND, "Product not found"),
    }
}

async fn create_order(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    let (failure, rejected, delay) = {
        let mut inner = state.lock();
        inner.orders.push(body);
        (inner.order_failure, inner.order_rejected, inner.order_delay)
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    if let Some(status) = failure {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return error_body(status, "Failed to create order");
    }
    if rejected {
        return Json(json!({"status": "error", "message": "Some items are no longer available"}))
            .into_response();
    }

    (
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "Order created successfully",
            "order": {"id": 1, "order_number": ORDER_NUMBER, "total_amount": 3082.0},
        })),
    )
        .into_response()
}

async fn order_by_number(Path(number): Path<String>) -> Response {
    if number != ORDER_NUMBER {
        return error_body(StatusCode::NOT_FOUND, "Order not found");
    }
    Json(json!({
        "status": "success",
        "order": {
            "id": 1,
            "order_number": ORDER_NUMBER,
            "status": "confirmed",
            "payment_status": "completed",
            "payment_method": "credit_card",
            "subtotal": 2880.0,
            "tax_amount": 202.0,
            "shipping_amount": 0.0,
            "discount_amount": 0.0,
            "total_amount": 3082.0,
            "item_count": 2,
            "shipping": {"full_name": "Demo User", "city": "Bangkok", "country": "Thailand"},
            "items": [
                {"product_name": "Ginseng Radiance Serum", "quantity": 1, "unit_price": 1290.0, "total_price": 1290.0},
                {"product_name": "Rose Hydrating Toner", "quantity": 1, "unit_price": 1590.0, "total_price": 1590.0}
            ],
            "created_at": "2026-01-05T09:15:00.000000",
        },
    }))
    .into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] != GOOD_PASSWORD {
        return error_body(StatusCode::UNAUTHORIZED, "Invalid email or password");
    }
    (
        [(header::SET_COOKIE, format!("{BACKEND_COOKIE}; HttpOnly; Path=/"))],
        Json(json!({"status": "success", "message": "Login successful", "user": user()})),
    )
        .into_response()
}

async fn auth_check(headers: HeaderMap) -> Json<Value> {
    if has_backend_cookie(&headers) {
        Json(json!({"status": "success", "authenticated": true, "user": user()}))
    } else {
        Json(json!({"status": "success", "authenticated": false, "user": null}))
    }
}

async fn me(headers: HeaderMap) -> Response {
    if has_backend_cookie(&headers) {
        Json(json!({"user": user()})).into_response()
    } else {
        error_body(StatusCode::UNAUTHORIZED, "Authentication required")
    }
}

async fn logout() -> Json<Value> {
    Json(json!({"status": "success", "message": "Logout successful"}))
}

async fn tokenize(State(state): State<MockState>, body: String) -> Response {
    let decline = {
        let mut inner = state.lock();
        inner.tokenize_requests += 1;
        inner.decline_cards
    };

    if decline || !body.contains("card%5Bnumber%5D=4242424242424242") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"object": "error", "code": "invalid_card", "message": "Card was declined"})),
        )
            .into_response();
    }
    Json(json!({"object": "token", "id": "tokn_test_5xp6c"})).into_response()
}

// =============================================================================
// TestStorefront
// =============================================================================

/// A running storefront and a cookie-keeping client for it.
pub struct TestStorefront {
    pub base: String,
    pub client: reqwest::Client,
}

impl TestStorefront {
    /// Start a storefront in front of `backend`.
    ///
    /// # Panics
    ///
    /// Panics if the state cannot be built or the listener cannot be bound.
    pub async fn start(backend: &MockBackend) -> Self {
        Self::start_with(backend.storefront_config()).await
    }

    /// Start a storefront with an explicit configuration.
    ///
    /// # Panics
    ///
    /// Panics if the state cannot be built or the listener cannot be bound.
    pub async fn start_with(config: StorefrontConfig) -> Self {
        let state = AppState::new(config).expect("storefront state");
        let app = gaojie_storefront::app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind storefront");
        let addr = listener.local_addr().expect("storefront address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("http client");

        Self {
            base: format!("http://{addr}"),
            client,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// Send a request and return status and JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the body is not JSON.
    pub async fn send(&self, request: reqwest::RequestBuilder) -> (StatusCode, Value) {
        let response = request.send().await.expect("storefront request");
        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.json().await.unwrap_or(Value::Null);
        (status, body)
    }

    /// GET a path.
    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.send(self.client.get(self.url(path))).await
    }

    /// POST JSON to a path.
    pub async fn post(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        self.send(self.client.post(self.url(path)).json(body)).await
    }

    /// PUT JSON to a path.
    pub async fn put(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        self.send(self.client.put(self.url(path)).json(body)).await
    }

    /// DELETE a path.
    pub async fn delete(&self, path: &str) -> (StatusCode, Value) {
        self.send(self.client.delete(self.url(path))).await
    }

    /// Add a product through the storefront.
    pub async fn add_to_cart(&self, product_id: u64, quantity: u32) -> (StatusCode, Value) {
        self.post(
            "/api/cart/items",
            &json!({"product_id": product_id, "quantity": quantity}),
        )
        .await
    }
}

/// Contact and shipping values that pass validation.
#[must_use]
pub fn valid_fields() -> Value {
    json!({
        "email": "somchai@example.com",
        "phone": "081 234 5678",
        "first_name": "Somchai",
        "last_name": "Jaidee",
        "address": "99 Sukhumvit Road",
        "city": "Bangkok",
        "province": "bangkok",
        "postal_code": "10110",
        "shipping_method": "standard",
    })
}

/// Card fields the mock provider accepts.
#[must_use]
pub fn card_fields() -> Value {
    json!({
        "payment_method": "credit_card",
        "card_name": "Somchai Jaidee",
        "card_number": "4242 4242 4242 4242",
        "card_expiry": "12/30",
        "card_cvv": "123",
    })
}

/// Merge two JSON objects (right wins).
#[must_use]
pub fn merged(left: Value, right: &Value) -> Value {
    let mut out = left;
    if let (Some(target), Some(source)) = (out.as_object_mut(), right.as_object()) {
        for (key, value) in source {
            target.insert(key.clone(), value.clone());
        }
    }
    out
}
