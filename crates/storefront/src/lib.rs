//! GAOJIE Storefront library.
//!
//! Cart, checkout and order submission for the GAOJIE skincare shop, served
//! as a JSON API in front of the GAOJIE backend. Exposed as a library so the
//! binary and the integration tests build the same router.
//!
//! # Modules
//!
//! - [`cart`] - cart engine, promo table and totals
//! - [`checkout`] - form validation, step machine and order submission
//! - [`api`] - backend REST client
//! - [`payment`] - card tokenization
//! - [`routes`] - axum handlers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod middleware;
pub mod payment;
pub mod routes;
pub mod state;

use axum::{
    Router,
    http::{HeaderValue, header},
    middleware::from_fn,
    routing::get,
};
use tower::ServiceBuilder;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the backend.
async fn health() -> &'static str {
    "ok"
}

/// Build the application router with sessions, tracing and request ids.
///
/// # Middleware Order (outermost first)
///
/// 1. `TraceLayer` (request tracing)
/// 2. Request ID (add unique ID to each request)
/// 3. `Cache-Control: no-store` (cart and checkout responses are per shopper)
/// 4. Session layer (tower-sessions, in-memory store)
///
/// Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes::routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(from_fn(middleware::request_id_middleware))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("no-store"),
                ))
                .layer(session_layer),
        )
        .with_state(state)
}
