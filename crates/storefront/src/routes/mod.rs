//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Health check
//!
//! # Cart
//! GET    /api/cart                      - Cart snapshot
//! DELETE /api/cart                      - Clear cart
//! GET    /api/cart/count                - Badge count
//! POST   /api/cart/items                - Add {product_id, quantity?}
//! POST   /api/cart/items/quantity       - Change quantity {product_id, change}
//! DELETE /api/cart/items/{id}           - Remove line
//! POST   /api/cart/promo                - Apply promo {code}
//! DELETE /api/cart/promo                - Remove promo
//!
//! # Checkout
//! GET  /api/checkout                    - Checkout view (?demo=true prefills)
//! PUT  /api/checkout/form               - Merge field values
//! POST /api/checkout/advance            - Validate step and move forward
//! POST /api/checkout/retreat            - Move back one step
//! POST /api/checkout/step/{step}        - Jump back to a completed step
//! POST /api/checkout/submit             - Place the order
//!
//! # Orders
//! GET  /api/orders/{number}             - Confirmation lookup
//! GET  /api/account/orders              - Order history (requires auth)
//!
//! # Products
//! GET  /api/products                    - Listing (page, per_page, category, search, ...)
//! GET  /api/products/featured           - Featured (?limit=)
//! GET  /api/products/bestsellers        - Bestsellers (?limit=)
//! GET  /api/products/new                - New arrivals (?limit=)
//! GET  /api/products/categories         - Category names
//! GET  /api/products/slug/{slug}        - Product by slug
//! GET  /api/products/{id}               - Product by id
//!
//! # Auth
//! GET  /api/auth/check                  - Sign-in status
//! POST /api/auth/login                  - Sign in
//! POST /api/auth/register               - Create account
//! POST /api/auth/logout                 - Sign out
//! GET  /api/auth/profile                - Profile (requires auth)
//! PUT  /api/auth/profile                - Update profile (requires auth)
//! PUT  /api/auth/password               - Change password (requires auth)
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/count", get(cart::count))
        .route("/items", post(cart::add))
        .route("/items/quantity", post(cart::update_quantity))
        .route("/items/{id}", delete(cart::remove))
        .route("/promo", post(cart::apply_promo).delete(cart::remove_promo))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/form", put(checkout::update_form))
        .route("/advance", post(checkout::advance))
        .route("/retreat", post(checkout::retreat))
        .route("/step/{step}", post(checkout::go_to))
        .route("/submit", post(checkout::submit))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/featured", get(products::featured))
        .route("/bestsellers", get(products::bestsellers))
        .route("/new", get(products::new_arrivals))
        .route("/categories", get(products::categories))
        .route("/slug/{slug}", get(products::show_by_slug))
        .route("/{id}", get(products::show))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/check", get(auth::check))
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/logout", post(auth::logout))
        .route("/profile", get(auth::profile).put(auth::update_profile))
        .route("/password", put(auth::change_password))
}

/// Create all API routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/cart", cart_routes())
        .nest("/api/checkout", checkout_routes())
        .route("/api/orders/{number}", get(orders::show))
        .route("/api/account/orders", get(orders::history))
        .nest("/api/products", product_routes())
        .nest("/api/auth", auth_routes())
}
