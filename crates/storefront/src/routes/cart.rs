//! Cart route handlers.
//!
//! Every command answers with the full cart snapshot so the page can redraw
//! the line list, totals, badge count and free-shipping bar in one go. An
//! `is_empty` snapshot tells the page to switch to the empty-cart view.

use axum::{
    Json,
    extract::{Path, State},
};
use gaojie_core::ProductId;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::cart::{CartSnapshot, ProductRef, PromoState, QuantityChange};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::state::AppState;

/// Most units a single add can put in the cart.
pub const MAX_ADD_QUANTITY: u32 = 10;

/// Cart command response.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub cart: CartSnapshot,
}

impl CartResponse {
    fn new(cart: CartSnapshot) -> Self {
        Self {
            status: "success",
            message: None,
            cart,
        }
    }

    fn with_message(cart: CartSnapshot, message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: Some(message.into()),
            cart,
        }
    }
}

/// Badge count response.
#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u32,
}

/// Add to cart body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
}

/// Quantity change body.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub product_id: ProductId,
    pub change: QuantityChange,
}

/// Promo code body.
#[derive(Debug, Deserialize)]
pub struct PromoRequest {
    pub code: String,
}

/// Promo applied response.
#[derive(Debug, Serialize)]
pub struct PromoResponse {
    pub status: &'static str,
    pub message: String,
    pub promo: PromoState,
    pub cart: CartSnapshot,
}

/// Current cart.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Json<CartResponse> {
    Json(CartResponse::new(state.cart(session).snapshot().await))
}

/// Badge count.
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> Json<CartCount> {
    let count = state.cart(session).snapshot().await.count();
    Json(CartCount { count })
}

/// Add a product. Name, price and image come from the backend, never the client.
#[instrument(skip(state, session, body), fields(product_id = %body.product_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<AddToCartRequest>,
) -> Result<Json<CartResponse>> {
    let product = state.api().product(&body.product_id).await?;
    if !product.is_in_stock {
        return Err(AppError::Conflict(format!(
            "{} is out of stock",
            product.name
        )));
    }

    let quantity = body.quantity.unwrap_or(1).clamp(1, MAX_ADD_QUANTITY);
    let cart = state
        .cart(session)
        .add_item(ProductRef::from(&product), quantity)
        .await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", product.id.as_str())]),
    );
    Ok(Json(CartResponse::with_message(
        cart,
        format!("{} added to cart", product.name),
    )))
}

/// Change a line's quantity.
#[instrument(skip(state, session, body), fields(product_id = %body.product_id))]
pub async fn update_quantity(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<UpdateQuantityRequest>,
) -> Result<Json<CartResponse>> {
    let cart = state
        .cart(session)
        .set_quantity(&body.product_id, body.change)
        .await?;
    Ok(Json(CartResponse::new(cart)))
}

/// Remove a line.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<CartResponse>> {
    let id = ProductId::parse(&id).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let cart = state.cart(session).remove_item(&id).await?;
    Ok(Json(CartResponse::with_message(cart, "Item removed from cart")))
}

/// Apply a promo code.
#[instrument(skip(state, session, body))]
pub async fn apply_promo(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<PromoRequest>,
) -> Result<Json<PromoResponse>> {
    let engine = state.cart(session);
    let promo = engine.apply_promo(&body.code).await?;
    let cart = engine.snapshot().await;

    Ok(Json(PromoResponse {
        status: "success",
        message: format!("Promo code applied: {}", promo.kind.describe()),
        promo,
        cart,
    }))
}

/// Drop the promo code.
#[instrument(skip(state, session))]
pub async fn remove_promo(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CartResponse>> {
    let cart = state.cart(session).remove_promo().await?;
    Ok(Json(CartResponse::with_message(cart, "Promo code removed")))
}

/// Empty the cart.
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Result<Json<CartResponse>> {
    let engine = state.cart(session);
    engine.clear().await?;
    Ok(Json(CartResponse::with_message(
        engine.snapshot().await,
        "Cart cleared",
    )))
}
