//! Product route handlers.
//!
//! Thin proxy over the backend catalog; responses are served from the
//! client's five-minute cache when warm.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use gaojie_core::ProductId;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::{Pagination, Product, ProductCollection, ProductQuery};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Largest curated list served.
const MAX_COLLECTION_LIMIT: u32 = 24;

/// Curated list query.
#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

/// Product listing response.
#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub status: &'static str,
    pub products: Vec<Product>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

/// Single product response.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub status: &'static str,
    pub product: Product,
}

/// Category list response.
#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub status: &'static str,
    pub categories: Vec<String>,
}

/// Product listing.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ProductsResponse>> {
    let list = state.api().products(&query).await?;
    Ok(Json(ProductsResponse {
        status: "success",
        products: list.products,
        pagination: list.pagination,
    }))
}

async fn collection(
    state: &AppState,
    kind: ProductCollection,
    query: &LimitQuery,
) -> Result<Json<ProductsResponse>> {
    let limit = query
        .limit
        .unwrap_or(ProductCollection::DEFAULT_LIMIT)
        .clamp(1, MAX_COLLECTION_LIMIT);
    let products = state.api().collection(kind, limit).await?;
    Ok(Json(ProductsResponse {
        status: "success",
        products,
        pagination: None,
    }))
}

/// Featured products.
#[instrument(skip(state))]
pub async fn featured(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ProductsResponse>> {
    collection(&state, ProductCollection::Featured, &query).await
}

/// Bestsellers.
#[instrument(skip(state))]
pub async fn bestsellers(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ProductsResponse>> {
    collection(&state, ProductCollection::Bestsellers, &query).await
}

/// New arrivals.
#[instrument(skip(state))]
pub async fn new_arrivals(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ProductsResponse>> {
    collection(&state, ProductCollection::New, &query).await
}

/// Category names.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<CategoriesResponse>> {
    let categories = state.api().categories().await?;
    Ok(Json(CategoriesResponse {
        status: "success",
        categories,
    }))
}

/// Product by id.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>> {
    let id = ProductId::parse(&id).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let product = state.api().product(&id).await?;
    Ok(Json(ProductResponse {
        status: "success",
        product,
    }))
}

/// Product by slug.
#[instrument(skip(state))]
pub async fn show_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductResponse>> {
    let product = state.api().product_by_slug(&slug).await?;
    Ok(Json(ProductResponse {
        status: "success",
        product,
    }))
}
