//! Order route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use gaojie_core::OrderNumber;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::{Order, Pagination};
use crate::error::{AppError, Result};
use crate::middleware::{OptionalCredential, RequireCredential};
use crate::state::AppState;

/// Order history page size.
const DEFAULT_PER_PAGE: u32 = 10;
const MAX_PER_PAGE: u32 = 50;

/// An order with display labels.
#[derive(Debug, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub status_label: String,
    pub payment_status_label: String,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        let status_label = order
            .status_display
            .clone()
            .unwrap_or_else(|| order.status.label().to_string());
        let payment_status_label = order.payment_status.label().to_string();
        Self {
            order,
            status_label,
            payment_status_label,
        }
    }
}

/// Single order response.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub status: &'static str,
    pub order: OrderView,
}

/// Order history query.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Order history response.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub status: &'static str,
    pub orders: Vec<OrderView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

/// Order confirmation lookup.
#[instrument(skip(state, credential))]
pub async fn show(
    State(state): State<AppState>,
    OptionalCredential(credential): OptionalCredential,
    Path(number): Path<String>,
) -> Result<Json<OrderResponse>> {
    let number = number.trim();
    if number.is_empty() {
        return Err(AppError::BadRequest("Order number is required".to_string()));
    }

    let order = state
        .api()
        .order_by_number(&OrderNumber::new(number), credential.as_ref())
        .await?;

    Ok(Json(OrderResponse {
        status: "success",
        order: order.into(),
    }))
}

/// The signed-in shopper's orders.
#[instrument(skip(state, credential))]
pub async fn history(
    State(state): State<AppState>,
    RequireCredential(credential): RequireCredential,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);

    let list = state.api().my_orders(page, per_page, &credential).await?;
    Ok(Json(HistoryResponse {
        status: "success",
        orders: list.orders.into_iter().map(OrderView::from).collect(),
        pagination: list.pagination,
    }))
}
