//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use validator::Validate;

use crate::AppError;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Order, OrderItem};
use crate::orders::{CreateOrderInput, OrderPage};
use crate::utils::AppResult;

/// Create order request body
///
/// Shape validation happens here at the HTTP boundary; the lifecycle
/// service re-checks the semantic bounds before anything is persisted.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 200))]
    pub customer_name: String,
    #[validate(email)]
    pub customer_email: String,
    #[validate(length(min = 1), nested)]
    pub items: Vec<OrderItemRequest>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct OrderItemRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(range(min = 1))]
    pub quantity: i64,
    #[validate(range(min = 0.0))]
    pub price: f64,
}

/// Query params for listing orders
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

/// POST /api/orders - Create a new order
pub async fn create(
    State(state): State<ServerState>,
    Json(req): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<Order>)> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let input = CreateOrderInput {
        customer_name: req.customer_name,
        customer_email: req.customer_email,
        items: req
            .items
            .into_iter()
            .map(|i| OrderItem {
                name: i.name,
                quantity: i.quantity,
                price: i.price,
            })
            .collect(),
        notes: req.notes,
    };

    let order = state.orders.create(input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/orders - List orders (paginated, newest first)
pub async fn list(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<OrderPage>> {
    let page = state.orders.find_all(query.page, query.limit).await?;
    Ok(Json(page))
}

/// GET /api/orders/:id - Get order by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let order = state.orders.find_one(&id).await?;
    Ok(Json(order))
}

/// POST /api/orders/:id/cancel - Cancel a pending order
pub async fn cancel(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let order = state.orders.cancel(&id).await?;
    Ok(Json(order))
}
