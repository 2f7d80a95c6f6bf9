//! Order API Module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Order router
/// - POST /api/orders: public (order intake)
/// - everything else requires a bearer token
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/orders", post(handler::create).get(handler::list))
        .route("/api/orders/{id}", get(handler::get_by_id))
        .route("/api/orders/{id}/cancel", post(handler::cancel))
}
