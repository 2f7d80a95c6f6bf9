//! Reports API Module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

/// Reports router - bearer-gated
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/reports/daily", get(handler::daily))
        .route("/api/reports/range", get(handler::range))
}
