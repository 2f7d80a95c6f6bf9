//! Processing API Module

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

/// Processing router - manual trigger, bearer-gated
pub fn router() -> Router<ServerState> {
    Router::new().route("/api/processing/{id}/process", post(handler::process_order))
}
