//! Processing API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::AppResult;

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub message: String,
}

/// POST /api/processing/:id/process - Manually trigger order processing
///
/// Unlike the event-driven path this runs synchronously: the response
/// arrives after the full pending → processing → completed sequence.
pub async fn process_order(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ProcessResponse>> {
    tracing::info!(order_id = %id, user_id = %user.id, "Manual processing trigger");

    state.processing.process_order(&id).await?;

    Ok(Json(ProcessResponse {
        message: format!("Order {id} processed"),
    }))
}
