//! Audit Log API Handlers

use axum::{
    Json,
    extract::{Query, State},
};

use crate::AppError;
use crate::audit::{AuditListResponse, AuditQuery};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::AppResult;

/// GET /api/audit - Query audit log entries (admin only)
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<AuditListResponse>> {
    if !user.is_admin() {
        return Err(AppError::forbidden("Audit log requires admin role"));
    }

    let (items, total) = state.audit.query(&query).await.map_err(AppError::from)?;
    Ok(Json(AuditListResponse { items, total }))
}
