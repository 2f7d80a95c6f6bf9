//! JWT Extractor
//!
//! Custom extractor for automatically validating JWT tokens

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::AppError;
use crate::auth::{CurrentUser, JwtService};
use crate::core::ServerState;
use crate::db::repository::user as user_repo;
use crate::security_log;

/// JWT Auth Extractor
///
/// Use this extractor in protected handlers to automatically validate JWT
/// and extract CurrentUser. The token subject is re-resolved against the
/// users table on every request so deactivated accounts lose access
/// immediately, not at token expiry.
impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        // Check if already extracted (from middleware)
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        // Extract Authorization header
        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let token = match auth_header {
            Some(header) => JwtService::extract_from_header(header)
                .ok_or_else(AppError::invalid_token)?,
            None => {
                security_log!("WARN", "auth_missing", uri = format!("{:?}", parts.uri));
                return Err(AppError::unauthorized());
            }
        };

        // Validate token signature, expiry, issuer, audience
        let claims = match state.jwt_service.validate_token(token) {
            Ok(claims) => claims,
            Err(e) => {
                security_log!(
                    "WARN",
                    "auth_failed",
                    error = format!("{}", e),
                    uri = format!("{:?}", parts.uri)
                );

                return match e {
                    crate::auth::JwtError::ExpiredToken => Err(AppError::token_expired()),
                    _ => Err(AppError::invalid_token()),
                };
            }
        };

        // Resolve subject to a live user
        let user = user_repo::find_by_id(&state.db, &claims.sub)
            .await
            .map_err(AppError::from)?;

        let user = match user {
            Some(u) if u.is_active => u,
            _ => {
                security_log!(
                    "WARN",
                    "auth_user_rejected",
                    user_id = claims.sub.clone(),
                    uri = format!("{:?}", parts.uri)
                );
                return Err(AppError::unauthorized());
            }
        };

        let current = CurrentUser::from(&user);

        // Store in extensions for potential reuse
        parts.extensions.insert(current.clone());

        Ok(current)
    }
}
