//! Authentication Handlers
//!
//! Handles registration, login and profile retrieval

use std::time::Duration;

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppError;
use crate::audit::AuditAction;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{User, UserProfile, UserRole};
use crate::db::repository::user as user_repo;
use crate::utils::validation::{
    MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_PASSWORD_LEN, MIN_PASSWORD_LEN, is_valid_email,
    validate_required_text,
};
use crate::utils::{AppResult, now_millis};

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 500;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserProfile,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Verify an email/password pair against the user store
///
/// Fails closed with the unified credential error: unknown email and
/// wrong password are indistinguishable so callers cannot probe which
/// emails are registered.
async fn validate_credentials(state: &ServerState, email: &str, password: &str) -> AppResult<User> {
    let user = user_repo::find_by_email(&state.db, email)
        .await
        .map_err(AppError::from)?;

    // Fixed delay to prevent timing attacks (before checking result)
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    match user {
        Some(u) => {
            if !u.is_active {
                return Err(AppError::forbidden("Account has been disabled"));
            }

            let password_valid = u
                .verify_password(password)
                .map_err(|e| AppError::internal(format!("Password verification failed: {e}")))?;

            if !password_valid {
                state
                    .audit
                    .error(
                        AuditAction::LoginFailed,
                        "system",
                        serde_json::json!({ "email": email }),
                        "invalid_credentials",
                    )
                    .await;
                tracing::warn!(email = %email, "Login failed - invalid credentials");
                return Err(AppError::invalid_credentials());
            }

            Ok(u)
        }
        None => {
            state
                .audit
                .error(
                    AuditAction::LoginFailed,
                    "system",
                    serde_json::json!({ "email": email }),
                    "user_not_found",
                )
                .await;
            tracing::warn!(email = %email, "Login failed - user not found");
            Err(AppError::invalid_credentials())
        }
    }
}

/// Login handler
///
/// Authenticates email/password and returns a JWT token on success.
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let user = validate_credentials(&state, &req.email, &req.password).await?;

    let token = state
        .jwt_service
        .generate_token(&user.id, &user.email, user.role)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {e}")))?;

    state
        .audit
        .success(
            AuditAction::LoginSuccess,
            "system",
            serde_json::json!({ "user_id": &user.id, "email": &user.email }),
        )
        .await;

    tracing::info!(
        user_id = %user.id,
        email = %user.email,
        role = %user.role,
        "User logged in successfully"
    );

    Ok(Json(LoginResponse {
        user: user.profile(),
        token,
    }))
}

/// Register handler
///
/// Creates a new user with role=user. The email must be unused; a
/// concurrent duplicate insert is caught by the UNIQUE constraint.
pub async fn register(
    State(state): State<ServerState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserProfile>)> {
    validate_required_text(&req.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&req.email, "email", MAX_EMAIL_LEN)?;
    if !is_valid_email(&req.email) {
        return Err(AppError::validation("email must be a valid email"));
    }
    if req.password.len() < MIN_PASSWORD_LEN || req.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be between {MIN_PASSWORD_LEN} and {MAX_PASSWORD_LEN} characters"
        )));
    }

    if user_repo::find_by_email(&state.db, &req.email)
        .await
        .map_err(AppError::from)?
        .is_some()
    {
        return Err(AppError::conflict(format!(
            "Email already registered: {}",
            req.email
        )));
    }

    let hash_pass = User::hash_password(&req.password)
        .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

    let now = now_millis();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email: req.email,
        name: req.name,
        hash_pass,
        role: UserRole::User,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    user_repo::insert(&state.db, &user)
        .await
        .map_err(AppError::from)?;

    state
        .audit
        .success(
            AuditAction::UserRegistered,
            "system",
            serde_json::json!({ "user_id": &user.id, "email": &user.email }),
        )
        .await;

    tracing::info!(user_id = %user.id, email = %user.email, "User registered");

    Ok((StatusCode::CREATED, Json(user.profile())))
}

/// Get current user profile
///
/// The extractor has already validated the token and re-checked the user
/// row, so this is a straight projection.
pub async fn profile(user: CurrentUser) -> Json<UserProfile> {
    Json(UserProfile {
        id: user.id,
        email: user.email,
        name: user.name,
        role: user.role,
    })
}
