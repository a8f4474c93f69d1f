// ============================================================================
// Opsflow API - Auth Handlers
// File: crates/opsflow-api/src/handlers/auth.rs
// ============================================================================
//! Authentication HTTP handlers (login, register, logout, reset)

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use opsflow_core::services::UserInfo;

use crate::error::{self, ErrorResponse};
use crate::response::ApiResponse;
use crate::state::AppState;

/// Login request payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Register request payload
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
}

/// User DTO for responses
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub email_verified: bool,
}

impl From<UserInfo> for UserDto {
    fn from(user: UserInfo) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email,
            full_name: user.full_name,
            email_verified: user.email_verified,
        }
    }
}

/// Authentication response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserDto,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserDto,
}

/// Login handler - POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ErrorResponse> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(error::validation("Email and password are required"));
    }

    let result = state
        .auth
        .login(&payload.email, &payload.password)
        .await
        .map_err(error::domain_error)?;

    Ok(Json(ApiResponse::success(AuthResponse {
        user: result.user.into(),
        access_token: result.access_token,
        refresh_token: result.refresh_token,
    })))
}

/// Register handler - POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<RegisterResponse>>, ErrorResponse> {
    if payload.email.is_empty() {
        return Err(error::validation("Email is required"));
    }

    let result = state
        .auth
        .register(
            &payload.email,
            &payload.password,
            payload.full_name.as_deref(),
        )
        .await
        .map_err(error::domain_error)?;

    Ok(Json(ApiResponse::success(RegisterResponse {
        user: result.user.into(),
    })))
}

/// Logout handler - POST /api/v1/auth/logout
///
/// Access tokens are stateless; the client discards them. The endpoint
/// exists so the client flow has an explicit end.
pub async fn logout() -> Json<ApiResponse<()>> {
    Json(ApiResponse::success(()))
}

/// Reset request handler - POST /api/v1/auth/reset-password
///
/// Always acknowledges, never revealing whether the account exists.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ErrorResponse> {
    state
        .auth
        .request_password_reset(&payload.email)
        .await
        .map_err(error::domain_error)?;
    Ok(Json(ApiResponse::success(())))
}
