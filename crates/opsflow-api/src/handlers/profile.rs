// ============================================================================
// Opsflow API - Profile Handlers
// File: crates/opsflow-api/src/handlers/profile.rs
// ============================================================================
//! Profile HTTP handlers

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use opsflow_core::domain::{Profile, Tenant};
use opsflow_core::error::DomainError;
use opsflow_core::repositories::ProfileRepository;

use crate::error::{self, ErrorResponse};
use crate::middleware::CurrentUser;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProfileDto {
    pub id: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<TenantDto>,
}

#[derive(Debug, Serialize)]
pub struct TenantDto {
    pub id: String,
    pub name: String,
}

impl ProfileDto {
    fn from_parts(profile: Profile, tenant: Option<Tenant>) -> Self {
        Self {
            id: profile.id.to_string(),
            role: profile.role.to_string(),
            tenant_id: profile.tenant_id.map(|id| id.to_string()),
            full_name: profile.full_name,
            tenant: tenant.map(|t| TenantDto {
                id: t.id.to_string(),
                name: t.name,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: String,
}

#[derive(Debug, Serialize)]
pub struct RoleDto {
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct IsAdminDto {
    pub is_admin: bool,
}

/// GET /api/v1/profile/me
pub async fn me(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<ProfileDto>>, ErrorResponse> {
    let resolved = state
        .profiles
        .find_with_tenant(&user.id)
        .await
        .map_err(error::domain_error)?
        .ok_or_else(|| error::domain_error(DomainError::NotFound))?;

    Ok(Json(ApiResponse::success(ProfileDto::from_parts(
        resolved.profile,
        resolved.tenant,
    ))))
}

/// PATCH /api/v1/profile/me
pub async fn update_me(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<ProfileDto>>, ErrorResponse> {
    let name = payload.full_name.trim();
    if name.is_empty() {
        return Err(error::validation("Full name is required"));
    }

    let profile = state
        .profiles
        .update_full_name(&user.id, name)
        .await
        .map_err(error::domain_error)?;

    Ok(Json(ApiResponse::success(ProfileDto::from_parts(
        profile, None,
    ))))
}

/// GET /api/v1/profile/role
pub async fn role(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<RoleDto>>, ErrorResponse> {
    let profile = state
        .profiles
        .find_by_id(&user.id)
        .await
        .map_err(error::domain_error)?
        .ok_or_else(|| error::domain_error(DomainError::NotFound))?;

    Ok(Json(ApiResponse::success(RoleDto {
        role: profile.role.to_string(),
    })))
}

/// GET /api/v1/profile/is-admin
pub async fn is_admin(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<IsAdminDto>>, ErrorResponse> {
    let profile = state
        .profiles
        .find_by_id(&user.id)
        .await
        .map_err(error::domain_error)?;

    // Absent profile reads as not-admin rather than an error.
    Ok(Json(ApiResponse::success(IsAdminDto {
        is_admin: profile.map(|p| p.is_admin()).unwrap_or(false),
    })))
}
