// ============================================================================
// Opsflow API - Tenant Request Handlers
// File: crates/opsflow-api/src/handlers/tenant_request.rs
// ============================================================================
//! Requester-side tenant request handlers

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use opsflow_core::domain::{CreateTenantRequest, TenantRequest, TenantRequestPatch};
use opsflow_core::repositories::AcceptOutcome;

use crate::error::{self, ErrorResponse};
use crate::middleware::CurrentUser;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AcceptedDto {
    pub request: TenantRequest,
    pub tenant_id: String,
    pub tenant_name: String,
    pub role: String,
    pub already_accepted: bool,
}

impl From<AcceptOutcome> for AcceptedDto {
    fn from(outcome: AcceptOutcome) -> Self {
        Self {
            request: outcome.request,
            tenant_id: outcome.tenant.id.to_string(),
            tenant_name: outcome.tenant.name,
            role: outcome.profile.role.to_string(),
            already_accepted: outcome.already_accepted,
        }
    }
}

/// POST /api/v1/tenant-requests
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CreateTenantRequest>,
) -> Result<Json<ApiResponse<TenantRequest>>, ErrorResponse> {
    let request = state
        .workflow
        .create(user.id, payload)
        .await
        .map_err(error::domain_error)?;
    Ok(Json(ApiResponse::success(request)))
}

/// GET /api/v1/tenant-requests
pub async fn list_mine(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<Vec<TenantRequest>>>, ErrorResponse> {
    let requests = state
        .workflow
        .list_mine(&user.id)
        .await
        .map_err(error::domain_error)?;
    Ok(Json(ApiResponse::success(requests)))
}

/// GET /api/v1/tenant-requests/active
///
/// The caller's single open request (`pending` or `approved`), or null.
pub async fn active(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<Option<TenantRequest>>>, ErrorResponse> {
    let request = state
        .workflow
        .find_open(&user.id)
        .await
        .map_err(error::domain_error)?;
    Ok(Json(ApiResponse::success(request)))
}

/// PATCH /api/v1/tenant-requests/{id}
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<TenantRequestPatch>,
) -> Result<Json<ApiResponse<TenantRequest>>, ErrorResponse> {
    let request = state
        .workflow
        .update(&id, &user.id, patch)
        .await
        .map_err(error::domain_error)?;
    Ok(Json(ApiResponse::success(request)))
}

/// DELETE /api/v1/tenant-requests/{id}
pub async fn cancel(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ErrorResponse> {
    state
        .workflow
        .cancel(&id, &user.id)
        .await
        .map_err(error::domain_error)?;
    Ok(Json(ApiResponse::success(())))
}

/// POST /api/v1/tenant-requests/{id}/accept
pub async fn accept(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AcceptedDto>>, ErrorResponse> {
    let outcome = state
        .workflow
        .accept(&id, &user.id)
        .await
        .map_err(error::domain_error)?;
    Ok(Json(ApiResponse::success(outcome.into())))
}
