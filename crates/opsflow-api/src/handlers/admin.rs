// ============================================================================
// Opsflow API - Admin Review Handlers
// File: crates/opsflow-api/src/handlers/admin.rs
// ============================================================================
//! Administrative tenant request review handlers

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use opsflow_core::domain::{RequestStatus, TenantRequest, TenantRequestWithUser};

use crate::error::{self, ErrorResponse};
use crate::middleware::AdminUser;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PendingCountDto {
    pub pending: i64,
}

/// GET /api/v1/admin/tenant-requests?status=
pub async fn list(
    State(state): State<AppState>,
    admin: AdminUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<TenantRequestWithUser>>>, ErrorResponse> {
    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(s) => Some(
            RequestStatus::from_str(s)
                .ok_or_else(|| error::validation("Unknown status filter"))?,
        ),
    };

    let requests = state
        .workflow
        .list_all(&admin.id, status)
        .await
        .map_err(error::domain_error)?;
    Ok(Json(ApiResponse::success(requests)))
}

/// GET /api/v1/admin/tenant-requests/pending-count
pub async fn pending_count(
    State(state): State<AppState>,
    admin: AdminUser,
) -> Result<Json<ApiResponse<PendingCountDto>>, ErrorResponse> {
    let pending = state
        .workflow
        .pending_count(&admin.id)
        .await
        .map_err(error::domain_error)?;
    Ok(Json(ApiResponse::success(PendingCountDto { pending })))
}

/// POST /api/v1/admin/tenant-requests/{id}/approve
pub async fn approve(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewRequest>,
) -> Result<Json<ApiResponse<TenantRequest>>, ErrorResponse> {
    let request = state
        .workflow
        .approve(&id, &admin.id, payload.notes.as_deref())
        .await
        .map_err(error::domain_error)?;
    Ok(Json(ApiResponse::success(request)))
}

/// POST /api/v1/admin/tenant-requests/{id}/reject
pub async fn reject(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewRequest>,
) -> Result<Json<ApiResponse<TenantRequest>>, ErrorResponse> {
    let request = state
        .workflow
        .reject(&id, &admin.id, payload.notes.as_deref())
        .await
        .map_err(error::domain_error)?;
    Ok(Json(ApiResponse::success(request)))
}
