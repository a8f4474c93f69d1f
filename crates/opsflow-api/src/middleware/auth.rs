// ============================================================================
// Opsflow API - Auth Extractors
// File: crates/opsflow-api/src/middleware/auth.rs
// ============================================================================
//! Bearer-token extractors. `CurrentUser` authenticates the access token;
//! `AdminUser` additionally runs the route gate against the caller's
//! profile, so the admin surface shares one decision table with the rest of
//! the application.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;
use tracing::warn;
use uuid::Uuid;

use opsflow_core::gate::{self, GateInput, RouteDecision, RouteRequirement};
use opsflow_core::repositories::ProfileRepository;

use crate::error::{self, ErrorResponse};
use crate::response::ApiResponse;
use crate::state::AppState;

/// The authenticated caller, from the `Authorization: Bearer` access token.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: Uuid,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ErrorResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(error::unauthenticated)?;
        let id = state.jwt.authenticate(token).map_err(|e| {
            warn!("Access token rejected: {}", e);
            error::unauthenticated()
        })?;
        Ok(CurrentUser { id })
    }
}

/// An authenticated caller admitted by the admin route gate.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser {
    pub id: Uuid,
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ErrorResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser { id } = CurrentUser::from_request_parts(parts, state).await?;

        let profile = state
            .profiles
            .find_by_id(&id)
            .await
            .map_err(error::domain_error)?;

        let input = GateInput {
            session_loading: false,
            session_present: true,
            profile_loading: false,
            profile_attempted: true,
            profile: profile.as_ref(),
        };
        match gate::decide(&input, RouteRequirement::Admin) {
            RouteDecision::Authorized => Ok(AdminUser { id }),
            RouteDecision::NeedsOnboarding => Err((
                StatusCode::FORBIDDEN,
                Json(ApiResponse::error(
                    "ONBOARDING_REQUIRED",
                    "Complete onboarding before accessing this resource",
                )),
            )),
            RouteDecision::Forbidden => Err((
                StatusCode::FORBIDDEN,
                Json(ApiResponse::error("FORBIDDEN", "Administrator role required")),
            )),
            RouteDecision::Unauthenticated | RouteDecision::Loading => {
                Err(error::unauthenticated())
            }
        }
    }
}
