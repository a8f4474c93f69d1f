//! Health check handler

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub app: String,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthStatus>> {
    Json(ApiResponse::success(HealthStatus {
        status: "ok",
        app: state.config.app.name.clone(),
    }))
}
