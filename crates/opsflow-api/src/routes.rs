//! Router assembly

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::{admin, auth, health, notification, profile, tenant_request};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth routes
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/reset-password", post(auth::reset_password))
        // Profile routes
        .route("/api/v1/profile/me", get(profile::me).patch(profile::update_me))
        .route("/api/v1/profile/role", get(profile::role))
        .route("/api/v1/profile/is-admin", get(profile::is_admin))
        // Tenant request routes (requester)
        .route(
            "/api/v1/tenant-requests",
            post(tenant_request::create).get(tenant_request::list_mine),
        )
        .route("/api/v1/tenant-requests/active", get(tenant_request::active))
        .route(
            "/api/v1/tenant-requests/{id}",
            patch(tenant_request::update).delete(tenant_request::cancel),
        )
        .route(
            "/api/v1/tenant-requests/{id}/accept",
            post(tenant_request::accept),
        )
        // Tenant request routes (admin review)
        .route("/api/v1/admin/tenant-requests", get(admin::list))
        .route(
            "/api/v1/admin/tenant-requests/pending-count",
            get(admin::pending_count),
        )
        .route(
            "/api/v1/admin/tenant-requests/{id}/approve",
            post(admin::approve),
        )
        .route(
            "/api/v1/admin/tenant-requests/{id}/reject",
            post(admin::reject),
        )
        // Notification routes
        .route("/api/v1/notifications", get(notification::list))
        .route("/api/v1/notifications/unread", get(notification::list_unread))
        .route(
            "/api/v1/notifications/unread-count",
            get(notification::unread_count),
        )
        .route("/api/v1/notifications/{id}/read", post(notification::mark_read))
        .route("/api/v1/notifications/read-all", post(notification::mark_all_read))
        .route("/api/v1/notifications/stream", get(notification::stream))
        .with_state(state)
}
