// ============================================================================
// Opsflow API - Notification Handlers
// File: crates/opsflow-api/src/handlers/notification.rs
// ============================================================================
//! Notification feed handlers, including the SSE insert stream.
//!
//! The stream is at-least-once: a client that reconnects around a delivery
//! may see the same insert twice and de-duplicates by notification id,
//! reconciling its unread counter against `unread-count`.

use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use opsflow_core::domain::Notification;
use opsflow_shared::constants::DEFAULT_NOTIFICATION_LIMIT;
use opsflow_shared::Subscription;

use crate::error::{self, ErrorResponse};
use crate::middleware::CurrentUser;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountDto {
    pub unread: i64,
}

#[derive(Debug, Serialize)]
pub struct ReadAllDto {
    pub affected: i64,
}

/// GET /api/v1/notifications?limit=
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<Notification>>>, ErrorResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_NOTIFICATION_LIMIT);
    let notifications = state
        .notifications
        .list(&user.id, limit)
        .await
        .map_err(error::domain_error)?;
    Ok(Json(ApiResponse::success(notifications)))
}

/// GET /api/v1/notifications/unread
pub async fn list_unread(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<Vec<Notification>>>, ErrorResponse> {
    let notifications = state
        .notifications
        .list_unread(&user.id)
        .await
        .map_err(error::domain_error)?;
    Ok(Json(ApiResponse::success(notifications)))
}

/// GET /api/v1/notifications/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<UnreadCountDto>>, ErrorResponse> {
    let unread = state
        .notifications
        .unread_count(&user.id)
        .await
        .map_err(error::domain_error)?;
    Ok(Json(ApiResponse::success(UnreadCountDto { unread })))
}

/// POST /api/v1/notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ErrorResponse> {
    state
        .notifications
        .mark_read(&id, &user.id)
        .await
        .map_err(error::domain_error)?;
    Ok(Json(ApiResponse::success(())))
}

/// POST /api/v1/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<ReadAllDto>>, ErrorResponse> {
    let affected = state
        .notifications
        .mark_all_read(&user.id)
        .await
        .map_err(error::domain_error)?;
    Ok(Json(ApiResponse::success(ReadAllDto { affected })))
}

/// GET /api/v1/notifications/stream
///
/// Server-sent `insert` events for the caller. The subscription is held in
/// the stream state, so disconnecting cancels it.
pub async fn stream(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Notification>();
    let subscription = state.notifications.subscribe(user.id, move |n| {
        // Receiver dropped means the client went away; nothing to do.
        let _ = tx.send(n.clone());
    });

    let events = futures::stream::unfold(
        (rx, subscription),
        |(mut rx, sub): (
            tokio::sync::mpsc::UnboundedReceiver<Notification>,
            Subscription,
        )| async move {
            let notification = rx.recv().await?;
            let event = Event::default().event("insert").json_data(&notification);
            Some((event, (rx, sub)))
        },
    );

    Sse::new(events).keep_alive(KeepAlive::default())
}
