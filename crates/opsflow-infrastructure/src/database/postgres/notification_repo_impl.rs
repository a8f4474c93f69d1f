// ============================================================================
// Opsflow Infrastructure - PostgreSQL Notification Repository
// File: crates/opsflow-infrastructure/src/database/postgres/notification_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::error;
use uuid::Uuid;

use opsflow_core::domain::{Notification, NotificationKind};
use opsflow_core::error::DomainError;
use opsflow_core::repositories::NotificationRepository;

pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal row type for SQLx mapping
#[derive(Debug, FromRow)]
struct NotificationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Notification {
            id: row.id,
            user_id: row.user_id,
            kind: NotificationKind::from_str(&row.kind)
                .unwrap_or(NotificationKind::RequestApproved),
            title: row.title,
            message: row.message,
            is_read: row.is_read,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Notification>, DomainError> {
        let row: Option<NotificationRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, kind, title, message, is_read, created_at
            FROM notifications
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding notification by id: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| r.into()))
    }

    async fn list(&self, user_id: &Uuid, limit: u32) -> Result<Vec<Notification>, DomainError> {
        let rows: Vec<NotificationRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, kind, title, message, is_read, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing notifications: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn list_unread(&self, user_id: &Uuid) -> Result<Vec<Notification>, DomainError> {
        let rows: Vec<NotificationRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, kind, title, message, is_read, created_at
            FROM notifications
            WHERE user_id = $1 AND is_read = FALSE
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing unread notifications: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn unread_count(&self, user_id: &Uuid) -> Result<i64, DomainError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error counting unread notifications: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(count)
    }

    async fn insert(&self, notification: &Notification) -> Result<Notification, DomainError> {
        let row: NotificationRow = sqlx::query_as(
            r#"
            INSERT INTO notifications (id, user_id, kind, title, message, is_read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, kind, title, message, is_read, created_at
            "#,
        )
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.is_read)
        .bind(notification.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error inserting notification: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.into())
    }

    async fn mark_read(&self, id: &Uuid) -> Result<bool, DomainError> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND is_read = FALSE")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|e: sqlx::Error| {
                    error!("Database error marking notification read: {}", e);
                    DomainError::DatabaseError(e.to_string())
                })?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, user_id: &Uuid) -> Result<i64, DomainError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error marking notifications read: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(result.rows_affected() as i64)
    }
}
