//! Notification repository trait (port)

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::Notification;
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Notification>, DomainError>;

    /// Newest first, capped at `limit`.
    async fn list(&self, user_id: &Uuid, limit: u32) -> Result<Vec<Notification>, DomainError>;

    async fn list_unread(&self, user_id: &Uuid) -> Result<Vec<Notification>, DomainError>;

    async fn unread_count(&self, user_id: &Uuid) -> Result<i64, DomainError>;

    async fn insert(&self, notification: &Notification) -> Result<Notification, DomainError>;

    /// Flip the read flag. Returns `false` when it was already read.
    async fn mark_read(&self, id: &Uuid) -> Result<bool, DomainError>;

    /// Mark everything unread as read; returns the number of rows affected.
    async fn mark_all_read(&self, user_id: &Uuid) -> Result<i64, DomainError>;
}
