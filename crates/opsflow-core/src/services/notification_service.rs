// ============================================================================
// Opsflow Core - Notification Service
// File: crates/opsflow-core/src/services/notification_service.rs
// ============================================================================
//! Workflow-outcome notification delivery with read/unread tracking.
//!
//! Delivery is at-least-once: persistence happens first, then the push, and
//! a consumer may see the same insert twice. [`NotificationFeed`] is the
//! consumer-side mailbox that de-duplicates by id and reconciles its
//! optimistic unread counter against the authoritative count on refresh.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::info;
use uuid::Uuid;

use opsflow_shared::{EventBus, Subscription};

use crate::domain::{Notification, NotificationKind};
use crate::error::DomainError;
use crate::repositories::NotificationRepository;

pub struct NotificationService<N: NotificationRepository> {
    repo: Arc<N>,
    bus: EventBus<Notification>,
}

impl<N: NotificationRepository> NotificationService<N> {
    pub fn new(repo: Arc<N>) -> Self {
        Self {
            repo,
            bus: EventBus::new(),
        }
    }

    /// Push delivery of new notifications scoped to the recipient.
    /// Unsubscribing stops delivery synchronously.
    pub fn subscribe<F>(&self, user_id: Uuid, handler: F) -> Subscription
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.bus.subscribe(move |notification: &Notification| {
            if notification.user_id == user_id {
                handler(notification);
            }
        })
    }

    /// Persist a notification, then push it to subscribers.
    pub async fn notify(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        title: String,
        message: String,
    ) -> Result<Notification, DomainError> {
        let notification = Notification::new(user_id, kind, title, message);
        let stored = self.repo.insert(&notification).await?;
        info!(
            "Notification {} ({}) delivered to user {}",
            stored.id,
            kind.as_str(),
            user_id
        );
        self.bus.emit(&stored);
        Ok(stored)
    }

    pub async fn list(&self, user_id: &Uuid, limit: u32) -> Result<Vec<Notification>, DomainError> {
        self.repo.list(user_id, limit).await
    }

    pub async fn list_unread(&self, user_id: &Uuid) -> Result<Vec<Notification>, DomainError> {
        self.repo.list_unread(user_id).await
    }

    pub async fn unread_count(&self, user_id: &Uuid) -> Result<i64, DomainError> {
        self.repo.unread_count(user_id).await
    }

    /// Idempotent: marking an already-read notification is a no-op.
    pub async fn mark_read(&self, id: &Uuid, caller: &Uuid) -> Result<(), DomainError> {
        let notification = self.repo.find_by_id(id).await?.ok_or(DomainError::NotFound)?;
        if notification.user_id != *caller {
            return Err(DomainError::Unauthorized);
        }
        if notification.is_read {
            return Ok(());
        }
        self.repo.mark_read(id).await?;
        Ok(())
    }

    /// Idempotent; returns the number of notifications affected.
    pub async fn mark_all_read(&self, caller: &Uuid) -> Result<i64, DomainError> {
        self.repo.mark_all_read(caller).await
    }
}

#[derive(Debug, Default)]
struct FeedState {
    items: Vec<Notification>,
    seen: HashSet<Uuid>,
    unread: i64,
}

/// Consumer-side mailbox over at-least-once insert delivery.
#[derive(Debug, Default)]
pub struct NotificationFeed {
    state: Mutex<FeedState>,
}

impl NotificationFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a pushed insert. Duplicates (by id) are dropped; returns
    /// whether the event was newly applied.
    pub fn on_insert(&self, notification: &Notification) -> bool {
        let mut state = self.state.lock().expect("feed lock poisoned");
        if !state.seen.insert(notification.id) {
            return false;
        }
        if !notification.is_read {
            state.unread += 1;
        }
        state.items.insert(0, notification.clone());
        true
    }

    /// Optimistically flip a local item to read.
    pub fn mark_read_local(&self, id: &Uuid) {
        let mut state = self.state.lock().expect("feed lock poisoned");
        if let Some(item) = state.items.iter_mut().find(|n| n.id == *id) {
            if !item.is_read {
                item.is_read = true;
                state.unread -= 1;
            }
        }
    }

    /// Replace local state with the authoritative view. The optimistic
    /// unread counter is never trusted past this point.
    pub fn reconcile(&self, items: Vec<Notification>, authoritative_unread: i64) {
        let mut state = self.state.lock().expect("feed lock poisoned");
        state.seen = items.iter().map(|n| n.id).collect();
        state.items = items;
        state.unread = authoritative_unread;
    }

    pub fn items(&self) -> Vec<Notification> {
        self.state.lock().expect("feed lock poisoned").items.clone()
    }

    pub fn unread(&self) -> i64 {
        self.state.lock().expect("feed lock poisoned").unread
    }
}
