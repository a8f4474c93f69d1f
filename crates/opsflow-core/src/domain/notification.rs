//! Notification domain entity
//!
//! Append-only; only the read flag is ever mutated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Workflow-outcome notification kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    RequestApproved,
    RequestRejected,
    TenantCreated,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::RequestApproved => "request_approved",
            NotificationKind::RequestRejected => "request_rejected",
            NotificationKind::TenantCreated => "tenant_created",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "request_approved" => Some(NotificationKind::RequestApproved),
            "request_rejected" => Some(NotificationKind::RequestRejected),
            "tenant_created" => Some(NotificationKind::TenantCreated),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(user_id: Uuid, kind: NotificationKind, title: String, message: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            title,
            message,
            is_read: false,
            created_at: Utc::now(),
        }
    }
}
