// ============================================================================
// Opsflow Core - Tenant Request Workflow
// File: crates/opsflow-core/src/services/workflow.rs
// Description: Company-registration approval state machine
// ============================================================================
//! Drives the tenant-request lifecycle: creation, admin review, and the
//! requester-triggered accept that provisions the tenant exactly once.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{
    CreateTenantRequest, NotificationKind, RequestStatus, Role, TenantRequest, TenantRequestPatch,
    TenantRequestWithUser,
};
use crate::error::DomainError;
use crate::repositories::{
    AcceptOutcome, NotificationRepository, ProfileRepository, TenantRequestRepository,
};
use crate::services::notification_service::NotificationService;

use opsflow_shared::config::WorkflowSettings as WorkflowConfig;

/// Workflow configuration.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowSettings {
    /// Role a guest is elevated to on accept. Deployment configuration, not
    /// a fixed mapping.
    pub accepted_role: Role,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            accepted_role: Role::Staff,
        }
    }
}

impl WorkflowSettings {
    pub fn from_config(config: &WorkflowConfig) -> Self {
        match Role::from_str(&config.accepted_role) {
            Some(Role::Guest) | None => {
                warn!(
                    "Invalid workflow.accepted_role {:?}, falling back to staff",
                    config.accepted_role
                );
                Self::default()
            }
            Some(role) => Self { accepted_role: role },
        }
    }
}

pub struct TenantRequestWorkflow<R, P, N>
where
    R: TenantRequestRepository,
    P: ProfileRepository,
    N: NotificationRepository,
{
    requests: Arc<R>,
    profiles: Arc<P>,
    notifications: Arc<NotificationService<N>>,
    settings: WorkflowSettings,
}

impl<R, P, N> TenantRequestWorkflow<R, P, N>
where
    R: TenantRequestRepository,
    P: ProfileRepository,
    N: NotificationRepository,
{
    pub fn new(
        requests: Arc<R>,
        profiles: Arc<P>,
        notifications: Arc<NotificationService<N>>,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            requests,
            profiles,
            notifications,
            settings,
        }
    }

    /// Create a new request in `pending`. A user holds at most one open
    /// (`pending` or `approved`) request at a time: the early lookup gives
    /// a friendly failure, and the store enforces the invariant for creates
    /// that race past it.
    pub async fn create(
        &self,
        user_id: Uuid,
        data: CreateTenantRequest,
    ) -> Result<TenantRequest, DomainError> {
        if self.requests.find_open_by_user(&user_id).await?.is_some() {
            warn!("User {} already has an open tenant request", user_id);
            return Err(DomainError::DuplicateRequest);
        }

        let request = TenantRequest::new(user_id, data)
            .map_err(|e| DomainError::ValidationError(e.to_string()))?;
        let created = self.requests.create(&request).await?;
        info!("Tenant request {} created by user {}", created.id, user_id);
        Ok(created)
    }

    /// Patch company fields; permitted only while pending, only by the
    /// requester.
    pub async fn update(
        &self,
        id: &Uuid,
        caller: &Uuid,
        patch: TenantRequestPatch,
    ) -> Result<TenantRequest, DomainError> {
        let request = self.owned_request(id, caller).await?;
        self.expect_status(&request, RequestStatus::Pending)?;

        patch
            .validate()
            .map_err(|e| DomainError::ValidationError(e.to_string()))?;
        if let Some(name) = &patch.company_name {
            if name.trim().is_empty() {
                return Err(DomainError::ValidationError(
                    "Company name is required".into(),
                ));
            }
        }

        match self.requests.update_pending(id, &patch).await? {
            Some(updated) => Ok(updated),
            None => Err(self.stale_transition(id, RequestStatus::Pending).await?),
        }
    }

    /// Delete a request; permitted only while pending, only by the requester.
    pub async fn cancel(&self, id: &Uuid, caller: &Uuid) -> Result<(), DomainError> {
        let request = self.owned_request(id, caller).await?;
        self.expect_status(&request, RequestStatus::Pending)?;

        if self.requests.delete_pending(id).await? {
            info!("Tenant request {} cancelled by user {}", id, caller);
            Ok(())
        } else {
            Err(self.stale_transition(id, RequestStatus::Pending).await?)
        }
    }

    pub async fn list_mine(&self, user_id: &Uuid) -> Result<Vec<TenantRequest>, DomainError> {
        self.requests.list_by_user(user_id).await
    }

    /// The caller's single open request, if any (pending or approved).
    pub async fn find_open(&self, user_id: &Uuid) -> Result<Option<TenantRequest>, DomainError> {
        self.requests.find_open_by_user(user_id).await
    }

    /// Administrative list, enriched with requester identity where the join
    /// is available.
    pub async fn list_all(
        &self,
        caller: &Uuid,
        status: Option<RequestStatus>,
    ) -> Result<Vec<TenantRequestWithUser>, DomainError> {
        self.ensure_admin(caller).await?;
        self.requests.list_all(status).await
    }

    pub async fn pending_count(&self, caller: &Uuid) -> Result<i64, DomainError> {
        self.ensure_admin(caller).await?;
        self.requests.count_by_status(RequestStatus::Pending).await
    }

    /// Admin approval: `pending -> approved`, notifies the requester.
    pub async fn approve(
        &self,
        id: &Uuid,
        caller: &Uuid,
        notes: Option<&str>,
    ) -> Result<TenantRequest, DomainError> {
        self.review(id, caller, RequestStatus::Approved, notes).await
    }

    /// Admin rejection: `pending -> rejected` (terminal), notifies the
    /// requester.
    pub async fn reject(
        &self,
        id: &Uuid,
        caller: &Uuid,
        notes: Option<&str>,
    ) -> Result<TenantRequest, DomainError> {
        self.review(id, caller, RequestStatus::Rejected, notes).await
    }

    /// Requester-triggered accept: `approved -> accepted`, provisioning the
    /// tenant and elevating the profile as one atomic unit. Idempotent: a
    /// retried accept returns the existing tenant.
    pub async fn accept(&self, id: &Uuid, caller: &Uuid) -> Result<AcceptOutcome, DomainError> {
        let _ = self.owned_request(id, caller).await?;

        let outcome = self.requests.accept(id, self.settings.accepted_role).await?;

        if outcome.already_accepted {
            info!(
                "Accept retry for request {}: returning existing tenant {}",
                id, outcome.tenant.id
            );
            return Ok(outcome);
        }

        info!(
            "Request {} accepted: tenant {} created, user {} elevated to {}",
            id, outcome.tenant.id, caller, outcome.profile.role
        );

        // Accept is already committed; notification failure must not undo it.
        if let Err(e) = self
            .notifications
            .notify(
                *caller,
                NotificationKind::TenantCreated,
                "Workspace created".into(),
                format!(
                    "Tenant \"{}\" was created and your account was upgraded.",
                    outcome.tenant.name
                ),
            )
            .await
        {
            error!("Failed to deliver tenant-created notification: {}", e);
        }

        Ok(outcome)
    }

    async fn review(
        &self,
        id: &Uuid,
        caller: &Uuid,
        to: RequestStatus,
        notes: Option<&str>,
    ) -> Result<TenantRequest, DomainError> {
        self.ensure_admin(caller).await?;
        let request = self
            .requests
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound)?;

        match self
            .requests
            .transition(id, RequestStatus::Pending, to, notes)
            .await?
        {
            Some(updated) => {
                info!("Request {} moved to {} by admin {}", id, to, caller);
                let (kind, title, message) = match to {
                    RequestStatus::Approved => (
                        NotificationKind::RequestApproved,
                        "Company request approved".to_string(),
                        format!(
                            "Your request for \"{}\" was approved. Accept it to create your workspace.",
                            request.company_name
                        ),
                    ),
                    _ => (
                        NotificationKind::RequestRejected,
                        "Company request rejected".to_string(),
                        match notes {
                            Some(notes) => format!(
                                "Your request for \"{}\" was rejected: {}",
                                request.company_name, notes
                            ),
                            None => format!(
                                "Your request for \"{}\" was rejected.",
                                request.company_name
                            ),
                        },
                    ),
                };
                if let Err(e) = self
                    .notifications
                    .notify(request.user_id, kind, title, message)
                    .await
                {
                    error!("Failed to deliver review notification: {}", e);
                }
                Ok(updated)
            }
            // Another reviewer advanced the request first; observe the
            // already-advanced state and fail cleanly.
            None => Err(self.stale_transition(id, RequestStatus::Pending).await?),
        }
    }

    async fn owned_request(&self, id: &Uuid, caller: &Uuid) -> Result<TenantRequest, DomainError> {
        let request = self
            .requests
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if request.user_id != *caller {
            warn!(
                "User {} attempted to act on request {} owned by {}",
                caller, id, request.user_id
            );
            return Err(DomainError::Unauthorized);
        }
        Ok(request)
    }

    fn expect_status(
        &self,
        request: &TenantRequest,
        expected: RequestStatus,
    ) -> Result<(), DomainError> {
        if request.status == expected {
            Ok(())
        } else {
            Err(DomainError::InvalidStateTransition {
                expected,
                actual: request.status,
            })
        }
    }

    async fn ensure_admin(&self, caller: &Uuid) -> Result<(), DomainError> {
        let profile = self
            .profiles
            .find_by_id(caller)
            .await?
            .ok_or(DomainError::Unauthorized)?;
        if !profile.is_admin() {
            warn!("Non-admin {} attempted an administrative action", caller);
            return Err(DomainError::Unauthorized);
        }
        Ok(())
    }

    /// Build the error for a conditional write that matched no row: report
    /// the state the request actually reached.
    async fn stale_transition(
        &self,
        id: &Uuid,
        expected: RequestStatus,
    ) -> Result<DomainError, DomainError> {
        let actual = self
            .requests
            .find_by_id(id)
            .await?
            .map(|r| r.status)
            .ok_or(DomainError::NotFound)?;
        Ok(DomainError::InvalidStateTransition { expected, actual })
    }
}
