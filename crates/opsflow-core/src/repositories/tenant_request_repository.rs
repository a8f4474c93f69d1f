//! Tenant request repository trait (port)
//!
//! Transitions are serialized per request id at the data layer: `transition`
//! applies only when the stored status still matches the expected pre-state,
//! and `accept` is one atomic unit (tenant create + profile mutate + status
//! flip) that is idempotent when retried on an already-accepted request.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Profile, RequestStatus, Role, Tenant, TenantRequest, TenantRequestPatch, TenantRequestWithUser,
};
use crate::error::DomainError;

/// Result of the accept transition.
#[derive(Debug, Clone)]
pub struct AcceptOutcome {
    pub request: TenantRequest,
    pub tenant: Tenant,
    pub profile: Profile,
    /// True when the request was already accepted and the existing tenant
    /// was returned instead of creating a second one.
    pub already_accepted: bool,
}

#[async_trait]
pub trait TenantRequestRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<TenantRequest>, DomainError>;

    /// The user's single non-terminal (`pending` or `approved`) request.
    async fn find_open_by_user(&self, user_id: &Uuid) -> Result<Option<TenantRequest>, DomainError>;

    async fn list_by_user(&self, user_id: &Uuid) -> Result<Vec<TenantRequest>, DomainError>;

    /// All requests, newest first, enriched with requester identity where
    /// available. Enrichment failure degrades to bare rows.
    async fn list_all(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<Vec<TenantRequestWithUser>, DomainError>;

    async fn count_by_status(&self, status: RequestStatus) -> Result<i64, DomainError>;

    async fn create(&self, request: &TenantRequest) -> Result<TenantRequest, DomainError>;

    /// Patch company fields, applied only while the stored status is still
    /// `pending`. Returns `None` when the precondition no longer holds.
    async fn update_pending(
        &self,
        id: &Uuid,
        patch: &TenantRequestPatch,
    ) -> Result<Option<TenantRequest>, DomainError>;

    /// Delete, applied only while the stored status is still `pending`.
    async fn delete_pending(&self, id: &Uuid) -> Result<bool, DomainError>;

    /// Optimistic-concurrency transition: applied only when the stored
    /// status equals `from`. Returns `None` when another writer advanced the
    /// request first.
    async fn transition(
        &self,
        id: &Uuid,
        from: RequestStatus,
        to: RequestStatus,
        review_notes: Option<&str>,
    ) -> Result<Option<TenantRequest>, DomainError>;

    /// Atomic accept: create the tenant, attach it to the requester's
    /// profile, elevate the role, and flip the status to `accepted`. Keyed
    /// on the request id; a retry on an accepted request returns the
    /// existing tenant.
    async fn accept(&self, id: &Uuid, accepted_role: Role) -> Result<AcceptOutcome, DomainError>;
}
