//! Profile repository trait (port)
//!
//! The profile cache consumer (the resolver) is the single logical writer of
//! its snapshot; these operations are the persistence side. Attaching a
//! tenant and elevating the role happen inside the accept transaction, not
//! through this port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Profile, ProfileWithTenant};
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Profile>, DomainError>;

    /// Profile joined with tenant metadata; `None` when the row does not
    /// exist yet (a transient condition, not an error).
    async fn find_with_tenant(&self, id: &Uuid) -> Result<Option<ProfileWithTenant>, DomainError>;

    async fn create(&self, profile: &Profile) -> Result<Profile, DomainError>;

    async fn update_full_name(&self, id: &Uuid, full_name: &str) -> Result<Profile, DomainError>;
}
