//! # Opsflow Core - Domain Module
//!
//! Domain entities for the identity/tenant lifecycle subsystem.

pub mod notification;
pub mod profile;
pub mod tenant;
pub mod tenant_request;
pub mod user;

pub use notification::{Notification, NotificationKind};
pub use profile::{Profile, ProfileWithTenant, Role};
pub use tenant::Tenant;
pub use tenant_request::{
    CreateTenantRequest, RequestStatus, TenantRequest, TenantRequestPatch, TenantRequestWithUser,
};
pub use user::User;
