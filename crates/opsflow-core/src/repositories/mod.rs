//! Repository traits (ports)

pub mod notification_repository;
pub mod profile_repository;
pub mod tenant_request_repository;
pub mod user_repository;

pub use notification_repository::NotificationRepository;
pub use profile_repository::ProfileRepository;
pub use tenant_request_repository::{AcceptOutcome, TenantRequestRepository};
pub use user_repository::UserRepository;
