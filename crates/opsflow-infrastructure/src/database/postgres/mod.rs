//! PostgreSQL repository implementations

pub mod notification_repo_impl;
pub mod profile_repo_impl;
pub mod tenant_request_repo_impl;
pub mod user_repo_impl;

pub use notification_repo_impl::PgNotificationRepository;
pub use profile_repo_impl::PgProfileRepository;
pub use tenant_request_repo_impl::PgTenantRequestRepository;
pub use user_repo_impl::PgUserRepository;
