//! Domain services (business logic)

pub mod auth_service;
pub mod auth_state;
pub mod local_provider;
pub mod notification_service;
pub mod profile_resolver;
pub mod workflow;

pub use auth_service::{AuthService, LoginResult, RegisterResult, UserInfo};
pub use auth_state::{AuthSnapshot, AuthState};
pub use local_provider::LocalAuthProvider;
pub use notification_service::{NotificationFeed, NotificationService};
pub use profile_resolver::{ProfileResolver, ResolveOutcome};
pub use workflow::{TenantRequestWorkflow, WorkflowSettings};
