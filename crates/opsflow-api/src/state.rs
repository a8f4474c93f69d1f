//! Shared application state, wired over the PostgreSQL adapters.

use std::sync::Arc;

use opsflow_auth::JwtService;
use opsflow_core::services::{AuthService, NotificationService, TenantRequestWorkflow};
use opsflow_infrastructure::{
    PgNotificationRepository, PgProfileRepository, PgTenantRequestRepository, PgUserRepository,
};
use opsflow_shared::config::AppConfig;

pub type ApiAuthService = AuthService<PgUserRepository, PgProfileRepository>;
pub type ApiWorkflow =
    TenantRequestWorkflow<PgTenantRequestRepository, PgProfileRepository, PgNotificationRepository>;
pub type ApiNotifications = NotificationService<PgNotificationRepository>;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub jwt: Arc<JwtService>,
    pub auth: Arc<ApiAuthService>,
    pub profiles: Arc<PgProfileRepository>,
    pub workflow: Arc<ApiWorkflow>,
    pub notifications: Arc<ApiNotifications>,
}
