//! Auth provider port
//!
//! The external authentication provider owns the session; this system only
//! reads it and listens for changes. Delivery is push-based: after the one
//! authoritative fetch at startup, state follows change notifications.

use async_trait::async_trait;
use opsflow_shared::Subscription;

use crate::error::AuthError;
use crate::session::Session;

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// A session-change notification from the provider.
#[derive(Debug, Clone)]
pub struct SessionChange {
    pub session: Option<Session>,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// One authoritative read of the current session.
    async fn fetch_session(&self) -> Result<Option<Session>, AuthError>;

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError>;

    async fn sign_up(
        &self,
        credentials: &Credentials,
        full_name: Option<&str>,
    ) -> Result<(), AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    async fn request_password_reset(&self, email: &str) -> Result<(), AuthError>;

    /// Register for push delivery of session changes, in provider order.
    fn on_session_change(
        &self,
        handler: Box<dyn Fn(&SessionChange) + Send + Sync>,
    ) -> Subscription;
}
