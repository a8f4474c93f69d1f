//! In-process auth provider
//!
//! Implements the [`AuthProvider`] port directly over [`AuthService`], for
//! embedded deployments and integration tests where no remote identity
//! provider sits between the session manager and the account store.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use opsflow_auth::provider::{AuthProvider, Credentials, SessionChange};
use opsflow_auth::{AuthError, Session};
use opsflow_shared::{EventBus, Subscription};

use crate::error::DomainError;
use crate::repositories::{ProfileRepository, UserRepository};
use crate::services::auth_service::AuthService;

pub struct LocalAuthProvider<U: UserRepository, P: ProfileRepository> {
    auth: Arc<AuthService<U, P>>,
    session: Mutex<Option<Session>>,
    bus: EventBus<SessionChange>,
    session_ttl_seconds: i64,
}

impl<U: UserRepository, P: ProfileRepository> LocalAuthProvider<U, P> {
    pub fn new(auth: Arc<AuthService<U, P>>, session_ttl_seconds: i64) -> Self {
        Self {
            auth,
            session: Mutex::new(None),
            bus: EventBus::new(),
            session_ttl_seconds,
        }
    }

    fn set_session(&self, session: Option<Session>) {
        *self.session.lock().expect("session lock poisoned") = session.clone();
        self.bus.emit(&SessionChange { session });
    }
}

fn map_domain_error(e: DomainError) -> AuthError {
    match e {
        DomainError::InvalidCredentials => AuthError::InvalidCredentials,
        DomainError::UserNotActive => AuthError::AccountNotActive,
        DomainError::EmailAlreadyExists(email) => AuthError::EmailAlreadyRegistered(email),
        DomainError::ValidationError(msg) => AuthError::InvalidInput(msg),
        other => AuthError::Internal(other.to_string()),
    }
}

#[async_trait]
impl<U, P> AuthProvider for LocalAuthProvider<U, P>
where
    U: UserRepository + 'static,
    P: ProfileRepository + 'static,
{
    async fn fetch_session(&self) -> Result<Option<Session>, AuthError> {
        Ok(self.session.lock().expect("session lock poisoned").clone())
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let result = self
            .auth
            .login(&credentials.email, &credentials.password)
            .await
            .map_err(map_domain_error)?;
        let session = Session {
            user_id: result.user.id,
            email: result.user.email,
            expires_at: Utc::now() + Duration::seconds(self.session_ttl_seconds),
        };
        self.set_session(Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(
        &self,
        credentials: &Credentials,
        full_name: Option<&str>,
    ) -> Result<(), AuthError> {
        self.auth
            .register(&credentials.email, &credentials.password, full_name)
            .await
            .map(|_| ())
            .map_err(map_domain_error)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.set_session(None);
        Ok(())
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        self.auth
            .request_password_reset(email)
            .await
            .map_err(map_domain_error)
    }

    fn on_session_change(
        &self,
        handler: Box<dyn Fn(&SessionChange) + Send + Sync>,
    ) -> Subscription {
        self.bus.subscribe(move |change| handler(change))
    }
}
