// ============================================================================
// Opsflow Core - Composite Auth State
// File: crates/opsflow-core/src/services/auth_state.rs
// ============================================================================
//! Ties the session manager and profile resolver together: session changes
//! invalidate the resolver synchronously, and the combined snapshot is the
//! sole input to the authorization gate.

use std::sync::Arc;

use uuid::Uuid;

use opsflow_auth::{Session, SessionManager};
use opsflow_shared::Subscription;

use crate::domain::{Profile, Tenant};
use crate::error::DomainError;
use crate::gate::{self, GateInput, RouteDecision, RouteRequirement};
use crate::repositories::ProfileRepository;
use crate::services::profile_resolver::ProfileResolver;

pub struct AuthState<P: ProfileRepository> {
    sessions: Arc<SessionManager>,
    resolver: Arc<ProfileResolver<P>>,
    _session_sub: Subscription,
}

/// Point-in-time view of the composite auth state.
#[derive(Debug, Clone)]
pub struct AuthSnapshot {
    pub session: Option<Session>,
    pub profile: Option<Profile>,
    pub tenant: Option<Tenant>,
    pub session_loading: bool,
    pub profile_loading: bool,
    pub profile_attempted: bool,
}

impl AuthSnapshot {
    /// Composite loading: true until the session is settled and, if one
    /// exists, a profile (or explicit none) has been resolved for it.
    pub fn is_loading(&self) -> bool {
        if self.session_loading {
            return true;
        }
        match &self.session {
            Some(_) => self.profile_loading || !self.profile_attempted,
            None => false,
        }
    }

    pub fn is_guest(&self) -> bool {
        self.profile.as_ref().map(Profile::is_guest).unwrap_or(false)
    }

    pub fn is_admin(&self) -> bool {
        self.profile.as_ref().map(Profile::is_admin).unwrap_or(false)
    }

    pub fn is_staff(&self) -> bool {
        self.profile.as_ref().map(Profile::is_staff).unwrap_or(false)
    }

    pub fn has_tenant(&self) -> bool {
        self.profile.as_ref().map(Profile::has_tenant).unwrap_or(false)
    }

    pub fn decide(&self, requirement: RouteRequirement) -> RouteDecision {
        let input = GateInput {
            session_loading: self.session_loading,
            session_present: self.session.is_some(),
            profile_loading: self.profile_loading,
            profile_attempted: self.profile_attempted,
            profile: self.profile.as_ref(),
        };
        gate::decide(&input, requirement)
    }
}

impl<P: ProfileRepository + 'static> AuthState<P> {
    pub fn new(sessions: Arc<SessionManager>, resolver: Arc<ProfileResolver<P>>) -> Self {
        let invalidate_target = Arc::clone(&resolver);
        let session_sub = sessions.subscribe(move |_| invalidate_target.invalidate());
        Self {
            sessions,
            resolver,
            _session_sub: session_sub,
        }
    }

    /// Resolve the profile for the current session if it has not been
    /// resolved yet. Stale results are discarded by the resolver.
    pub async fn reconcile(&self) -> Result<(), DomainError> {
        if self.sessions.is_loading() {
            return Ok(());
        }
        if let Some(session) = self.sessions.current_session() {
            if !self.resolver.attempted() {
                self.resolver.resolve(&session.user_id).await?;
            }
        }
        Ok(())
    }

    /// Caller-triggered refresh, used to observe out-of-band profile writes
    /// (the accept transition mutates the persisted profile directly).
    pub async fn refresh_profile(&self) -> Result<(), DomainError> {
        if let Some(session) = self.sessions.current_session() {
            self.resolver.refresh(&session.user_id).await?;
        }
        Ok(())
    }

    pub fn current_user(&self) -> Option<Uuid> {
        self.sessions.current_session().map(|s| s.user_id)
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        let resolved = self.resolver.current();
        let (profile, tenant) = match resolved {
            Some(p) => (Some(p.profile), p.tenant),
            None => (None, None),
        };
        AuthSnapshot {
            session: self.sessions.current_session(),
            profile,
            tenant,
            session_loading: self.sessions.is_loading(),
            profile_loading: self.resolver.is_loading(),
            profile_attempted: self.resolver.attempted(),
        }
    }
}
