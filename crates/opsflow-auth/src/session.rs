// ============================================================================
// Opsflow Auth - Session Manager
// File: crates/opsflow-auth/src/session.rs
// ============================================================================
//! Session lifecycle: baseline fetch, push updates, sign-in/out.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use opsflow_shared::{EventBus, Subscription};

use crate::error::AuthError;
use crate::provider::{AuthProvider, Credentials, SessionChange};

/// Authenticated session, owned by the external provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

#[derive(Debug)]
struct SessionState {
    session: Option<Session>,
    /// True once the baseline session is known (via fetch or a push that
    /// arrived first). Until then the manager reports loading.
    baseline: bool,
    /// Bumped on every applied change; consumers tag in-flight work with it
    /// and discard results whose generation no longer matches.
    generation: u64,
}

/// Explicitly constructed session service. Owns local session state, applies
/// provider push notifications, and fans changes out on its own bus.
pub struct SessionManager {
    provider: Arc<dyn AuthProvider>,
    state: Arc<Mutex<SessionState>>,
    bus: EventBus<SessionChange>,
    _provider_sub: Subscription,
}

impl SessionManager {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        let state = Arc::new(Mutex::new(SessionState {
            session: None,
            baseline: false,
            generation: 0,
        }));
        let bus = EventBus::new();

        let handler_state = Arc::clone(&state);
        let handler_bus = bus.clone();
        let provider_sub = provider.on_session_change(Box::new(move |change| {
            {
                let mut s = handler_state.lock().expect("session state lock poisoned");
                s.baseline = true;
                s.session = change.session.clone();
                s.generation += 1;
            }
            handler_bus.emit(change);
        }));

        Self {
            provider,
            state,
            bus,
            _provider_sub: provider_sub,
        }
    }

    /// Establish the baseline with one authoritative fetch.
    ///
    /// If a provider push lands before the fetch resolves, the push is the
    /// baseline and the fetch result is discarded; later pushes are normal
    /// change notifications.
    pub async fn initialize(&self) -> Result<(), AuthError> {
        let fetched = self.provider.fetch_session().await?;
        let change = {
            let mut s = self.state.lock().expect("session state lock poisoned");
            if s.baseline {
                None
            } else {
                s.baseline = true;
                s.session = fetched.clone();
                s.generation += 1;
                Some(SessionChange { session: fetched })
            }
        };
        if let Some(change) = change {
            self.bus.emit(&change);
        }
        Ok(())
    }

    /// The live session, if any. Expiry is enforced on every read rather
    /// than trusted to a provider push, so an expired session reads as
    /// signed out even before the provider notices.
    pub fn current_session(&self) -> Option<Session> {
        self.state
            .lock()
            .expect("session state lock poisoned")
            .session
            .clone()
            .filter(|s| !s.is_expired())
    }

    /// True until the baseline session has been established.
    pub fn is_loading(&self) -> bool {
        !self.state.lock().expect("session state lock poisoned").baseline
    }

    pub fn generation(&self) -> u64 {
        self.state.lock().expect("session state lock poisoned").generation
    }

    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&SessionChange) + Send + Sync + 'static,
    {
        self.bus.subscribe(handler)
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<(), AuthError> {
        let session = self.provider.sign_in(credentials).await?;
        info!("Sign-in successful for user {}", session.user_id);
        self.apply(Some(session));
        Ok(())
    }

    pub async fn sign_up(
        &self,
        credentials: &Credentials,
        full_name: Option<&str>,
    ) -> Result<(), AuthError> {
        self.provider.sign_up(credentials, full_name).await
    }

    /// Clear local state first, then tell the provider. Sign-out has no
    /// useful failure recovery, so provider errors are logged and swallowed
    /// (fail-open to logged-out).
    pub async fn sign_out(&self) {
        self.apply(None);
        if let Err(e) = self.provider.sign_out().await {
            warn!("Provider sign-out failed (already logged out locally): {}", e);
        }
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        self.provider.request_password_reset(email).await
    }

    fn apply(&self, session: Option<Session>) {
        let change = {
            let mut s = self.state.lock().expect("session state lock poisoned");
            s.baseline = true;
            s.session = session.clone();
            s.generation += 1;
            SessionChange { session }
        };
        self.bus.emit(&change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use async_trait::async_trait;
    use chrono::Duration;

    fn session_for(email: &str) -> Session {
        Session {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    /// Provider fake: scripted fetch result, optional push emitted while the
    /// fetch is still in flight, and a controllable sign-out result.
    struct FakeProvider {
        fetch_result: Option<Session>,
        push_during_fetch: Option<Session>,
        fail_sign_out: bool,
        bus: EventBus<SessionChange>,
        sign_out_calls: AtomicUsize,
    }

    impl FakeProvider {
        fn new(fetch_result: Option<Session>) -> Self {
            Self {
                fetch_result,
                push_during_fetch: None,
                fail_sign_out: false,
                bus: EventBus::new(),
                sign_out_calls: AtomicUsize::new(0),
            }
        }

        fn push(&self, session: Option<Session>) {
            self.bus.emit(&SessionChange { session });
        }
    }

    #[async_trait]
    impl AuthProvider for FakeProvider {
        async fn fetch_session(&self) -> Result<Option<Session>, AuthError> {
            if let Some(pushed) = &self.push_during_fetch {
                self.bus.emit(&SessionChange {
                    session: Some(pushed.clone()),
                });
            }
            Ok(self.fetch_result.clone())
        }

        async fn sign_in(&self, _credentials: &Credentials) -> Result<Session, AuthError> {
            Ok(session_for("signed-in@example.com"))
        }

        async fn sign_up(
            &self,
            _credentials: &Credentials,
            _full_name: Option<&str>,
        ) -> Result<(), AuthError> {
            Ok(())
        }

        async fn sign_out(&self) -> Result<(), AuthError> {
            self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_sign_out {
                Err(AuthError::ProviderUnreachable("network down".into()))
            } else {
                Ok(())
            }
        }

        async fn request_password_reset(&self, _email: &str) -> Result<(), AuthError> {
            Ok(())
        }

        fn on_session_change(
            &self,
            handler: Box<dyn Fn(&SessionChange) + Send + Sync>,
        ) -> Subscription {
            self.bus.subscribe(move |change| handler(change))
        }
    }

    #[tokio::test]
    async fn test_initialize_establishes_baseline() {
        let session = session_for("alice@example.com");
        let provider = Arc::new(FakeProvider::new(Some(session.clone())));
        let manager = SessionManager::new(provider);

        assert!(manager.is_loading());
        manager.initialize().await.unwrap();
        assert!(!manager.is_loading());
        assert_eq!(manager.current_session().unwrap().user_id, session.user_id);
    }

    #[tokio::test]
    async fn test_expired_session_reads_as_signed_out() {
        let mut expired = session_for("alice@example.com");
        expired.expires_at = Utc::now() - Duration::minutes(1);
        let provider = Arc::new(FakeProvider::new(Some(expired)));
        let manager = SessionManager::new(provider);

        manager.initialize().await.unwrap();

        // The baseline is established, but the session itself is dead.
        assert!(!manager.is_loading());
        assert!(manager.current_session().is_none());
    }

    #[tokio::test]
    async fn test_push_racing_initialize_wins() {
        let fetched = session_for("stale@example.com");
        let pushed = session_for("fresh@example.com");
        let mut provider = FakeProvider::new(Some(fetched));
        provider.push_during_fetch = Some(pushed.clone());
        let manager = SessionManager::new(Arc::new(provider));

        manager.initialize().await.unwrap();

        // The push established the baseline; the fetch result was discarded.
        assert_eq!(manager.current_session().unwrap().user_id, pushed.user_id);
        assert_eq!(manager.generation(), 1);
    }

    #[tokio::test]
    async fn test_later_pushes_are_normal_changes() {
        let provider = Arc::new(FakeProvider::new(None));
        let manager = SessionManager::new(provider.clone() as Arc<dyn AuthProvider>);
        manager.initialize().await.unwrap();
        let gen_before = manager.generation();

        let next = session_for("bob@example.com");
        provider.push(Some(next.clone()));

        assert_eq!(manager.current_session().unwrap().user_id, next.user_id);
        assert_eq!(manager.generation(), gen_before + 1);
    }

    #[tokio::test]
    async fn test_sign_out_clears_locally_even_when_provider_fails() {
        let session = session_for("alice@example.com");
        let mut provider = FakeProvider::new(Some(session));
        provider.fail_sign_out = true;
        let provider = Arc::new(provider);
        let manager = SessionManager::new(provider.clone() as Arc<dyn AuthProvider>);
        manager.initialize().await.unwrap();
        assert!(manager.current_session().is_some());

        manager.sign_out().await;

        assert!(manager.current_session().is_none());
        assert_eq!(provider.sign_out_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let provider = Arc::new(FakeProvider::new(None));
        let manager = SessionManager::new(provider.clone() as Arc<dyn AuthProvider>);
        manager.initialize().await.unwrap();

        let seen = Arc::new(AtomicUsize::new(0));
        let seen2 = Arc::clone(&seen);
        let sub = manager.subscribe(move |_| {
            seen2.fetch_add(1, Ordering::SeqCst);
        });

        provider.push(Some(session_for("a@example.com")));
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        sub.cancel();
        provider.push(None);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sign_in_applies_session() {
        let provider = Arc::new(FakeProvider::new(None));
        let manager = SessionManager::new(provider);
        manager.initialize().await.unwrap();

        manager
            .sign_in(&Credentials {
                email: "signed-in@example.com".into(),
                password: "correct-horse-battery".into(),
            })
            .await
            .unwrap();

        assert_eq!(
            manager.current_session().unwrap().email,
            "signed-in@example.com"
        );
    }
}
