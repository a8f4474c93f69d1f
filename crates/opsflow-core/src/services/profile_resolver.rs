// ============================================================================
// Opsflow Core - Profile Resolver
// File: crates/opsflow-core/src/services/profile_resolver.rs
// ============================================================================
//! Fetches the owned profile (joined with tenant metadata) for a session,
//! with generation-tagged staleness discipline.
//!
//! Every fetch is tagged with the generation current when it started. If the
//! session changes while the fetch is in flight (the owner calls
//! [`ProfileResolver::invalidate`]), the result is discarded on arrival
//! rather than applied: last-writer-wins is not enough, because an older
//! request's response can arrive after a newer one.

use std::sync::{Arc, Mutex};

use tracing::warn;
use uuid::Uuid;

use crate::domain::ProfileWithTenant;
use crate::error::DomainError;
use crate::repositories::ProfileRepository;

#[derive(Debug, Clone)]
pub enum ResolveOutcome {
    /// The result was applied to the cache (profile or explicit none).
    Applied(Option<ProfileWithTenant>),
    /// The session generation changed mid-flight; the result was discarded.
    Stale,
}

#[derive(Debug, Default)]
struct ResolverState {
    generation: u64,
    profile: Option<ProfileWithTenant>,
    /// A resolution for the current generation has completed, even if it
    /// found no row.
    attempted: bool,
    in_flight: u32,
}

pub struct ProfileResolver<P: ProfileRepository> {
    profiles: Arc<P>,
    state: Mutex<ResolverState>,
}

impl<P: ProfileRepository> ProfileResolver<P> {
    pub fn new(profiles: Arc<P>) -> Self {
        Self {
            profiles,
            state: Mutex::new(ResolverState::default()),
        }
    }

    /// Discard cached state and orphan any in-flight fetch. Called by the
    /// owner on every session change.
    pub fn invalidate(&self) {
        let mut state = self.state.lock().expect("resolver lock poisoned");
        state.generation += 1;
        state.profile = None;
        state.attempted = false;
        state.in_flight = 0;
    }

    /// Cached snapshot; replaced wholesale on each successful resolve.
    pub fn current(&self) -> Option<ProfileWithTenant> {
        self.state
            .lock()
            .expect("resolver lock poisoned")
            .profile
            .clone()
    }

    /// Profile loading, distinct from session loading.
    pub fn is_loading(&self) -> bool {
        self.state.lock().expect("resolver lock poisoned").in_flight > 0
    }

    pub fn attempted(&self) -> bool {
        self.state.lock().expect("resolver lock poisoned").attempted
    }

    /// Resolve the profile, serving the cache when the current generation
    /// already has a settled answer.
    pub async fn resolve(&self, user_id: &Uuid) -> Result<ResolveOutcome, DomainError> {
        {
            let state = self.state.lock().expect("resolver lock poisoned");
            if state.attempted {
                return Ok(ResolveOutcome::Applied(state.profile.clone()));
            }
        }
        self.fetch(user_id).await
    }

    /// Force a re-fetch, bypassing the cache. Same staleness discipline.
    pub async fn refresh(&self, user_id: &Uuid) -> Result<ResolveOutcome, DomainError> {
        self.fetch(user_id).await
    }

    async fn fetch(&self, user_id: &Uuid) -> Result<ResolveOutcome, DomainError> {
        let generation = {
            let mut state = self.state.lock().expect("resolver lock poisoned");
            state.in_flight += 1;
            state.generation
        };

        let result = self.profiles.find_with_tenant(user_id).await;

        let mut state = self.state.lock().expect("resolver lock poisoned");
        if state.generation != generation {
            // A newer session owns the cache now; in_flight was reset by the
            // invalidate that bumped the generation.
            warn!("Discarding stale profile resolution for user {}", user_id);
            return Ok(ResolveOutcome::Stale);
        }
        state.in_flight = state.in_flight.saturating_sub(1);

        match result {
            Ok(profile) => {
                state.attempted = true;
                state.profile = profile.clone();
                Ok(ResolveOutcome::Applied(profile))
            }
            // Transient failure: keep last-known-good, stay resolvable.
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Profile, ProfileWithTenant};
    use crate::repositories::ProfileRepository;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Semaphore;

    /// Repository fake whose fetches block until the test releases them.
    struct BlockingProfiles {
        results: Mutex<VecDeque<Option<ProfileWithTenant>>>,
        release: Semaphore,
        calls: AtomicUsize,
    }

    impl BlockingProfiles {
        fn new(results: Vec<Option<ProfileWithTenant>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                release: Semaphore::new(0),
                calls: AtomicUsize::new(0),
            }
        }

        fn release_one(&self) {
            self.release.add_permits(1);
        }
    }

    #[async_trait]
    impl ProfileRepository for BlockingProfiles {
        async fn find_by_id(&self, _id: &Uuid) -> Result<Option<Profile>, DomainError> {
            unimplemented!()
        }

        async fn find_with_tenant(
            &self,
            _id: &Uuid,
        ) -> Result<Option<ProfileWithTenant>, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let permit = self.release.acquire().await.expect("semaphore closed");
            permit.forget();
            Ok(self
                .results
                .lock()
                .expect("results lock poisoned")
                .pop_front()
                .flatten())
        }

        async fn create(&self, _profile: &Profile) -> Result<Profile, DomainError> {
            unimplemented!()
        }

        async fn update_full_name(
            &self,
            _id: &Uuid,
            _full_name: &str,
        ) -> Result<Profile, DomainError> {
            unimplemented!()
        }
    }

    fn with_tenant(user_id: Uuid) -> Option<ProfileWithTenant> {
        Some(ProfileWithTenant {
            profile: Profile::new_guest(user_id, Some("Alice".into())),
            tenant: None,
        })
    }

    #[tokio::test]
    async fn test_resolve_applies_result() {
        let user_id = Uuid::new_v4();
        let repo = Arc::new(BlockingProfiles::new(vec![with_tenant(user_id)]));
        let resolver = Arc::new(ProfileResolver::new(Arc::clone(&repo)));

        repo.release_one();
        let outcome = resolver.resolve(&user_id).await.unwrap();
        assert!(matches!(outcome, ResolveOutcome::Applied(Some(_))));
        assert!(resolver.attempted());
        assert!(resolver.current().is_some());
        assert!(!resolver.is_loading());
    }

    #[tokio::test]
    async fn test_resolve_serves_cache_refresh_does_not() {
        let user_id = Uuid::new_v4();
        let repo = Arc::new(BlockingProfiles::new(vec![
            with_tenant(user_id),
            with_tenant(user_id),
        ]));
        let resolver = Arc::new(ProfileResolver::new(Arc::clone(&repo)));

        repo.release_one();
        resolver.resolve(&user_id).await.unwrap();
        assert_eq!(repo.calls.load(Ordering::SeqCst), 1);

        // Cache hit: no second fetch.
        resolver.resolve(&user_id).await.unwrap();
        assert_eq!(repo.calls.load(Ordering::SeqCst), 1);

        // Refresh bypasses the cache.
        repo.release_one();
        resolver.refresh(&user_id).await.unwrap();
        assert_eq!(repo.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_in_flight_result_discarded_after_invalidate() {
        let user_id = Uuid::new_v4();
        let repo = Arc::new(BlockingProfiles::new(vec![with_tenant(user_id)]));
        let resolver = Arc::new(ProfileResolver::new(Arc::clone(&repo)));

        let task = {
            let resolver = Arc::clone(&resolver);
            tokio::spawn(async move { resolver.resolve(&user_id).await })
        };

        // Wait until the fetch is actually in flight.
        while !resolver.is_loading() {
            tokio::task::yield_now().await;
        }

        // Session changed while the fetch was pending.
        resolver.invalidate();
        repo.release_one();

        let outcome = task.await.unwrap().unwrap();
        assert!(matches!(outcome, ResolveOutcome::Stale));
        assert!(resolver.current().is_none());
        assert!(!resolver.attempted());
    }

    #[tokio::test]
    async fn test_resolved_none_is_attempted() {
        let user_id = Uuid::new_v4();
        let repo = Arc::new(BlockingProfiles::new(vec![None]));
        let resolver = ProfileResolver::new(Arc::clone(&repo));

        repo.release_one();
        let outcome = resolver.resolve(&user_id).await.unwrap();
        assert!(matches!(outcome, ResolveOutcome::Applied(None)));
        assert!(resolver.attempted());
        assert!(resolver.current().is_none());
    }
}
