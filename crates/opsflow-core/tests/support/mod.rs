//! In-memory repository adapters backing the integration tests.
//!
//! One shared store implements every port so the accept transition can
//! mutate requests, tenants, and profiles under a single lock, matching the
//! atomicity the production adapter gets from a database transaction.

// Not every test binary touches every helper.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use opsflow_core::domain::{
    Notification, Profile, ProfileWithTenant, RequestStatus, Role, Tenant, TenantRequest,
    TenantRequestPatch, TenantRequestWithUser, User,
};
use opsflow_core::error::DomainError;
use opsflow_core::repositories::{
    AcceptOutcome, NotificationRepository, ProfileRepository, TenantRequestRepository,
    UserRepository,
};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    profiles: HashMap<Uuid, Profile>,
    tenants: HashMap<Uuid, Tenant>,
    requests: HashMap<Uuid, TenantRequest>,
    notifications: Vec<Notification>,
}

#[derive(Default)]
pub struct MemStore {
    state: Mutex<State>,
}

impl MemStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert_profile(&self, profile: Profile) {
        self.state
            .lock()
            .unwrap()
            .profiles
            .insert(profile.id, profile);
    }

    pub fn insert_user(&self, user: User) {
        self.state.lock().unwrap().users.insert(user.id, user);
    }

    pub fn tenant_count(&self) -> usize {
        self.state.lock().unwrap().tenants.len()
    }

    pub fn profile(&self, id: &Uuid) -> Option<Profile> {
        self.state.lock().unwrap().profiles.get(id).cloned()
    }
}

/// Seed an admin account and return its id.
pub fn seed_admin(store: &MemStore) -> Uuid {
    let id = Uuid::new_v4();
    store.insert_profile(Profile {
        id,
        role: Role::Admin,
        tenant_id: None,
        full_name: Some("Admin".into()),
        created_at: Utc::now(),
        updated_at: None,
    });
    id
}

/// Seed a guest user with a profile and return its id.
pub fn seed_guest(store: &MemStore, email: &str, name: &str) -> Uuid {
    let user = User::new(email.into(), "hash".into(), Some(name.into())).unwrap();
    let id = user.id;
    store.insert_user(user);
    store.insert_profile(Profile::new_guest(id, Some(name.into())));
    id
}

#[async_trait]
impl UserRepository for MemStore {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.state.lock().unwrap().users.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, user: &User) -> Result<User, DomainError> {
        self.state
            .lock()
            .unwrap()
            .users
            .insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        self.state
            .lock()
            .unwrap()
            .users
            .insert(user.id, user.clone());
        Ok(user.clone())
    }
}

#[async_trait]
impl ProfileRepository for MemStore {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Profile>, DomainError> {
        Ok(self.state.lock().unwrap().profiles.get(id).cloned())
    }

    async fn find_with_tenant(&self, id: &Uuid) -> Result<Option<ProfileWithTenant>, DomainError> {
        let state = self.state.lock().unwrap();
        Ok(state.profiles.get(id).map(|profile| ProfileWithTenant {
            profile: profile.clone(),
            tenant: profile
                .tenant_id
                .and_then(|tid| state.tenants.get(&tid).cloned()),
        }))
    }

    async fn create(&self, profile: &Profile) -> Result<Profile, DomainError> {
        self.state
            .lock()
            .unwrap()
            .profiles
            .insert(profile.id, profile.clone());
        Ok(profile.clone())
    }

    async fn update_full_name(&self, id: &Uuid, full_name: &str) -> Result<Profile, DomainError> {
        let mut state = self.state.lock().unwrap();
        let profile = state.profiles.get_mut(id).ok_or(DomainError::NotFound)?;
        profile.full_name = Some(full_name.to_string());
        profile.updated_at = Some(Utc::now());
        Ok(profile.clone())
    }

}

#[async_trait]
impl TenantRequestRepository for MemStore {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<TenantRequest>, DomainError> {
        Ok(self.state.lock().unwrap().requests.get(id).cloned())
    }

    async fn find_open_by_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Option<TenantRequest>, DomainError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .requests
            .values()
            .find(|r| r.user_id == *user_id && r.is_open())
            .cloned())
    }

    async fn list_by_user(&self, user_id: &Uuid) -> Result<Vec<TenantRequest>, DomainError> {
        let mut rows: Vec<TenantRequest> = self
            .state
            .lock()
            .unwrap()
            .requests
            .values()
            .filter(|r| r.user_id == *user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn list_all(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<Vec<TenantRequestWithUser>, DomainError> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<TenantRequestWithUser> = state
            .requests
            .values()
            .filter(|r| status.map(|s| r.status == s).unwrap_or(true))
            .map(|r| {
                let user = state.users.get(&r.user_id);
                TenantRequestWithUser {
                    request: r.clone(),
                    user_full_name: user.and_then(|u| u.full_name.clone()),
                    user_email: user.map(|u| u.email.clone()),
                }
            })
            .collect();
        rows.sort_by(|a, b| b.request.created_at.cmp(&a.request.created_at));
        Ok(rows)
    }

    async fn count_by_status(&self, status: RequestStatus) -> Result<i64, DomainError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .requests
            .values()
            .filter(|r| r.status == status)
            .count() as i64)
    }

    async fn create(&self, request: &TenantRequest) -> Result<TenantRequest, DomainError> {
        let mut state = self.state.lock().unwrap();
        // One open request per user, enforced at the store the way the
        // partial unique index enforces it in Postgres.
        if state
            .requests
            .values()
            .any(|r| r.user_id == request.user_id && r.is_open())
        {
            return Err(DomainError::DuplicateRequest);
        }
        state.requests.insert(request.id, request.clone());
        Ok(request.clone())
    }

    async fn update_pending(
        &self,
        id: &Uuid,
        patch: &TenantRequestPatch,
    ) -> Result<Option<TenantRequest>, DomainError> {
        let mut state = self.state.lock().unwrap();
        match state.requests.get_mut(id) {
            Some(request) if request.status == RequestStatus::Pending => {
                request.apply_patch(patch);
                Ok(Some(request.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_pending(&self, id: &Uuid) -> Result<bool, DomainError> {
        let mut state = self.state.lock().unwrap();
        match state.requests.get(id) {
            Some(request) if request.status == RequestStatus::Pending => {
                state.requests.remove(id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn transition(
        &self,
        id: &Uuid,
        from: RequestStatus,
        to: RequestStatus,
        review_notes: Option<&str>,
    ) -> Result<Option<TenantRequest>, DomainError> {
        let mut state = self.state.lock().unwrap();
        match state.requests.get_mut(id) {
            Some(request) if request.status == from => {
                request.status = to;
                if let Some(notes) = review_notes {
                    request.review_notes = Some(notes.to_string());
                }
                request.updated_at = Utc::now();
                Ok(Some(request.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn accept(&self, id: &Uuid, accepted_role: Role) -> Result<AcceptOutcome, DomainError> {
        let mut state = self.state.lock().unwrap();
        let request = state.requests.get(id).cloned().ok_or(DomainError::NotFound)?;

        match request.status {
            RequestStatus::Accepted => {
                let profile = state
                    .profiles
                    .get(&request.user_id)
                    .cloned()
                    .ok_or(DomainError::NotFound)?;
                let tenant_id = profile.tenant_id.ok_or_else(|| {
                    DomainError::InternalError("accepted request without tenant".into())
                })?;
                let tenant = state
                    .tenants
                    .get(&tenant_id)
                    .cloned()
                    .ok_or(DomainError::NotFound)?;
                Ok(AcceptOutcome {
                    request,
                    tenant,
                    profile,
                    already_accepted: true,
                })
            }
            RequestStatus::Approved => {
                let tenant = Tenant::new(request.company_name.clone());
                state.tenants.insert(tenant.id, tenant.clone());

                let profile = state
                    .profiles
                    .get_mut(&request.user_id)
                    .ok_or(DomainError::NotFound)?;
                profile.tenant_id = Some(tenant.id);
                profile.role = accepted_role;
                profile.updated_at = Some(Utc::now());
                let profile = profile.clone();

                let stored = state.requests.get_mut(id).expect("request vanished");
                stored.status = RequestStatus::Accepted;
                stored.updated_at = Utc::now();
                let request = stored.clone();

                Ok(AcceptOutcome {
                    request,
                    tenant,
                    profile,
                    already_accepted: false,
                })
            }
            actual => Err(DomainError::InvalidStateTransition {
                expected: RequestStatus::Approved,
                actual,
            }),
        }
    }
}

#[async_trait]
impl NotificationRepository for MemStore {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Notification>, DomainError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .notifications
            .iter()
            .find(|n| n.id == *id)
            .cloned())
    }

    async fn list(&self, user_id: &Uuid, limit: u32) -> Result<Vec<Notification>, DomainError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == *user_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn list_unread(&self, user_id: &Uuid) -> Result<Vec<Notification>, DomainError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == *user_id && !n.is_read)
            .cloned()
            .collect())
    }

    async fn unread_count(&self, user_id: &Uuid) -> Result<i64, DomainError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .notifications
            .iter()
            .filter(|n| n.user_id == *user_id && !n.is_read)
            .count() as i64)
    }

    async fn insert(&self, notification: &Notification) -> Result<Notification, DomainError> {
        self.state
            .lock()
            .unwrap()
            .notifications
            .push(notification.clone());
        Ok(notification.clone())
    }

    async fn mark_read(&self, id: &Uuid) -> Result<bool, DomainError> {
        let mut state = self.state.lock().unwrap();
        match state.notifications.iter_mut().find(|n| n.id == *id) {
            Some(n) if !n.is_read => {
                n.is_read = true;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(DomainError::NotFound),
        }
    }

    async fn mark_all_read(&self, user_id: &Uuid) -> Result<i64, DomainError> {
        let mut state = self.state.lock().unwrap();
        let mut affected = 0;
        for n in state
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == *user_id && !n.is_read)
        {
            n.is_read = true;
            affected += 1;
        }
        Ok(affected)
    }
}
