//! Integration tests for the tenant-request workflow.

mod support;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use opsflow_core::domain::{
    CreateTenantRequest, RequestStatus, Role, TenantRequest, TenantRequestPatch,
    TenantRequestWithUser,
};
use opsflow_core::error::DomainError;
use opsflow_core::repositories::{AcceptOutcome, TenantRequestRepository};
use opsflow_core::services::{NotificationService, TenantRequestWorkflow, WorkflowSettings};

use support::{seed_admin, seed_guest, MemStore};

type Workflow = TenantRequestWorkflow<MemStore, MemStore, MemStore>;

fn workflow(store: &Arc<MemStore>) -> Workflow {
    let notifications = Arc::new(NotificationService::new(Arc::clone(store)));
    TenantRequestWorkflow::new(
        Arc::clone(store),
        Arc::clone(store),
        notifications,
        WorkflowSettings::default(),
    )
}

fn request_data(name: &str) -> CreateTenantRequest {
    CreateTenantRequest {
        company_name: name.into(),
        company_address: Some("1 Main St".into()),
        company_phone: None,
        company_email: None,
        business_type: Some("wholesale".into()),
        description: None,
    }
}

#[tokio::test]
async fn test_create_yields_pending_request() {
    let store = MemStore::new();
    let user = seed_guest(&store, "alice@example.com", "Alice");
    let workflow = workflow(&store);

    let request = workflow.create(user, request_data("Acme Corp")).await.unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.company_name, "Acme Corp");
}

#[tokio::test]
async fn test_second_open_request_is_rejected() {
    let store = MemStore::new();
    let user = seed_guest(&store, "alice@example.com", "Alice");
    let admin = seed_admin(&store);
    let workflow = workflow(&store);

    let first = workflow.create(user, request_data("Acme Corp")).await.unwrap();
    assert!(matches!(
        workflow.create(user, request_data("Other Co")).await,
        Err(DomainError::DuplicateRequest)
    ));

    // Still blocked while the first request is approved-but-unaccepted.
    workflow.approve(&first.id, &admin, None).await.unwrap();
    assert!(matches!(
        workflow.create(user, request_data("Other Co")).await,
        Err(DomainError::DuplicateRequest)
    ));
}

#[tokio::test]
async fn test_full_lifecycle_create_approve_accept() {
    let store = MemStore::new();
    let user = seed_guest(&store, "alice@example.com", "Alice");
    let admin = seed_admin(&store);
    let workflow = workflow(&store);

    let request = workflow.create(user, request_data("Acme Corp")).await.unwrap();

    let approved = workflow
        .approve(&request.id, &admin, Some("looks good"))
        .await
        .unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);
    assert_eq!(approved.review_notes.as_deref(), Some("looks good"));

    // The requester was notified of the approval.
    let notifications = NotificationService::new(Arc::clone(&store));
    let unread = notifications.list_unread(&user).await.unwrap();
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0].kind.as_str(), "request_approved");

    let outcome = workflow.accept(&request.id, &user).await.unwrap();
    assert!(!outcome.already_accepted);
    assert_eq!(outcome.tenant.name, "Acme Corp");
    assert_eq!(outcome.request.status, RequestStatus::Accepted);

    let profile = store.profile(&user).unwrap();
    assert_eq!(profile.tenant_id, Some(outcome.tenant.id));
    assert_eq!(profile.role, Role::Staff);
    assert_ne!(profile.role, Role::Guest);
}

#[tokio::test]
async fn test_accept_is_idempotent() {
    let store = MemStore::new();
    let user = seed_guest(&store, "alice@example.com", "Alice");
    let admin = seed_admin(&store);
    let workflow = workflow(&store);

    let request = workflow.create(user, request_data("Acme Corp")).await.unwrap();
    workflow.approve(&request.id, &admin, None).await.unwrap();

    let first = workflow.accept(&request.id, &user).await.unwrap();
    let second = workflow.accept(&request.id, &user).await.unwrap();

    assert!(second.already_accepted);
    assert_eq!(first.tenant.id, second.tenant.id);
    assert_eq!(store.tenant_count(), 1);
}

#[tokio::test]
async fn test_reject_is_terminal() {
    let store = MemStore::new();
    let user = seed_guest(&store, "alice@example.com", "Alice");
    let admin = seed_admin(&store);
    let workflow = workflow(&store);

    let request = workflow.create(user, request_data("Acme Corp")).await.unwrap();
    workflow
        .reject(&request.id, &admin, Some("incomplete"))
        .await
        .unwrap();

    assert!(matches!(
        workflow.approve(&request.id, &admin, None).await,
        Err(DomainError::InvalidStateTransition { .. })
    ));
    assert!(matches!(
        workflow.accept(&request.id, &user).await,
        Err(DomainError::InvalidStateTransition { .. })
    ));

    // A terminal request no longer blocks a fresh one.
    let next = workflow.create(user, request_data("Acme Corp")).await.unwrap();
    assert_eq!(next.status, RequestStatus::Pending);
}

#[tokio::test]
async fn test_concurrent_approvals_one_wins() {
    let store = MemStore::new();
    let user = seed_guest(&store, "alice@example.com", "Alice");
    let admin = seed_admin(&store);
    let workflow = Arc::new(workflow(&store));

    let request = workflow.create(user, request_data("Acme Corp")).await.unwrap();

    let (a, b) = tokio::join!(
        workflow.approve(&request.id, &admin, Some("first")),
        workflow.approve(&request.id, &admin, Some("second")),
    );

    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    let failure = if a.is_err() { a } else { b };
    assert!(matches!(
        failure,
        Err(DomainError::InvalidStateTransition {
            expected: RequestStatus::Pending,
            actual: RequestStatus::Approved,
        })
    ));

    let stored = workflow.find_open(&user).await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::Approved);
}

/// Request store that yields to the scheduler after the open-request lookup,
/// forcing the interleaving where two concurrent creates both pass the
/// service-level duplicate check and race into the store.
struct YieldingRequests {
    inner: Arc<MemStore>,
}

#[async_trait]
impl TenantRequestRepository for YieldingRequests {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<TenantRequest>, DomainError> {
        TenantRequestRepository::find_by_id(self.inner.as_ref(), id).await
    }

    async fn find_open_by_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Option<TenantRequest>, DomainError> {
        let found = self.inner.find_open_by_user(user_id).await?;
        tokio::task::yield_now().await;
        Ok(found)
    }

    async fn list_by_user(&self, user_id: &Uuid) -> Result<Vec<TenantRequest>, DomainError> {
        self.inner.list_by_user(user_id).await
    }

    async fn list_all(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<Vec<TenantRequestWithUser>, DomainError> {
        self.inner.list_all(status).await
    }

    async fn count_by_status(&self, status: RequestStatus) -> Result<i64, DomainError> {
        self.inner.count_by_status(status).await
    }

    async fn create(&self, request: &TenantRequest) -> Result<TenantRequest, DomainError> {
        TenantRequestRepository::create(self.inner.as_ref(), request).await
    }

    async fn update_pending(
        &self,
        id: &Uuid,
        patch: &TenantRequestPatch,
    ) -> Result<Option<TenantRequest>, DomainError> {
        self.inner.update_pending(id, patch).await
    }

    async fn delete_pending(&self, id: &Uuid) -> Result<bool, DomainError> {
        self.inner.delete_pending(id).await
    }

    async fn transition(
        &self,
        id: &Uuid,
        from: RequestStatus,
        to: RequestStatus,
        review_notes: Option<&str>,
    ) -> Result<Option<TenantRequest>, DomainError> {
        self.inner.transition(id, from, to, review_notes).await
    }

    async fn accept(&self, id: &Uuid, accepted_role: Role) -> Result<AcceptOutcome, DomainError> {
        self.inner.accept(id, accepted_role).await
    }
}

#[tokio::test]
async fn test_concurrent_creates_one_wins() {
    let store = MemStore::new();
    let user = seed_guest(&store, "alice@example.com", "Alice");
    let requests = Arc::new(YieldingRequests {
        inner: Arc::clone(&store),
    });
    let notifications = Arc::new(NotificationService::new(Arc::clone(&store)));
    let workflow = TenantRequestWorkflow::new(
        requests,
        Arc::clone(&store),
        notifications,
        WorkflowSettings::default(),
    );

    let (a, b) = tokio::join!(
        workflow.create(user, request_data("Acme Corp")),
        workflow.create(user, request_data("Other Co")),
    );

    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    let failure = if a.is_err() { a } else { b };
    assert!(matches!(failure, Err(DomainError::DuplicateRequest)));
    assert_eq!(workflow.list_mine(&user).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_and_cancel_only_while_pending() {
    let store = MemStore::new();
    let user = seed_guest(&store, "alice@example.com", "Alice");
    let admin = seed_admin(&store);
    let workflow = workflow(&store);

    let request = workflow.create(user, request_data("Acme Corp")).await.unwrap();

    let patch = TenantRequestPatch {
        company_name: Some("Acme Corporation".into()),
        ..Default::default()
    };
    let updated = workflow.update(&request.id, &user, patch.clone()).await.unwrap();
    assert_eq!(updated.company_name, "Acme Corporation");

    workflow.approve(&request.id, &admin, None).await.unwrap();

    assert!(matches!(
        workflow.update(&request.id, &user, patch).await,
        Err(DomainError::InvalidStateTransition { .. })
    ));
    assert!(matches!(
        workflow.cancel(&request.id, &user).await,
        Err(DomainError::InvalidStateTransition { .. })
    ));
}

#[tokio::test]
async fn test_update_validates_patched_fields() {
    let store = MemStore::new();
    let user = seed_guest(&store, "alice@example.com", "Alice");
    let workflow = workflow(&store);

    let request = workflow.create(user, request_data("Acme Corp")).await.unwrap();

    let patch = TenantRequestPatch {
        company_email: Some("not-an-email".into()),
        ..Default::default()
    };
    assert!(matches!(
        workflow.update(&request.id, &user, patch).await,
        Err(DomainError::ValidationError(_))
    ));

    // The rejected patch left the request untouched.
    let stored = workflow.find_open(&user).await.unwrap().unwrap();
    assert!(stored.company_email.is_none());
}

#[tokio::test]
async fn test_cancel_deletes_pending_request() {
    let store = MemStore::new();
    let user = seed_guest(&store, "alice@example.com", "Alice");
    let workflow = workflow(&store);

    let request = workflow.create(user, request_data("Acme Corp")).await.unwrap();
    workflow.cancel(&request.id, &user).await.unwrap();

    assert!(workflow.find_open(&user).await.unwrap().is_none());
    assert!(workflow.list_mine(&user).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_only_owner_may_act() {
    let store = MemStore::new();
    let user = seed_guest(&store, "alice@example.com", "Alice");
    let other = seed_guest(&store, "bob@example.com", "Bob");
    let admin = seed_admin(&store);
    let workflow = workflow(&store);

    let request = workflow.create(user, request_data("Acme Corp")).await.unwrap();

    assert!(matches!(
        workflow.cancel(&request.id, &other).await,
        Err(DomainError::Unauthorized)
    ));

    workflow.approve(&request.id, &admin, None).await.unwrap();
    assert!(matches!(
        workflow.accept(&request.id, &other).await,
        Err(DomainError::Unauthorized)
    ));
}

#[tokio::test]
async fn test_admin_operations_require_admin() {
    let store = MemStore::new();
    let user = seed_guest(&store, "alice@example.com", "Alice");
    let workflow = workflow(&store);

    let request = workflow.create(user, request_data("Acme Corp")).await.unwrap();

    assert!(matches!(
        workflow.approve(&request.id, &user, None).await,
        Err(DomainError::Unauthorized)
    ));
    assert!(matches!(
        workflow.list_all(&user, None).await,
        Err(DomainError::Unauthorized)
    ));
    assert!(matches!(
        workflow.pending_count(&user).await,
        Err(DomainError::Unauthorized)
    ));
}

#[tokio::test]
async fn test_admin_list_is_enriched_and_filterable() {
    let store = MemStore::new();
    let user = seed_guest(&store, "alice@example.com", "Alice");
    let admin = seed_admin(&store);
    let workflow = workflow(&store);

    let request = workflow.create(user, request_data("Acme Corp")).await.unwrap();

    let rows = workflow.list_all(&admin, None).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_email.as_deref(), Some("alice@example.com"));
    assert_eq!(rows[0].user_full_name.as_deref(), Some("Alice"));

    assert_eq!(workflow.pending_count(&admin).await.unwrap(), 1);

    workflow.reject(&request.id, &admin, None).await.unwrap();
    let pending = workflow
        .list_all(&admin, Some(RequestStatus::Pending))
        .await
        .unwrap();
    assert!(pending.is_empty());
    assert_eq!(workflow.pending_count(&admin).await.unwrap(), 0);
}

#[tokio::test]
async fn test_unknown_request_is_not_found() {
    let store = MemStore::new();
    let user = seed_guest(&store, "alice@example.com", "Alice");
    let workflow = workflow(&store);

    assert!(matches!(
        workflow.accept(&Uuid::new_v4(), &user).await,
        Err(DomainError::NotFound)
    ));
}
