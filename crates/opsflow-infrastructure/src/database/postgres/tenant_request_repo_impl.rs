// ============================================================================
// Opsflow Infrastructure - PostgreSQL Tenant Request Repository
// File: crates/opsflow-infrastructure/src/database/postgres/tenant_request_repo_impl.rs
// ============================================================================
//! Status transitions are conditional UPDATEs keyed on the expected
//! pre-state, so two concurrent reviewers cannot both advance the same
//! request. The accept transition runs in one transaction with the request
//! row locked `FOR UPDATE`; a retry on an already-accepted request resolves
//! the existing tenant through the requester's profile instead of creating
//! a second one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::{error, info, warn};
use uuid::Uuid;

use opsflow_core::domain::{
    Profile, RequestStatus, Role, Tenant, TenantRequest, TenantRequestPatch, TenantRequestWithUser,
};
use opsflow_core::error::DomainError;
use opsflow_core::repositories::{AcceptOutcome, TenantRequestRepository};

pub struct PgTenantRequestRepository {
    pool: PgPool,
}

impl PgTenantRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const REQUEST_COLUMNS: &str = r#"
    id, user_id, company_name, company_address, company_phone,
    company_email, business_type, description, status, review_notes,
    created_at, updated_at
"#;

// Internal row type for SQLx mapping
#[derive(Debug, FromRow)]
struct TenantRequestRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_name: String,
    pub company_address: Option<String>,
    pub company_phone: Option<String>,
    pub company_email: Option<String>,
    pub business_type: Option<String>,
    pub description: Option<String>,
    pub status: String,
    pub review_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TenantRequestRow> for TenantRequest {
    fn from(row: TenantRequestRow) -> Self {
        TenantRequest {
            id: row.id,
            user_id: row.user_id,
            company_name: row.company_name,
            company_address: row.company_address,
            company_phone: row.company_phone,
            company_email: row.company_email,
            business_type: row.business_type,
            description: row.description,
            status: RequestStatus::from_str(&row.status).unwrap_or(RequestStatus::Pending),
            review_notes: row.review_notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// Admin-list row joined with requester identity.
#[derive(Debug, FromRow)]
struct TenantRequestUserRow {
    #[sqlx(flatten)]
    request: TenantRequestRow,
    pub user_full_name: Option<String>,
    pub user_email: Option<String>,
}

impl From<TenantRequestUserRow> for TenantRequestWithUser {
    fn from(row: TenantRequestUserRow) -> Self {
        TenantRequestWithUser {
            request: row.request.into(),
            user_full_name: row.user_full_name,
            user_email: row.user_email,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    pub id: Uuid,
    pub role: String,
    pub tenant_id: Option<Uuid>,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            id: row.id,
            role: Role::from_str(&row.role).unwrap_or_default(),
            tenant_id: row.tenant_id,
            full_name: row.full_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct TenantRow {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<TenantRow> for Tenant {
    fn from(row: TenantRow) -> Self {
        Tenant {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

fn db_err(context: &str) -> impl FnOnce(sqlx::Error) -> DomainError + '_ {
    move |e| {
        error!("Database error {}: {}", context, e);
        DomainError::DatabaseError(e.to_string())
    }
}

impl PgTenantRequestRepository {
    async fn fetch_request_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: &Uuid,
    ) -> Result<Option<TenantRequestRow>, DomainError> {
        sqlx::query_as(&format!(
            "SELECT {REQUEST_COLUMNS} FROM tenant_requests WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_err("locking tenant request"))
    }

    async fn fetch_profile(
        tx: &mut Transaction<'_, Postgres>,
        user_id: &Uuid,
    ) -> Result<Profile, DomainError> {
        let row: Option<ProfileRow> = sqlx::query_as(
            r#"
            SELECT id, role, tenant_id, full_name, created_at, updated_at
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_err("loading requester profile"))?;

        row.map(|r| r.into()).ok_or(DomainError::NotFound)
    }
}

#[async_trait]
impl TenantRequestRepository for PgTenantRequestRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<TenantRequest>, DomainError> {
        let row: Option<TenantRequestRow> = sqlx::query_as(&format!(
            "SELECT {REQUEST_COLUMNS} FROM tenant_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("finding tenant request by id"))?;

        Ok(row.map(|r| r.into()))
    }

    async fn find_open_by_user(&self, user_id: &Uuid) -> Result<Option<TenantRequest>, DomainError> {
        let row: Option<TenantRequestRow> = sqlx::query_as(&format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM tenant_requests
            WHERE user_id = $1 AND status IN ('pending', 'approved')
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("finding open tenant request"))?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_by_user(&self, user_id: &Uuid) -> Result<Vec<TenantRequest>, DomainError> {
        let rows: Vec<TenantRequestRow> = sqlx::query_as(&format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM tenant_requests
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("listing tenant requests by user"))?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn list_all(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<Vec<TenantRequestWithUser>, DomainError> {
        let status_filter = status.map(|s| s.as_str());

        let enriched: Result<Vec<TenantRequestUserRow>, sqlx::Error> = sqlx::query_as(
            r#"
            SELECT
                r.id, r.user_id, r.company_name, r.company_address, r.company_phone,
                r.company_email, r.business_type, r.description, r.status, r.review_notes,
                r.created_at, r.updated_at,
                u.full_name AS user_full_name,
                u.email AS user_email
            FROM tenant_requests r
            LEFT JOIN users u ON u.id = r.user_id
            WHERE $1::text IS NULL OR r.status = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(status_filter)
        .fetch_all(&self.pool)
        .await;

        match enriched {
            Ok(rows) => Ok(rows.into_iter().map(|r| r.into()).collect()),
            Err(e) => {
                // Degrade to bare rows rather than failing the admin list.
                warn!("Enriched tenant request list failed, falling back: {}", e);
                let rows: Vec<TenantRequestRow> = sqlx::query_as(&format!(
                    r#"
                    SELECT {REQUEST_COLUMNS}
                    FROM tenant_requests
                    WHERE $1::text IS NULL OR status = $1
                    ORDER BY created_at DESC
                    "#
                ))
                .bind(status_filter)
                .fetch_all(&self.pool)
                .await
                .map_err(db_err("listing tenant requests"))?;

                Ok(rows
                    .into_iter()
                    .map(|r| TenantRequestWithUser {
                        request: r.into(),
                        user_full_name: None,
                        user_email: None,
                    })
                    .collect())
            }
        }
    }

    async fn count_by_status(&self, status: RequestStatus) -> Result<i64, DomainError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM tenant_requests WHERE status = $1")
                .bind(status.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(db_err("counting tenant requests"))?;

        Ok(count)
    }

    async fn create(&self, request: &TenantRequest) -> Result<TenantRequest, DomainError> {
        let row: TenantRequestRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO tenant_requests (
                id, user_id, company_name, company_address, company_phone,
                company_email, business_type, description, status, review_notes,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(request.id)
        .bind(request.user_id)
        .bind(&request.company_name)
        .bind(&request.company_address)
        .bind(&request.company_phone)
        .bind(&request.company_email)
        .bind(&request.business_type)
        .bind(&request.description)
        .bind(request.status.as_str())
        .bind(&request.review_notes)
        .bind(request.created_at)
        .bind(request.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating tenant request: {}", e);
            let msg = e.to_string();
            // The partial unique index on (user_id) over open statuses
            // catches creates that raced past the service-level check.
            if msg.contains("unique") || msg.contains("duplicate") {
                DomainError::DuplicateRequest
            } else {
                DomainError::DatabaseError(msg)
            }
        })?;

        info!("Tenant request created: {}", row.id);
        Ok(row.into())
    }

    async fn update_pending(
        &self,
        id: &Uuid,
        patch: &TenantRequestPatch,
    ) -> Result<Option<TenantRequest>, DomainError> {
        let row: Option<TenantRequestRow> = sqlx::query_as(&format!(
            r#"
            UPDATE tenant_requests
            SET
                company_name = COALESCE($2, company_name),
                company_address = COALESCE($3, company_address),
                company_phone = COALESCE($4, company_phone),
                company_email = COALESCE($5, company_email),
                business_type = COALESCE($6, business_type),
                description = COALESCE($7, description),
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&patch.company_name)
        .bind(&patch.company_address)
        .bind(&patch.company_phone)
        .bind(&patch.company_email)
        .bind(&patch.business_type)
        .bind(&patch.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("updating tenant request"))?;

        Ok(row.map(|r| r.into()))
    }

    async fn delete_pending(&self, id: &Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM tenant_requests WHERE id = $1 AND status = 'pending'")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err("deleting tenant request"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn transition(
        &self,
        id: &Uuid,
        from: RequestStatus,
        to: RequestStatus,
        review_notes: Option<&str>,
    ) -> Result<Option<TenantRequest>, DomainError> {
        // Conditional on the expected pre-state; a concurrent writer that
        // advanced the row first makes this a no-op.
        let row: Option<TenantRequestRow> = sqlx::query_as(&format!(
            r#"
            UPDATE tenant_requests
            SET status = $3, review_notes = COALESCE($4, review_notes), updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(review_notes)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("transitioning tenant request"))?;

        if let Some(ref r) = row {
            info!("Tenant request {} moved {} -> {}", r.id, from, to);
        }
        Ok(row.map(|r| r.into()))
    }

    async fn accept(&self, id: &Uuid, accepted_role: Role) -> Result<AcceptOutcome, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("starting accept transaction"))?;

        let request = Self::fetch_request_for_update(&mut tx, id)
            .await?
            .ok_or(DomainError::NotFound)?;
        let status = RequestStatus::from_str(&request.status).unwrap_or(RequestStatus::Pending);

        match status {
            RequestStatus::Accepted => {
                // Retry of a completed accept. The earlier transaction wrote
                // the tenant id onto the requester's profile; resolve the
                // existing tenant through it.
                let profile = Self::fetch_profile(&mut tx, &request.user_id).await?;
                let tenant_id = profile.tenant_id.ok_or_else(|| {
                    DomainError::InternalError(
                        "accepted request has no tenant on the requester profile".into(),
                    )
                })?;
                let tenant: TenantRow =
                    sqlx::query_as("SELECT id, name, created_at FROM tenants WHERE id = $1")
                        .bind(tenant_id)
                        .fetch_one(&mut *tx)
                        .await
                        .map_err(db_err("loading accepted tenant"))?;
                tx.commit().await.map_err(db_err("committing accept"))?;

                Ok(AcceptOutcome {
                    request: request.into(),
                    tenant: tenant.into(),
                    profile,
                    already_accepted: true,
                })
            }
            RequestStatus::Approved => {
                let tenant = Tenant::new(request.company_name.clone());
                let tenant_row: TenantRow = sqlx::query_as(
                    r#"
                    INSERT INTO tenants (id, name, created_at)
                    VALUES ($1, $2, $3)
                    RETURNING id, name, created_at
                    "#,
                )
                .bind(tenant.id)
                .bind(&tenant.name)
                .bind(tenant.created_at)
                .fetch_one(&mut *tx)
                .await
                .map_err(db_err("creating tenant"))?;

                let profile_row: Option<ProfileRow> = sqlx::query_as(
                    r#"
                    UPDATE profiles
                    SET tenant_id = $2, role = $3, updated_at = NOW()
                    WHERE id = $1
                    RETURNING id, role, tenant_id, full_name, created_at, updated_at
                    "#,
                )
                .bind(request.user_id)
                .bind(tenant.id)
                .bind(accepted_role.as_str())
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_err("attaching tenant to profile"))?;
                let profile: Profile = profile_row.ok_or(DomainError::NotFound)?.into();

                let accepted: TenantRequestRow = sqlx::query_as(&format!(
                    r#"
                    UPDATE tenant_requests
                    SET status = 'accepted', updated_at = NOW()
                    WHERE id = $1
                    RETURNING {REQUEST_COLUMNS}
                    "#
                ))
                .bind(id)
                .fetch_one(&mut *tx)
                .await
                .map_err(db_err("marking request accepted"))?;

                tx.commit().await.map_err(db_err("committing accept"))?;
                info!(
                    "Tenant request {} accepted, tenant {} provisioned",
                    id, tenant_row.id
                );

                Ok(AcceptOutcome {
                    request: accepted.into(),
                    tenant: tenant_row.into(),
                    profile,
                    already_accepted: false,
                })
            }
            other => Err(DomainError::InvalidStateTransition {
                expected: RequestStatus::Approved,
                actual: other,
            }),
        }
    }
}
