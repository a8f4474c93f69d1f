// ============================================================================
// Opsflow Infrastructure - PostgreSQL Profile Repository
// File: crates/opsflow-infrastructure/src/database/postgres/profile_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::error;
use uuid::Uuid;

use opsflow_core::domain::{Profile, ProfileWithTenant, Role, Tenant};
use opsflow_core::error::DomainError;
use opsflow_core::repositories::ProfileRepository;

pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal row type for SQLx mapping
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

// Profile joined with its tenant, in one round trip.
#[derive(Debug, FromRow)]
struct ProfileTenantRow {
    pub id: Uuid,
    pub role: String,
    pub tenant_id: Option<Uuid>,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub tenant_name: Option<String>,
    pub tenant_created_at: Option<DateTime<Utc>>,
}

impl From<ProfileTenantRow> for ProfileWithTenant {
    fn from(row: ProfileTenantRow) -> Self {
        let tenant = match (row.tenant_id, row.tenant_name, row.tenant_created_at) {
            (Some(id), Some(name), Some(created_at)) => Some(Tenant {
                id,
                name,
                created_at,
            }),
            _ => None,
        };
        ProfileWithTenant {
            profile: Profile {
                id: row.id,
                role: Role::from_str(&row.role).unwrap_or_default(),
                tenant_id: row.tenant_id,
                full_name: row.full_name,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            tenant,
        }
    }
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Profile>, DomainError> {
        let row: Option<ProfileRow> = sqlx::query_as(
            r#"
            SELECT id, role, tenant_id, full_name, created_at, updated_at
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding profile by id: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| r.into()))
    }

    async fn find_with_tenant(&self, id: &Uuid) -> Result<Option<ProfileWithTenant>, DomainError> {
        let row: Option<ProfileTenantRow> = sqlx::query_as(
            r#"
            SELECT
                p.id, p.role, p.tenant_id, p.full_name, p.created_at, p.updated_at,
                t.name AS tenant_name, t.created_at AS tenant_created_at
            FROM profiles p
            LEFT JOIN tenants t ON t.id = p.tenant_id
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding profile with tenant: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| r.into()))
    }

    async fn create(&self, profile: &Profile) -> Result<Profile, DomainError> {
        let row: ProfileRow = sqlx::query_as(
            r#"
            INSERT INTO profiles (id, role, tenant_id, full_name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, role, tenant_id, full_name, created_at, updated_at
            "#,
        )
        .bind(profile.id)
        .bind(profile.role.as_str())
        .bind(profile.tenant_id)
        .bind(&profile.full_name)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating profile: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.into())
    }

    async fn update_full_name(&self, id: &Uuid, full_name: &str) -> Result<Profile, DomainError> {
        let row: Option<ProfileRow> = sqlx::query_as(
            r#"
            UPDATE profiles
            SET full_name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, role, tenant_id, full_name, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(full_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating profile name: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        row.map(|r| r.into()).ok_or(DomainError::NotFound)
    }
}
