//! Profile domain entity
//!
//! The internally-owned record extending a bare authentication identity with
//! role and tenant membership. Exactly one per user, created alongside
//! registration. `tenant_id` and the role elevation away from `guest` are
//! written only by the tenant-request accept transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::tenant::Tenant;

/// Application role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guest,
    Staff,
    Admin,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::Staff => "staff",
            Role::Admin => "admin",
            Role::Customer => "customer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "guest" => Some(Role::Guest),
            "staff" => Some(Role::Staff),
            "admin" => Some(Role::Admin),
            "customer" => Some(Role::Customer),
            _ => None,
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Guest
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Equals the auth user id.
    pub id: Uuid,
    pub role: Role,
    pub tenant_id: Option<Uuid>,
    pub full_name: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn new_guest(user_id: Uuid, full_name: Option<String>) -> Self {
        Self {
            id: user_id,
            role: Role::Guest,
            tenant_id: None,
            full_name,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn is_guest(&self) -> bool {
        self.role == Role::Guest
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_staff(&self) -> bool {
        self.role == Role::Staff
    }

    pub fn has_tenant(&self) -> bool {
        self.tenant_id.is_some()
    }
}

/// Profile joined with its tenant metadata, as the resolver returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileWithTenant {
    pub profile: Profile,
    pub tenant: Option<Tenant>,
}
