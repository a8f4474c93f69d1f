// ============================================================================
// Opsflow Core - Tenant Request Entity
// File: crates/opsflow-core/src/domain/tenant_request.rs
// Description: Company-registration request and its status state machine
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request status. Transitions are monotonic and one-directional:
/// `pending -> approved | rejected`, `approved -> accepted`.
/// `rejected` and `accepted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Accepted,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Accepted => "accepted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RequestStatus::Pending),
            "approved" => Some(RequestStatus::Approved),
            "rejected" => Some(RequestStatus::Rejected),
            "accepted" => Some(RequestStatus::Accepted),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Rejected | RequestStatus::Accepted)
    }

    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (RequestStatus::Pending, RequestStatus::Approved)
                | (RequestStatus::Pending, RequestStatus::Rejected)
                | (RequestStatus::Approved, RequestStatus::Accepted)
        )
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Company-registration request awaiting administrative review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantRequest {
    pub id: Uuid,
    pub user_id: Uuid,

    pub company_name: String,
    pub company_address: Option<String>,
    pub company_phone: Option<String>,
    pub company_email: Option<String>,
    pub business_type: Option<String>,
    pub description: Option<String>,

    pub status: RequestStatus,
    pub review_notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Company fields supplied when creating a request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTenantRequest {
    #[validate(length(min = 1, max = 200, message = "Company name is required"))]
    pub company_name: String,
    pub company_address: Option<String>,
    pub company_phone: Option<String>,
    #[validate(email)]
    pub company_email: Option<String>,
    pub business_type: Option<String>,
    pub description: Option<String>,
}

/// Partial update of the company fields, permitted only while pending.
/// Supplied fields are held to the same rules as on creation.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TenantRequestPatch {
    #[validate(length(min = 1, max = 200, message = "Company name is required"))]
    pub company_name: Option<String>,
    pub company_address: Option<String>,
    pub company_phone: Option<String>,
    #[validate(email)]
    pub company_email: Option<String>,
    pub business_type: Option<String>,
    pub description: Option<String>,
}

/// Admin-list row enriched with requester identity. Enrichment is a
/// convenience join; both fields stay `None` when it is unavailable.
#[derive(Debug, Clone, Serialize)]
pub struct TenantRequestWithUser {
    #[serde(flatten)]
    pub request: TenantRequest,
    pub user_full_name: Option<String>,
    pub user_email: Option<String>,
}

impl TenantRequest {
    pub fn new(user_id: Uuid, data: CreateTenantRequest) -> Result<Self, validator::ValidationErrors> {
        data.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            company_name: data.company_name,
            company_address: data.company_address,
            company_phone: data.company_phone,
            company_email: data.company_email,
            business_type: data.business_type,
            description: data.description,
            status: RequestStatus::Pending,
            review_notes: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn apply_patch(&mut self, patch: &TenantRequestPatch) {
        if let Some(name) = &patch.company_name {
            self.company_name = name.clone();
        }
        if patch.company_address.is_some() {
            self.company_address = patch.company_address.clone();
        }
        if patch.company_phone.is_some() {
            self.company_phone = patch.company_phone.clone();
        }
        if patch.company_email.is_some() {
            self.company_email = patch.company_email.clone();
        }
        if patch.business_type.is_some() {
            self.business_type = patch.business_type.clone();
        }
        if patch.description.is_some() {
            self.description = patch.description.clone();
        }
        self.updated_at = Utc::now();
    }
}
