// ============================================================================
// Opsflow Core - Authorization Gate
// File: crates/opsflow-core/src/gate.rs
// Description: Pure routing decision over composite auth state
// ============================================================================
//! Maps `(session, profile, loading flags)` to a routing decision.
//!
//! The gate is a pure function: it never fetches, never caches, and fails
//! closed. Any state it cannot classify resolves to `Unauthenticated`,
//! never to `Authorized`.

use serde::Serialize;

use crate::domain::Profile;

/// What a route demands of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteRequirement {
    /// Login, register.
    Public,
    /// Onboarding: admits only authenticated guests without a tenant.
    GuestOnly,
    /// The tenant-gated area (dashboard and resource pages).
    Tenant,
    /// Admin review pages, nested inside the tenant-gated area.
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteDecision {
    Loading,
    Unauthenticated,
    NeedsOnboarding,
    Forbidden,
    Authorized,
}

/// Composite auth state as seen at decision time.
#[derive(Debug, Clone, Copy)]
pub struct GateInput<'a> {
    pub session_loading: bool,
    pub session_present: bool,
    pub profile_loading: bool,
    /// Whether a profile resolution for the current session has completed
    /// (even if it found no row).
    pub profile_attempted: bool,
    pub profile: Option<&'a Profile>,
}

impl<'a> GateInput<'a> {
    /// Derived booleans read false until the profile is non-null; never a
    /// permissive guess.
    pub fn is_guest(&self) -> bool {
        self.profile.map(Profile::is_guest).unwrap_or(false)
    }

    pub fn is_admin(&self) -> bool {
        self.profile.map(Profile::is_admin).unwrap_or(false)
    }

    pub fn is_staff(&self) -> bool {
        self.profile.map(Profile::is_staff).unwrap_or(false)
    }

    pub fn has_tenant(&self) -> bool {
        self.profile.map(Profile::has_tenant).unwrap_or(false)
    }
}

/// Evaluate the decision table, in order.
pub fn decide(input: &GateInput<'_>, requirement: RouteRequirement) -> RouteDecision {
    if requirement == RouteRequirement::Public {
        return RouteDecision::Authorized;
    }

    if input.session_loading {
        return RouteDecision::Loading;
    }

    if !input.session_present {
        return RouteDecision::Unauthenticated;
    }

    if input.profile.is_none() {
        if input.profile_loading || !input.profile_attempted {
            return RouteDecision::Loading;
        }
        // Session exists but resolution finished with no profile. The gate
        // cannot classify this caller; fail closed.
        return RouteDecision::Unauthenticated;
    }

    match requirement {
        RouteRequirement::Public => RouteDecision::Authorized,
        RouteRequirement::GuestOnly => {
            if input.is_guest() && !input.has_tenant() {
                RouteDecision::Authorized
            } else {
                // A guest who already has a tenant, or a non-guest, is
                // redirected away from onboarding.
                RouteDecision::Forbidden
            }
        }
        RouteRequirement::Tenant => {
            if input.is_guest() && !input.has_tenant() {
                RouteDecision::NeedsOnboarding
            } else {
                RouteDecision::Authorized
            }
        }
        RouteRequirement::Admin => {
            if input.is_guest() && !input.has_tenant() {
                RouteDecision::NeedsOnboarding
            } else if !input.is_admin() {
                RouteDecision::Forbidden
            } else {
                RouteDecision::Authorized
            }
        }
    }
}
