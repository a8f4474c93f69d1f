//! Authentication error taxonomy
//!
//! These are surfaced to the user verbatim and never retried automatically.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account not verified")]
    AccountNotVerified,

    #[error("Account is locked or inactive")]
    AccountNotActive,

    #[error("Email already registered: {0}")]
    EmailAlreadyRegistered(String),

    #[error("Too many attempts, try again later")]
    RateLimited,

    #[error("Password does not meet requirements: {0}")]
    WeakPassword(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Auth provider unreachable: {0}")]
    ProviderUnreachable(String),

    #[error("Internal auth error: {0}")]
    Internal(String),
}
