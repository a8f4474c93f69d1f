//! Domain errors

use thiserror::Error;

use crate::domain::RequestStatus;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("User already has an open tenant request")]
    DuplicateRequest,

    #[error("Invalid state transition: request is {actual}, expected {expected}")]
    InvalidStateTransition {
        expected: RequestStatus,
        actual: RequestStatus,
    },

    #[error("Not found")]
    NotFound,

    #[error("Not authorized to perform this action")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not active")]
    UserNotActive,

    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    #[error("Password hash error: {0}")]
    PasswordHashError(String),

    #[error("Token generation error: {0}")]
    TokenGenerationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}
