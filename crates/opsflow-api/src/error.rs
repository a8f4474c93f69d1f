//! Domain-to-HTTP error mapping.

use axum::http::StatusCode;
use axum::Json;

use opsflow_core::error::DomainError;

use crate::response::ApiResponse;

pub type ErrorResponse = (StatusCode, Json<ApiResponse<()>>);

/// Map a domain error onto a status code and the error envelope.
pub fn domain_error(e: DomainError) -> ErrorResponse {
    let (status, code) = match &e {
        DomainError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        DomainError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
        DomainError::UserNotActive => (StatusCode::FORBIDDEN, "ACCOUNT_NOT_ACTIVE"),
        DomainError::Unauthorized => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        DomainError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        DomainError::DuplicateRequest => (StatusCode::CONFLICT, "DUPLICATE_REQUEST"),
        DomainError::InvalidStateTransition { .. } => (StatusCode::CONFLICT, "INVALID_STATE"),
        DomainError::EmailAlreadyExists(_) => (StatusCode::CONFLICT, "EMAIL_EXISTS"),
        DomainError::PasswordHashError(_)
        | DomainError::TokenGenerationError(_)
        | DomainError::DatabaseError(_)
        | DomainError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    };
    let message = match status {
        // Internal details stay in the logs.
        StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
        _ => e.to_string(),
    };
    (status, Json(ApiResponse::error(code, &message)))
}

pub fn unauthenticated() -> ErrorResponse {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiResponse::error("UNAUTHENTICATED", "Authentication required")),
    )
}

pub fn validation(message: &str) -> ErrorResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::error("VALIDATION_ERROR", message)),
    )
}
