// ============================================================================
// Opsflow Core - Authentication Service
// File: crates/opsflow-core/src/services/auth_service.rs
// ============================================================================
//! Authentication service with login, register, and password reset

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use opsflow_auth::jwt::JwtService;
use opsflow_auth::password::{PasswordError, PasswordService};

use crate::domain::{Profile, User};
use crate::error::DomainError;
use crate::repositories::{ProfileRepository, UserRepository};

/// Authentication service for handling user login/register flows.
pub struct AuthService<U: UserRepository, P: ProfileRepository> {
    users: Arc<U>,
    profiles: Arc<P>,
    jwt: Arc<JwtService>,
}

impl<U: UserRepository, P: ProfileRepository> AuthService<U, P> {
    pub fn new(users: Arc<U>, profiles: Arc<P>, jwt: Arc<JwtService>) -> Self {
        Self { users, profiles, jwt }
    }

    /// Login with email and password.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult, DomainError> {
        info!("Login attempt for email: {}", email);

        let mut user = self.users.find_by_email(email).await?.ok_or_else(|| {
            warn!("Login failed: email not found: {}", email);
            DomainError::InvalidCredentials
        })?;

        if !user.can_login() {
            warn!("Login failed: user not active: {}", email);
            return Err(DomainError::UserNotActive);
        }

        let password_valid = PasswordService::verify(password, &user.password_hash)
            .map_err(|_| DomainError::InvalidCredentials)?;
        if !password_valid {
            warn!("Login failed: invalid password for: {}", email);
            return Err(DomainError::InvalidCredentials);
        }

        // Every signed-in user owns exactly one profile; heal a missing row
        // before tokens are handed out.
        self.ensure_profile(&user).await?;

        let access_token = self
            .jwt
            .generate_access_token(&user.id)
            .map_err(|e| DomainError::TokenGenerationError(e.to_string()))?;
        let refresh_token = self
            .jwt
            .generate_refresh_token(&user.id)
            .map_err(|e| DomainError::TokenGenerationError(e.to_string()))?;

        user.record_login();
        if let Err(e) = self.users.update(&user).await {
            error!("Failed to update last login: {}", e);
            // Don't fail login for this
        }

        info!("Login successful for: {}", email);

        Ok(LoginResult {
            user: UserInfo::from(&user),
            access_token,
            refresh_token,
        })
    }

    /// Register a new account, creating its guest profile alongside.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<RegisterResult, DomainError> {
        info!("Registration attempt for email: {}", email);

        if self.users.find_by_email(email).await?.is_some() {
            warn!("Registration failed: email already exists: {}", email);
            return Err(DomainError::EmailAlreadyExists(email.to_string()));
        }

        let password_hash = PasswordService::hash(password).map_err(|e| match e {
            PasswordError::TooShort | PasswordError::TooLong => {
                DomainError::ValidationError(e.to_string())
            }
            PasswordError::HashError(msg) => DomainError::PasswordHashError(msg),
        })?;

        let user = User::new(
            email.to_string(),
            password_hash,
            full_name.map(str::to_string),
        )
        .map_err(|e| DomainError::ValidationError(e.to_string()))?;

        let created_user = self.users.create(&user).await?;

        let profile = Profile::new_guest(created_user.id, created_user.full_name.clone());
        self.profiles.create(&profile).await?;

        info!("Registration successful for: {}", email);

        Ok(RegisterResult {
            user: UserInfo::from(&created_user),
        })
    }

    /// Acknowledge a reset request without leaking account existence.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), DomainError> {
        match self.users.find_by_email(email).await? {
            Some(user) => info!("Password reset requested for user {}", user.id),
            None => info!("Password reset requested for unknown email"),
        }
        Ok(())
    }

    async fn ensure_profile(&self, user: &User) -> Result<(), DomainError> {
        if self.profiles.find_by_id(&user.id).await?.is_none() {
            warn!("Profile missing for user {}, creating guest profile", user.id);
            let profile = Profile::new_guest(user.id, user.full_name.clone());
            self.profiles.create(&profile).await?;
        }
        Ok(())
    }
}

/// Result of successful login.
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user: UserInfo,
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of successful registration.
#[derive(Debug, Clone)]
pub struct RegisterResult {
    pub user: UserInfo,
}

/// User info returned in auth responses.
#[derive(Debug, Clone)]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub email_verified: bool,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            email_verified: user.email_verified,
        }
    }
}
