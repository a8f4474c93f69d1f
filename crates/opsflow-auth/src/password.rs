//! Password hashing with Argon2

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

use opsflow_shared::constants::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters")]
    TooShort,
    #[error("Password must be at most {MAX_PASSWORD_LENGTH} characters")]
    TooLong,
    #[error("Hash error: {0}")]
    HashError(String),
}

pub struct PasswordService;

impl PasswordService {
    pub fn validate_policy(password: &str) -> Result<(), PasswordError> {
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(PasswordError::TooShort);
        }
        if password.len() > MAX_PASSWORD_LENGTH {
            return Err(PasswordError::TooLong);
        }
        Ok(())
    }

    pub fn hash(password: &str) -> Result<String, PasswordError> {
        Self::validate_policy(password)?;
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| PasswordError::HashError(e.to_string()))
    }

    pub fn verify(password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| PasswordError::HashError(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = PasswordService::hash("correct-horse-battery").unwrap();
        assert!(PasswordService::verify("correct-horse-battery", &hash).unwrap());
        assert!(!PasswordService::verify("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_policy_rejects_short_password() {
        assert!(matches!(
            PasswordService::hash("short"),
            Err(PasswordError::TooShort)
        ));
    }
}
