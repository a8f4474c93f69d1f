//! User account entity (auth identity)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct User {
    pub id: Uuid,

    #[validate(email)]
    pub email: String,
    pub password_hash: String,

    pub full_name: Option<String>,
    pub is_active: bool,
    pub email_verified: bool,

    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(
        email: String,
        password_hash: String,
        full_name: Option<String>,
    ) -> Result<Self, validator::ValidationErrors> {
        let user = Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            full_name,
            is_active: true,
            email_verified: false,
            created_at: Utc::now(),
            last_login_at: None,
        };
        user.validate()?;
        Ok(user)
    }

    pub fn can_login(&self) -> bool {
        self.is_active
    }

    pub fn record_login(&mut self) {
        self.last_login_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_email() {
        assert!(User::new("not-an-email".into(), "hash".into(), None).is_err());
    }

    #[test]
    fn test_new_user_is_active() {
        let user = User::new("alice@example.com".into(), "hash".into(), Some("Alice".into())).unwrap();
        assert!(user.can_login());
        assert!(!user.email_verified);
    }
}
