//! # Opsflow Auth
//!
//! Password hashing, token issuing, the auth-provider port, and the
//! session lifecycle manager.

pub mod error;
pub mod jwt;
pub mod password;
pub mod provider;
pub mod session;

pub use error::AuthError;
pub use jwt::JwtService;
pub use provider::{AuthProvider, Credentials, SessionChange};
pub use session::{Session, SessionManager};
