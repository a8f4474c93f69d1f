//! # Opsflow Core
//!
//! Domain entities, repository traits, services, and the authorization gate
//! for the identity/tenant lifecycle subsystem.

pub mod domain;
pub mod error;
pub mod gate;
pub mod repositories;
pub mod services;

pub use domain::*;
pub use error::DomainError;
