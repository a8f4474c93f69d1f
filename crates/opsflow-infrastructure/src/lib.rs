//! # Opsflow Infrastructure
//!
//! PostgreSQL implementations of the repository ports (adapters).

pub mod database;

pub use database::{
    create_pool, PgNotificationRepository, PgProfileRepository, PgTenantRequestRepository,
    PgUserRepository,
};
