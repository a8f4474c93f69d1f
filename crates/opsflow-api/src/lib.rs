//! # Opsflow API
//!
//! HTTP handlers, middleware, and the router.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::AppState;
