//! # Opsflow Shared
//!
//! Configuration, telemetry, constants, and the event-subscription
//! primitive used across the workspace.

pub mod config;
pub mod constants;
pub mod events;
pub mod telemetry;

pub use events::{EventBus, Subscription};
