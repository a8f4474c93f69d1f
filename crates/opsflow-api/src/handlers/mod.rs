//! HTTP handlers

pub mod admin;
pub mod auth;
pub mod health;
pub mod notification;
pub mod profile;
pub mod tenant_request;
