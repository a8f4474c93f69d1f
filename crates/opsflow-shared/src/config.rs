//! Configuration management

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub workflow: WorkflowSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub env: String,
    pub host: String,
    pub port: u16,
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_expiry: i64,
    pub refresh_token_expiry: i64,
}

/// Tenant-request workflow settings.
///
/// `accepted_role` is the role a guest is elevated to when they accept an
/// approved request. This is deployment configuration, not a fixed mapping.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkflowSettings {
    pub accepted_role: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let config = Config::builder()
            .set_default("app.env", "development")?
            .set_default("app.host", "127.0.0.1")?
            .set_default("app.port", 8080)?
            .set_default("app.name", "opsflow-server")?
            .set_default("database.max_connections", 10)?
            .set_default("jwt.access_token_expiry", super::constants::DEFAULT_ACCESS_TOKEN_EXPIRY)?
            .set_default("jwt.refresh_token_expiry", super::constants::DEFAULT_REFRESH_TOKEN_EXPIRY)?
            .set_default("workflow.accepted_role", "staff")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::default().separator("__").try_parsing(true))
            .build()?;
        config.try_deserialize()
    }
}
