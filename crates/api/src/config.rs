use std::net::SocketAddr;

use assetbook_infra::{ConfigError, DatabaseConfig, RunnerConfig};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEV_JWT_SECRET: &str = "dev-secret";

/// Server configuration loaded from environment variables.
///
/// | Env Var                        | Default        |
/// |--------------------------------|----------------|
/// | `ASSETBOOK_BIND_ADDR`          | `0.0.0.0:8080` |
/// | `JWT_SECRET`                   | dev default    |
/// | `DATABASE_URL`                 | in-memory      |
/// | `ASSETBOOK_DB_MAX_CONNECTIONS` | `5`            |
/// | `ASSETBOOK_RUN_TIMEOUT_SECS`   | `300`          |
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub runner: RunnerConfig,
    pub database: DatabaseConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_addr = std::env::var("ASSETBOOK_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr.trim().parse().map_err(|_| ConfigError::Invalid {
            var: "ASSETBOOK_BIND_ADDR",
            expected: "a socket address such as 0.0.0.0:8080",
            value: raw_addr.clone(),
        })?;

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                DEV_JWT_SECRET.to_string()
            }
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            runner: RunnerConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
        })
    }
}
