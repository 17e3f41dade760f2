//! Environment-driven configuration for the runner and the database pool.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;

pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("database connection failed: {0}")]
    Database(String),
}

fn parse_var<T: std::str::FromStr>(
    var: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            expected,
            value: raw,
        }),
        _ => Ok(default),
    }
}

/// Orchestrator settings.
///
/// | Env Var                      | Default |
/// |------------------------------|---------|
/// | `ASSETBOOK_RUN_TIMEOUT_SECS` | `300`   |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Upper bound on one run; bounds listing and every per-asset write.
    pub run_timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            run_timeout: Duration::from_secs(DEFAULT_RUN_TIMEOUT_SECS),
        }
    }
}

impl RunnerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let secs = parse_var(
            "ASSETBOOK_RUN_TIMEOUT_SECS",
            "a positive number of seconds",
            DEFAULT_RUN_TIMEOUT_SECS,
        )?;
        if secs == 0 {
            return Err(ConfigError::Invalid {
                var: "ASSETBOOK_RUN_TIMEOUT_SECS",
                expected: "a positive number of seconds",
                value: "0".to_string(),
            });
        }
        Ok(Self {
            run_timeout: Duration::from_secs(secs),
        })
    }
}

/// Postgres settings. Without `DATABASE_URL` the service runs on the
/// in-memory store.
///
/// | Env Var                        | Default |
/// |--------------------------------|---------|
/// | `DATABASE_URL`                 | unset   |
/// | `ASSETBOOK_DB_MAX_CONNECTIONS` | `5`     |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var("DATABASE_URL")
            .ok()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        let max_connections = parse_var(
            "ASSETBOOK_DB_MAX_CONNECTIONS",
            "a connection count",
            DEFAULT_DB_MAX_CONNECTIONS,
        )?;
        Ok(Self { url, max_connections })
    }

    /// Open a pool for `url`. Returns `Ok(None)` when no database is configured.
    pub async fn connect(&self) -> Result<Option<PgPool>, ConfigError> {
        let Some(url) = &self.url else {
            return Ok(None);
        };
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections.max(1))
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await
            .map_err(|e| ConfigError::Database(e.to_string()))?;
        Ok(Some(pool))
    }
}
