//! Engine wiring: stores, resolver, runner and recorder behind one handle.

use std::sync::Arc;

use assetbook_auth::{ClaimsTenantResolver, TenantResolver};
use assetbook_infra::{
    AssetLedgerStore, ConfigError, DepreciationRunner, InMemoryLedgerStore, PostgresLedgerStore, RunLogStore,
    RunnerConfig, StatusRecorder,
};
use sqlx::PgPool;

use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppServices {
    pub assets: Arc<dyn AssetLedgerStore>,
    pub runs: Arc<dyn RunLogStore>,
    pub resolver: Arc<dyn TenantResolver>,
    pub runner: DepreciationRunner,
    pub recorder: StatusRecorder,
}

impl AppServices {
    pub fn new(assets: Arc<dyn AssetLedgerStore>, runs: Arc<dyn RunLogStore>, runner_config: RunnerConfig) -> Self {
        let resolver: Arc<dyn TenantResolver> = Arc::new(ClaimsTenantResolver);
        let runner = DepreciationRunner::new(assets.clone(), runs.clone(), resolver.clone(), runner_config);
        let recorder = StatusRecorder::new(assets.clone(), resolver.clone());
        Self {
            assets,
            runs,
            resolver,
            runner,
            recorder,
        }
    }

    /// In-memory wiring (dev/test).
    pub fn in_memory(runner_config: RunnerConfig) -> Self {
        let store = InMemoryLedgerStore::arc();
        Self::new(store.clone(), store, runner_config)
    }

    pub fn postgres(pool: PgPool, runner_config: RunnerConfig) -> Self {
        let store = Arc::new(PostgresLedgerStore::new(pool));
        Self::new(store.clone(), store, runner_config)
    }
}

/// Postgres when `DATABASE_URL` is set (after applying migrations),
/// in-memory otherwise.
pub async fn build_services(config: &ServerConfig) -> Result<AppServices, ConfigError> {
    match config.database.connect().await? {
        Some(pool) => {
            let store = PostgresLedgerStore::new(pool.clone());
            store
                .migrate()
                .await
                .map_err(|e| ConfigError::Database(e.to_string()))?;
            tracing::info!("using postgres ledger store");
            Ok(AppServices::postgres(pool, config.runner))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory ledger store");
            Ok(AppServices::in_memory(config.runner))
        }
    }
}
