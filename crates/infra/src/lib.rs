//! Infrastructure layer: storage adapters, configuration and the
//! orchestration services that sit between the HTTP surface and the pure
//! depreciation domain.

pub mod config;
pub mod orchestrator;
pub mod recorder;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use config::{ConfigError, DatabaseConfig, RunnerConfig};
pub use orchestrator::{DepreciationRunner, RunError, RunReport, RunRequest};
pub use recorder::{RecorderError, StatusRecorder};
pub use store::{AssetLedgerStore, InMemoryLedgerStore, PostgresLedgerStore, RecordOutcome, RunLogStore, StoreError};
