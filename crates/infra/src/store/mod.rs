//! Asset ledger persistence: assets, depreciation entries, lifecycle events
//! and the run log.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryLedgerStore;
pub use postgres::PostgresLedgerStore;
pub use r#trait::{AssetLedgerStore, RecordOutcome, RunLogStore, StoreError};
