//! Depreciation domain module.
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns. The
//! orchestrator in `assetbook-infra` feeds asset snapshots in and persists
//! what comes out.

pub mod asset;
pub mod calculator;
pub mod entry;
pub mod method;
pub mod run_log;
pub mod status;

pub use asset::{Asset, DepreciationMethodKind};
pub use calculator::{calculate, project_schedule, CalcError, Calculation, PeriodDepreciation, SkipReason};
pub use entry::{DepreciationEntry, PreviewLine};
pub use method::{method_for, DepreciationMethod, StraightLine};
pub use run_log::{status_for, summarize, AssetFailure, RunLog, RunStatus};
pub use status::{AssetEvent, AssetStatus, TransitionError};
