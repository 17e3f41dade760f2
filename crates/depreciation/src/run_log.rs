//! Run log: one append-only row per committed orchestrator invocation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use assetbook_core::{AssetId, DomainError, Entity, Period, RunId, TenantId, TenantScoped};

/// Aggregate outcome of a committed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every applicable asset was written.
    Success,
    /// Some assets failed, or the run stopped early (timeout/cancellation).
    PartialSuccess,
    /// The run could not proceed at all.
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::PartialSuccess => "partial_success",
            RunStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "success" => Ok(RunStatus::Success),
            "partial_success" => Ok(RunStatus::PartialSuccess),
            "failed" => Ok(RunStatus::Failed),
            other => Err(DomainError::validation(format!("unknown run status '{other}'"))),
        }
    }
}

/// A single asset that could not be processed in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFailure {
    pub asset_id: AssetId,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLog {
    pub id: RunId,
    pub tenant_id: TenantId,
    pub run_date: DateTime<Utc>,
    pub period_start: Period,
    pub entries_created: u32,
    pub assets_considered: u32,
    pub assets_skipped: u32,
    pub status: RunStatus,
    pub error_summary: Option<String>,
}

impl RunLog {
    /// Row for a run that stopped before touching any asset.
    pub fn failed(
        id: RunId,
        tenant_id: TenantId,
        period_start: Period,
        run_date: DateTime<Utc>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id,
            tenant_id,
            run_date,
            period_start,
            entries_created: 0,
            assets_considered: 0,
            assets_skipped: 0,
            status: RunStatus::Failed,
            error_summary: Some(reason.into()),
        }
    }
}

impl Entity for RunLog {
    type Id = RunId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl TenantScoped for RunLog {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Status for a run that got past asset listing.
pub fn status_for(failures: &[AssetFailure], interrupted: bool) -> RunStatus {
    if failures.is_empty() && !interrupted {
        RunStatus::Success
    } else {
        RunStatus::PartialSuccess
    }
}

/// Human-readable `error_summary`, one line per failed asset.
pub fn summarize(failures: &[AssetFailure], interruption: Option<&str>) -> Option<String> {
    let mut lines: Vec<String> = failures
        .iter()
        .map(|f| format!("asset {}: {}", f.asset_id, f.reason))
        .collect();
    if let Some(reason) = interruption {
        lines.push(reason.to_string());
    }
    if lines.is_empty() { None } else { Some(lines.join("\n")) }
}
