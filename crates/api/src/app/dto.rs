use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use assetbook_core::{Period, RunId, TenantId};
use assetbook_depreciation::{AssetStatus, PreviewLine, RunStatus};
use assetbook_infra::RunReport;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RunDepreciationRequest {
    pub tenant_id: TenantId,
    #[serde(default)]
    pub dry_run: bool,
    pub period_start: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: AssetStatus,
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListRunsQuery {
    pub limit: Option<usize>,
}

pub const DEFAULT_RUNS_LIMIT: usize = 50;
pub const MAX_RUNS_LIMIT: usize = 500;

impl ListRunsQuery {
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_RUNS_LIMIT).clamp(1, MAX_RUNS_LIMIT)
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct CommittedRunResponse {
    pub run_id: Option<RunId>,
    pub period_start: Period,
    pub status: RunStatus,
    pub entries_created: u32,
    pub assets_considered: u32,
    pub assets_skipped: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PreviewRunResponse {
    pub period_start: Period,
    pub status: RunStatus,
    pub assets_considered: u32,
    pub assets_skipped: u32,
    pub preview: Vec<PreviewLine>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl From<RunReport> for CommittedRunResponse {
    fn from(report: RunReport) -> Self {
        Self {
            warnings: report.warnings(),
            run_id: report.run_id,
            period_start: report.period_start,
            status: report.status,
            entries_created: report.entries_created,
            assets_considered: report.assets_considered,
            assets_skipped: report.assets_skipped,
        }
    }
}

impl From<RunReport> for PreviewRunResponse {
    fn from(report: RunReport) -> Self {
        Self {
            warnings: report.warnings(),
            period_start: report.period_start,
            status: report.status,
            assets_considered: report.assets_considered,
            assets_skipped: report.assets_skipped,
            preview: report.preview,
        }
    }
}
