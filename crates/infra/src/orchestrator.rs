//! Depreciation run orchestration.
//!
//! ```text
//! caller identity + RunRequest
//!   ↓
//! 1. Resolve tenant scope and permission (no IO)
//!   ↓
//! 2. Resolve target period
//!   ↓
//! 3. List eligible assets (tenant-scoped)
//!   ↓
//! 4. Calculate per asset (pure)
//!   ↓
//! 5. dry run: collect preview | commit: conditional insert per asset
//!   ↓
//! 6. Append one run log row (commit only)
//! ```
//!
//! Per-asset failures are collected and never abort the run. Cancellation is
//! checked between assets. The run deadline also bounds each per-asset write;
//! a write cut off at the deadline is dropped (its transaction rolls back) and
//! whatever was committed before stays committed.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, field, info, instrument, warn, Span};

use assetbook_auth::{authorize, ensure_scope, AuthzError, JwtClaims, Permission, TenantResolver};
use assetbook_core::{AssetId, ExpectedVersion, Period, RunId, TenantId};
use assetbook_depreciation::{
    calculate, status_for, summarize, Asset, AssetFailure, Calculation, DepreciationEntry, PeriodDepreciation,
    PreviewLine, RunLog, RunStatus,
};

use crate::config::RunnerConfig;
use crate::store::{AssetLedgerStore, RecordOutcome, RunLogStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// Tenant the caller asks to run for; only accepted if it matches the
    /// caller's verified scope.
    pub tenant_id: TenantId,
    pub dry_run: bool,
    /// First day of the target month; defaults to the current month.
    pub period_start: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// `None` for dry runs, which leave no run log.
    pub run_id: Option<RunId>,
    pub tenant_id: TenantId,
    pub period_start: Period,
    pub dry_run: bool,
    pub status: RunStatus,
    pub entries_created: u32,
    pub assets_considered: u32,
    pub assets_skipped: u32,
    pub preview: Vec<PreviewLine>,
    pub failures: Vec<AssetFailure>,
    /// Set when the run stopped early (timeout or cancellation).
    pub interrupted: Option<String>,
}

impl RunReport {
    /// Non-fatal problems, one line each.
    pub fn warnings(&self) -> Vec<String> {
        self.failures
            .iter()
            .map(|f| format!("asset {}: {}", f.asset_id, f.reason))
            .chain(self.interrupted.iter().cloned())
            .collect()
    }

    /// Strict view: a partial success becomes `RunError::PartialFailure`.
    pub fn into_result(self) -> Result<RunReport, RunError> {
        match self.status {
            RunStatus::PartialSuccess => Err(RunError::PartialFailure(Box::new(self))),
            _ => Ok(self),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RunError {
    #[error("authorization failed: {0}")]
    Authorization(#[from] AuthzError),

    #[error("validation failed: {0}")]
    Validation(String),

    /// Carries the full report; committed entries stay committed.
    #[error(
        "run completed with {} failed asset(s); {} entries created",
        .0.failures.len(),
        .0.entries_created
    )]
    PartialFailure(Box<RunReport>),

    #[error("internal error: {0}")]
    Internal(String),
}

/// What happened to one applicable asset in commit mode.
enum Committed {
    Created,
    Skipped,
}

/// Runs monthly depreciation for one tenant at a time.
///
/// Holds no per-run state; concurrent runs (same or different tenants) share
/// only the stores, whose conditional insert keeps each `(asset, period)`
/// entry unique.
#[derive(Clone)]
pub struct DepreciationRunner {
    assets: Arc<dyn AssetLedgerStore>,
    runs: Arc<dyn RunLogStore>,
    resolver: Arc<dyn TenantResolver>,
    config: RunnerConfig,
}

impl DepreciationRunner {
    pub fn new(
        assets: Arc<dyn AssetLedgerStore>,
        runs: Arc<dyn RunLogStore>,
        resolver: Arc<dyn TenantResolver>,
        config: RunnerConfig,
    ) -> Self {
        Self {
            assets,
            runs,
            resolver,
            config,
        }
    }

    pub async fn run(&self, caller: &JwtClaims, request: RunRequest) -> Result<RunReport, RunError> {
        self.run_with(caller, request, Utc::now(), &CancellationToken::new())
            .await
    }

    /// `run` with an explicit clock and cancellation token.
    #[instrument(
        name = "depreciation_run",
        skip(self, caller, request, cancel),
        fields(
            tenant_id = %request.tenant_id,
            dry_run = request.dry_run,
            period_start = field::Empty,
            run_id = field::Empty
        ),
        err
    )]
    pub async fn run_with(
        &self,
        caller: &JwtClaims,
        request: RunRequest,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<RunReport, RunError> {
        let principal = self.resolver.resolve(caller, now)?;
        let tenant_id = ensure_scope(&principal, request.tenant_id)?;
        let required = if request.dry_run {
            Permission::PREVIEW_DEPRECIATION
        } else {
            Permission::RUN_DEPRECIATION
        };
        authorize(&principal, &required)?;

        let period = resolve_period(request.period_start, now)?;
        let dry_run = request.dry_run;
        let run_id = RunId::new();
        let deadline = Instant::now() + self.config.run_timeout;

        let span = Span::current();
        span.record("period_start", field::display(period));
        if !dry_run {
            span.record("run_id", field::display(run_id));
        }

        let assets = match tokio::time::timeout_at(deadline, self.assets.list_eligible_assets(tenant_id)).await {
            Ok(Ok(assets)) => assets,
            Ok(Err(e)) => return Err(self.fail_run(run_id, tenant_id, period, now, dry_run, e.to_string()).await),
            Err(_) => {
                let reason = "timed out listing assets".to_string();
                return Err(self.fail_run(run_id, tenant_id, period, now, dry_run, reason).await);
            }
        };
        debug!(assets = assets.len(), "listed eligible assets");

        let mut report = RunReport {
            run_id: (!dry_run).then_some(run_id),
            tenant_id,
            period_start: period,
            dry_run,
            status: RunStatus::Success,
            entries_created: 0,
            assets_considered: 0,
            assets_skipped: 0,
            preview: Vec::new(),
            failures: Vec::new(),
            interrupted: None,
        };

        for asset in assets {
            if cancel.is_cancelled() {
                report.interrupted = Some("run cancelled before all assets were processed".to_string());
                break;
            }
            if Instant::now() >= deadline {
                report.interrupted = Some(self.timed_out());
                break;
            }
            report.assets_considered += 1;

            let asset_id = asset.id;
            match calculate(&asset, period) {
                Err(e) => report.failures.push(failure(asset_id, e.to_string())),
                Ok(Calculation::NotApplicable(reason)) => {
                    debug!(%asset_id, ?reason, "asset not applicable");
                    report.assets_skipped += 1;
                }
                Ok(Calculation::Applicable(step)) if dry_run => {
                    report.preview.push(PreviewLine::new(asset_id, &step));
                }
                Ok(Calculation::Applicable(step)) => {
                    match tokio::time::timeout_at(deadline, self.commit(&asset, step, run_id, now)).await {
                        Ok(Ok(Committed::Created)) => report.entries_created += 1,
                        Ok(Ok(Committed::Skipped)) => report.assets_skipped += 1,
                        Ok(Err(reason)) => {
                            warn!(%asset_id, %reason, "asset failed");
                            report.failures.push(failure(asset_id, reason));
                        }
                        Err(_) => {
                            warn!(%asset_id, "write still pending at run deadline");
                            report.interrupted = Some(self.timed_out());
                            break;
                        }
                    }
                }
            }
        }

        report.status = status_for(&report.failures, report.interrupted.is_some());

        if dry_run {
            info!(
                previewed = report.preview.len(),
                skipped = report.assets_skipped,
                failed = report.failures.len(),
                "depreciation dry run"
            );
            return Ok(report);
        }

        let log = RunLog {
            id: run_id,
            tenant_id,
            run_date: now,
            period_start: period,
            entries_created: report.entries_created,
            assets_considered: report.assets_considered,
            assets_skipped: report.assets_skipped,
            status: report.status,
            error_summary: summarize(&report.failures, report.interrupted.as_deref()),
        };
        if let Err(e) = self.runs.append_run_log(log).await {
            return Err(RunError::Internal(format!(
                "{} entries committed but the run log could not be written: {e}",
                report.entries_created
            )));
        }

        info!(
            status = report.status.as_str(),
            entries_created = report.entries_created,
            skipped = report.assets_skipped,
            failed = report.failures.len(),
            "depreciation run committed"
        );
        Ok(report)
    }

    fn timed_out(&self) -> String {
        format!(
            "run timed out after {}ms before all assets were processed",
            self.config.run_timeout.as_millis()
        )
    }

    /// Persist one step; on a version conflict reload the asset and retry once.
    async fn commit(
        &self,
        asset: &Asset,
        step: PeriodDepreciation,
        run_id: RunId,
        now: DateTime<Utc>,
    ) -> Result<Committed, String> {
        match self.record(asset, &step, run_id, now).await {
            Ok(committed) => return Ok(committed),
            Err(StoreError::Conflict(msg)) => {
                debug!(asset_id = %asset.id, %msg, "version conflict, retrying with fresh snapshot");
            }
            Err(e) => return Err(e.to_string()),
        }

        let fresh = match self.assets.get_asset(asset.tenant_id, asset.id).await {
            Ok(Some(fresh)) => fresh,
            Ok(None) => return Err("asset no longer exists".to_string()),
            Err(e) => return Err(e.to_string()),
        };
        if !fresh.is_eligible_for_runs() {
            return Ok(Committed::Skipped);
        }

        match calculate(&fresh, step.period).map_err(|e| e.to_string())? {
            Calculation::NotApplicable(_) => Ok(Committed::Skipped),
            Calculation::Applicable(step) => match self.record(&fresh, &step, run_id, now).await {
                Ok(committed) => Ok(committed),
                Err(StoreError::Conflict(_)) => {
                    Err("asset was modified concurrently; retry did not succeed".to_string())
                }
                Err(e) => Err(e.to_string()),
            },
        }
    }

    async fn record(
        &self,
        asset: &Asset,
        step: &PeriodDepreciation,
        run_id: RunId,
        now: DateTime<Utc>,
    ) -> Result<Committed, StoreError> {
        let entry = DepreciationEntry::new(asset, step, run_id, now);
        match self
            .assets
            .record_depreciation(entry, ExpectedVersion::Exact(asset.version))
            .await?
        {
            RecordOutcome::Applied => Ok(Committed::Created),
            RecordOutcome::AlreadyApplied => {
                debug!(asset_id = %asset.id, "entry already recorded by another run");
                Ok(Committed::Skipped)
            }
        }
    }

    /// Systemic failure before any asset was touched. Commit mode leaves a
    /// `failed` run log behind when the log store is still reachable.
    async fn fail_run(
        &self,
        run_id: RunId,
        tenant_id: TenantId,
        period: Period,
        now: DateTime<Utc>,
        dry_run: bool,
        reason: String,
    ) -> RunError {
        if !dry_run {
            let log = RunLog::failed(run_id, tenant_id, period, now, reason.clone());
            if let Err(e) = self.runs.append_run_log(log).await {
                warn!(error = %e, "could not record failed run");
            }
        }
        RunError::Internal(reason)
    }
}

fn failure(asset_id: AssetId, reason: String) -> AssetFailure {
    AssetFailure { asset_id, reason }
}

/// Requested period, or the current month. Future months are rejected.
pub fn resolve_period(requested: Option<NaiveDate>, now: DateTime<Utc>) -> Result<Period, RunError> {
    let current = Period::current(now);
    let Some(date) = requested else {
        return Ok(current);
    };
    let period = Period::new(date).map_err(|e| RunError::Validation(e.to_string()))?;
    if period > current {
        return Err(RunError::Validation(format!(
            "period {period} lies after the current period {current}"
        )));
    }
    Ok(period)
}
