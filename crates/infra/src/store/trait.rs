use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use assetbook_core::{AssetId, ExpectedVersion, TenantId};
use assetbook_depreciation::{Asset, AssetEvent, DepreciationEntry, RunLog};

/// Result of a conditional entry insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The entry was inserted and the asset updated.
    Applied,
    /// An entry for `(asset_id, period_start)` already existed; nothing written.
    AlreadyApplied,
}

/// Store operation error.
///
/// These are **infrastructure errors** as opposed to domain errors
/// (validation, invariants).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    /// The asset moved past the expected version.
    #[error("optimistic concurrency check failed: {0}")]
    Conflict(String),

    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),

    /// A persisted row could not be mapped back to a domain value.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable depreciation state of a tenant's assets.
///
/// Every method is tenant-scoped: implementations filter all reads by
/// `tenant_id` and refuse writes whose payload belongs to another tenant.
#[async_trait]
pub trait AssetLedgerStore: Send + Sync {
    /// Non-deleted, non-disposed assets of the tenant, ordered by id.
    async fn list_eligible_assets(&self, tenant_id: TenantId) -> Result<Vec<Asset>, StoreError>;

    async fn get_asset(&self, tenant_id: TenantId, asset_id: AssetId) -> Result<Option<Asset>, StoreError>;

    /// Register an asset (normally written by the asset CRUD collaborator).
    async fn insert_asset(&self, asset: Asset) -> Result<(), StoreError>;

    /// Atomically insert `entry` if no entry exists for its
    /// `(asset_id, period_start)` and fold it into the asset, provided the
    /// asset is still at `expected_version`.
    async fn record_depreciation(
        &self,
        entry: DepreciationEntry,
        expected_version: ExpectedVersion,
    ) -> Result<RecordOutcome, StoreError>;

    /// Entries of one asset, ordered by period.
    async fn list_entries(
        &self,
        tenant_id: TenantId,
        asset_id: AssetId,
    ) -> Result<Vec<DepreciationEntry>, StoreError>;

    /// Atomically set the asset status to `event.to_status` and append `event`,
    /// provided the asset is still at `expected_version` and `event.from_status`.
    async fn record_status_change(
        &self,
        event: AssetEvent,
        expected_version: ExpectedVersion,
    ) -> Result<(), StoreError>;

    /// Lifecycle events of one asset, oldest first.
    async fn list_events(&self, tenant_id: TenantId, asset_id: AssetId) -> Result<Vec<AssetEvent>, StoreError>;
}

/// Append-only run history.
#[async_trait]
pub trait RunLogStore: Send + Sync {
    async fn append_run_log(&self, log: RunLog) -> Result<(), StoreError>;

    /// Most recent runs first.
    async fn list_runs(&self, tenant_id: TenantId, limit: usize) -> Result<Vec<RunLog>, StoreError>;
}

#[async_trait]
impl<S> AssetLedgerStore for Arc<S>
where
    S: AssetLedgerStore + ?Sized,
{
    async fn list_eligible_assets(&self, tenant_id: TenantId) -> Result<Vec<Asset>, StoreError> {
        (**self).list_eligible_assets(tenant_id).await
    }

    async fn get_asset(&self, tenant_id: TenantId, asset_id: AssetId) -> Result<Option<Asset>, StoreError> {
        (**self).get_asset(tenant_id, asset_id).await
    }

    async fn insert_asset(&self, asset: Asset) -> Result<(), StoreError> {
        (**self).insert_asset(asset).await
    }

    async fn record_depreciation(
        &self,
        entry: DepreciationEntry,
        expected_version: ExpectedVersion,
    ) -> Result<RecordOutcome, StoreError> {
        (**self).record_depreciation(entry, expected_version).await
    }

    async fn list_entries(
        &self,
        tenant_id: TenantId,
        asset_id: AssetId,
    ) -> Result<Vec<DepreciationEntry>, StoreError> {
        (**self).list_entries(tenant_id, asset_id).await
    }

    async fn record_status_change(
        &self,
        event: AssetEvent,
        expected_version: ExpectedVersion,
    ) -> Result<(), StoreError> {
        (**self).record_status_change(event, expected_version).await
    }

    async fn list_events(&self, tenant_id: TenantId, asset_id: AssetId) -> Result<Vec<AssetEvent>, StoreError> {
        (**self).list_events(tenant_id, asset_id).await
    }
}

#[async_trait]
impl<S> RunLogStore for Arc<S>
where
    S: RunLogStore + ?Sized,
{
    async fn append_run_log(&self, log: RunLog) -> Result<(), StoreError> {
        (**self).append_run_log(log).await
    }

    async fn list_runs(&self, tenant_id: TenantId, limit: usize) -> Result<Vec<RunLog>, StoreError> {
        (**self).list_runs(tenant_id, limit).await
    }
}
