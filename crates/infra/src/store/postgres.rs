//! Postgres-backed asset ledger.
//!
//! ## Concurrency
//!
//! `record_depreciation` runs one transaction per asset:
//! 1. `INSERT ... ON CONFLICT (tenant_id, asset_id, period_start) DO NOTHING`;
//!    zero affected rows means a concurrent run got there first
//!    (`RecordOutcome::AlreadyApplied`),
//! 2. a version-checked `UPDATE assets`; zero affected rows means the asset
//!    changed since it was read (`StoreError::Conflict`) and the insert is
//!    rolled back.
//!
//! ## Tenant Isolation
//!
//! Every query includes `tenant_id` in the WHERE clause or as part of the key.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use tracing::instrument;
use uuid::Uuid;

use assetbook_core::{AssetId, EntryId, EventId, ExpectedVersion, Money, Period, RunId, TenantId, UserId};
use assetbook_depreciation::{
    Asset, AssetEvent, AssetStatus, DepreciationEntry, DepreciationMethodKind, RunLog, RunStatus,
};

use super::r#trait::{AssetLedgerStore, RecordOutcome, RunLogStore, StoreError};

#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: Arc<PgPool>,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Apply the bundled schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&*self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("migration failed: {e}")))
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                Some("23503") => StoreError::NotFound(msg),
                _ => StoreError::Unavailable(msg),
            }
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Corrupt(format!("failed to decode row in {operation}: {err}"))
        }
        other => StoreError::Unavailable(format!("sqlx error in {operation}: {other}")),
    }
}

fn expected_to_sql(expected: ExpectedVersion) -> Option<i64> {
    match expected {
        ExpectedVersion::Any => None,
        ExpectedVersion::Exact(v) => Some(v as i64),
    }
}

fn period_from_sql(date: NaiveDate) -> Result<Period, StoreError> {
    Period::new(date).map_err(|e| StoreError::Corrupt(e.to_string()))
}

#[derive(Debug, FromRow)]
struct AssetRow {
    tenant_id: Uuid,
    id: Uuid,
    name: String,
    cost: Decimal,
    purchase_date: NaiveDate,
    useful_life_months: i32,
    salvage_value: Decimal,
    depreciation_method: String,
    accumulated_depreciation: Decimal,
    book_value: Decimal,
    status: String,
    is_deleted: bool,
    last_depreciated_period: Option<NaiveDate>,
    version: i64,
}

impl TryFrom<AssetRow> for Asset {
    type Error = StoreError;

    fn try_from(row: AssetRow) -> Result<Self, Self::Error> {
        let corrupt = |e: assetbook_core::DomainError| StoreError::Corrupt(format!("asset {}: {e}", row.id));
        Ok(Asset {
            id: AssetId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            cost: Money::new(row.cost),
            purchase_date: row.purchase_date,
            useful_life_months: u32::try_from(row.useful_life_months)
                .map_err(|_| StoreError::Corrupt(format!("asset {}: negative useful life", row.id)))?,
            salvage_value: Money::new(row.salvage_value),
            depreciation_method: DepreciationMethodKind::parse(&row.depreciation_method).map_err(corrupt)?,
            accumulated_depreciation: Money::new(row.accumulated_depreciation),
            book_value: Money::new(row.book_value),
            status: AssetStatus::parse(&row.status).map_err(corrupt)?,
            is_deleted: row.is_deleted,
            last_depreciated_period: row.last_depreciated_period.map(period_from_sql).transpose()?,
            version: row.version.max(0) as u64,
            name: row.name,
        })
    }
}

#[derive(Debug, FromRow)]
struct EntryRow {
    id: Uuid,
    tenant_id: Uuid,
    asset_id: Uuid,
    run_id: Uuid,
    period_start: NaiveDate,
    depreciation_amount: Decimal,
    accumulated_depreciation: Decimal,
    book_value: Decimal,
    created_at: DateTime<Utc>,
}

impl TryFrom<EntryRow> for DepreciationEntry {
    type Error = StoreError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        Ok(DepreciationEntry {
            id: EntryId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            asset_id: AssetId::from_uuid(row.asset_id),
            run_id: RunId::from_uuid(row.run_id),
            period_start: period_from_sql(row.period_start)?,
            depreciation_amount: Money::new(row.depreciation_amount),
            accumulated_depreciation: Money::new(row.accumulated_depreciation),
            book_value: Money::new(row.book_value),
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct EventRow {
    id: Uuid,
    tenant_id: Uuid,
    asset_id: Uuid,
    event_type: String,
    from_status: String,
    to_status: String,
    description: String,
    performed_by: Uuid,
    performed_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for AssetEvent {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let corrupt = |e: assetbook_core::DomainError| StoreError::Corrupt(format!("event {}: {e}", row.id));
        Ok(AssetEvent {
            id: EventId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            asset_id: AssetId::from_uuid(row.asset_id),
            from_status: AssetStatus::parse(&row.from_status).map_err(corrupt)?,
            to_status: AssetStatus::parse(&row.to_status).map_err(corrupt)?,
            event_type: row.event_type,
            description: row.description,
            performed_by: UserId::from_uuid(row.performed_by),
            performed_at: row.performed_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct RunRow {
    id: Uuid,
    tenant_id: Uuid,
    run_date: DateTime<Utc>,
    period_start: NaiveDate,
    entries_created: i32,
    assets_considered: i32,
    assets_skipped: i32,
    status: String,
    error_summary: Option<String>,
}

impl TryFrom<RunRow> for RunLog {
    type Error = StoreError;

    fn try_from(row: RunRow) -> Result<Self, Self::Error> {
        Ok(RunLog {
            id: RunId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            run_date: row.run_date,
            period_start: period_from_sql(row.period_start)?,
            entries_created: row.entries_created.max(0) as u32,
            assets_considered: row.assets_considered.max(0) as u32,
            assets_skipped: row.assets_skipped.max(0) as u32,
            status: RunStatus::parse(&row.status)
                .map_err(|e| StoreError::Corrupt(format!("run {}: {e}", row.id)))?,
            error_summary: row.error_summary,
        })
    }
}

const ASSET_COLUMNS: &str = r#"
    tenant_id, id, name, cost, purchase_date, useful_life_months, salvage_value,
    depreciation_method, accumulated_depreciation, book_value, status, is_deleted,
    last_depreciated_period, version
"#;

#[async_trait]
impl AssetLedgerStore for PostgresLedgerStore {
    #[instrument(skip(self), fields(tenant_id = %tenant_id), err)]
    async fn list_eligible_assets(&self, tenant_id: TenantId) -> Result<Vec<Asset>, StoreError> {
        let sql = format!(
            "SELECT {ASSET_COLUMNS} FROM assets \
             WHERE tenant_id = $1 AND is_deleted = FALSE AND status <> 'disposed' \
             ORDER BY id"
        );
        let rows: Vec<AssetRow> = sqlx::query_as(&sql)
            .bind(tenant_id.as_uuid())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_eligible_assets", e))?;

        rows.into_iter().map(Asset::try_from).collect()
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, asset_id = %asset_id), err)]
    async fn get_asset(&self, tenant_id: TenantId, asset_id: AssetId) -> Result<Option<Asset>, StoreError> {
        let sql = format!("SELECT {ASSET_COLUMNS} FROM assets WHERE tenant_id = $1 AND id = $2");
        let row: Option<AssetRow> = sqlx::query_as(&sql)
            .bind(tenant_id.as_uuid())
            .bind(asset_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_asset", e))?;

        row.map(Asset::try_from).transpose()
    }

    #[instrument(skip(self, asset), fields(tenant_id = %asset.tenant_id, asset_id = %asset.id), err)]
    async fn insert_asset(&self, asset: Asset) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO assets (
                tenant_id, id, name, cost, purchase_date, useful_life_months, salvage_value,
                depreciation_method, accumulated_depreciation, book_value, status, is_deleted,
                last_depreciated_period, version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(asset.tenant_id.as_uuid())
        .bind(asset.id.as_uuid())
        .bind(&asset.name)
        .bind(asset.cost.amount())
        .bind(asset.purchase_date)
        .bind(asset.useful_life_months as i32)
        .bind(asset.salvage_value.amount())
        .bind(asset.depreciation_method.as_str())
        .bind(asset.accumulated_depreciation.amount())
        .bind(asset.book_value.amount())
        .bind(asset.status.as_str())
        .bind(asset.is_deleted)
        .bind(asset.last_depreciated_period.map(|p| p.start()))
        .bind(asset.version as i64)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_asset", e))?;
        Ok(())
    }

    #[instrument(
        skip(self, entry),
        fields(
            tenant_id = %entry.tenant_id,
            asset_id = %entry.asset_id,
            period_start = %entry.period_start,
            expected_version = ?expected_version
        ),
        err
    )]
    async fn record_depreciation(
        &self,
        entry: DepreciationEntry,
        expected_version: ExpectedVersion,
    ) -> Result<RecordOutcome, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO depreciation_entries (
                id, tenant_id, asset_id, run_id, period_start,
                depreciation_amount, accumulated_depreciation, book_value, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (tenant_id, asset_id, period_start) DO NOTHING
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.tenant_id.as_uuid())
        .bind(entry.asset_id.as_uuid())
        .bind(entry.run_id.as_uuid())
        .bind(entry.period_start.start())
        .bind(entry.depreciation_amount.amount())
        .bind(entry.accumulated_depreciation.amount())
        .bind(entry.book_value.amount())
        .bind(entry.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_entry", e))?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;
            return Ok(RecordOutcome::AlreadyApplied);
        }

        let updated = sqlx::query(
            r#"
            UPDATE assets
            SET accumulated_depreciation = $3,
                book_value = $4,
                last_depreciated_period = $5,
                version = version + 1,
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
              AND ($6::BIGINT IS NULL OR version = $6)
            "#,
        )
        .bind(entry.tenant_id.as_uuid())
        .bind(entry.asset_id.as_uuid())
        .bind(entry.accumulated_depreciation.amount())
        .bind(entry.book_value.amount())
        .bind(entry.period_start.start())
        .bind(expected_to_sql(expected_version))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_asset", e))?;

        if updated.rows_affected() == 0 {
            tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::Conflict(format!(
                "asset {} not at {expected_version:?}",
                entry.asset_id
            )));
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(RecordOutcome::Applied)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, asset_id = %asset_id), err)]
    async fn list_entries(
        &self,
        tenant_id: TenantId,
        asset_id: AssetId,
    ) -> Result<Vec<DepreciationEntry>, StoreError> {
        let rows: Vec<EntryRow> = sqlx::query_as(
            r#"
            SELECT id, tenant_id, asset_id, run_id, period_start,
                   depreciation_amount, accumulated_depreciation, book_value, created_at
            FROM depreciation_entries
            WHERE tenant_id = $1 AND asset_id = $2
            ORDER BY period_start ASC
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(asset_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_entries", e))?;

        rows.into_iter().map(DepreciationEntry::try_from).collect()
    }

    #[instrument(
        skip(self, event),
        fields(tenant_id = %event.tenant_id, asset_id = %event.asset_id, to = %event.to_status),
        err
    )]
    async fn record_status_change(
        &self,
        event: AssetEvent,
        expected_version: ExpectedVersion,
    ) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let updated = sqlx::query(
            r#"
            UPDATE assets
            SET status = $3, version = version + 1, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2 AND status = $4
              AND ($5::BIGINT IS NULL OR version = $5)
            "#,
        )
        .bind(event.tenant_id.as_uuid())
        .bind(event.asset_id.as_uuid())
        .bind(event.to_status.as_str())
        .bind(event.from_status.as_str())
        .bind(expected_to_sql(expected_version))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_status", e))?;

        if updated.rows_affected() == 0 {
            tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::Conflict(format!(
                "asset {} changed since it was read",
                event.asset_id
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO asset_events (
                id, tenant_id, asset_id, event_type, from_status, to_status,
                description, performed_by, performed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(event.id.as_uuid())
        .bind(event.tenant_id.as_uuid())
        .bind(event.asset_id.as_uuid())
        .bind(&event.event_type)
        .bind(event.from_status.as_str())
        .bind(event.to_status.as_str())
        .bind(&event.description)
        .bind(event.performed_by.as_uuid())
        .bind(event.performed_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_event", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, asset_id = %asset_id), err)]
    async fn list_events(&self, tenant_id: TenantId, asset_id: AssetId) -> Result<Vec<AssetEvent>, StoreError> {
        let rows: Vec<EventRow> = sqlx::query_as(
            r#"
            SELECT id, tenant_id, asset_id, event_type, from_status, to_status,
                   description, performed_by, performed_at
            FROM asset_events
            WHERE tenant_id = $1 AND asset_id = $2
            ORDER BY performed_at ASC, id ASC
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(asset_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_events", e))?;

        rows.into_iter().map(AssetEvent::try_from).collect()
    }
}

#[async_trait]
impl RunLogStore for PostgresLedgerStore {
    #[instrument(skip(self, log), fields(tenant_id = %log.tenant_id, run_id = %log.id, status = log.status.as_str()), err)]
    async fn append_run_log(&self, log: RunLog) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO depreciation_runs (
                id, tenant_id, run_date, period_start, entries_created,
                assets_considered, assets_skipped, status, error_summary
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(log.id.as_uuid())
        .bind(log.tenant_id.as_uuid())
        .bind(log.run_date)
        .bind(log.period_start.start())
        .bind(log.entries_created as i32)
        .bind(log.assets_considered as i32)
        .bind(log.assets_skipped as i32)
        .bind(log.status.as_str())
        .bind(&log.error_summary)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("append_run_log", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id), err)]
    async fn list_runs(&self, tenant_id: TenantId, limit: usize) -> Result<Vec<RunLog>, StoreError> {
        let rows: Vec<RunRow> = sqlx::query_as(
            r#"
            SELECT id, tenant_id, run_date, period_start, entries_created,
                   assets_considered, assets_skipped, status, error_summary
            FROM depreciation_runs
            WHERE tenant_id = $1
            ORDER BY run_date DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_runs", e))?;

        rows.into_iter().map(RunLog::try_from).collect()
    }
}
