use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use assetbook_core::{AssetId, ExpectedVersion, Period, TenantId, TenantScoped};
use assetbook_depreciation::{Asset, AssetEvent, DepreciationEntry, RunLog};

use super::r#trait::{AssetLedgerStore, RecordOutcome, RunLogStore, StoreError};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct AssetKey {
    tenant_id: TenantId,
    asset_id: AssetId,
}

#[derive(Debug, Default)]
struct Ledger {
    assets: HashMap<AssetKey, Asset>,
    entries: HashMap<AssetKey, BTreeMap<Period, DepreciationEntry>>,
    events: HashMap<AssetKey, Vec<AssetEvent>>,
    runs: Vec<RunLog>,
}

/// In-memory asset ledger for tests/dev.
///
/// All state sits behind one lock, so every mutation (entry insert + asset
/// update, status update + event append) is atomic with respect to other
/// callers.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    inner: RwLock<Ledger>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Ledger>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Ledger>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    /// Total number of entries held for a tenant.
    pub fn entry_count(&self, tenant_id: TenantId) -> usize {
        self.read()
            .map(|l| {
                l.entries
                    .iter()
                    .filter(|(k, _)| k.tenant_id == tenant_id)
                    .map(|(_, v)| v.len())
                    .sum()
            })
            .unwrap_or(0)
    }
}

#[async_trait]
impl AssetLedgerStore for InMemoryLedgerStore {
    async fn list_eligible_assets(&self, tenant_id: TenantId) -> Result<Vec<Asset>, StoreError> {
        let ledger = self.read()?;
        let mut assets: Vec<Asset> = ledger
            .assets
            .values()
            .filter(|a| a.tenant_id == tenant_id && a.is_eligible_for_runs())
            .cloned()
            .collect();
        assets.sort_by_key(|a| a.id);
        Ok(assets)
    }

    async fn get_asset(&self, tenant_id: TenantId, asset_id: AssetId) -> Result<Option<Asset>, StoreError> {
        let ledger = self.read()?;
        Ok(ledger.assets.get(&AssetKey { tenant_id, asset_id }).cloned())
    }

    async fn insert_asset(&self, asset: Asset) -> Result<(), StoreError> {
        let mut ledger = self.write()?;
        let key = AssetKey {
            tenant_id: asset.tenant_id,
            asset_id: asset.id,
        };
        if ledger.assets.contains_key(&key) {
            return Err(StoreError::Conflict(format!("asset {} already exists", asset.id)));
        }
        ledger.assets.insert(key, asset);
        Ok(())
    }

    async fn record_depreciation(
        &self,
        entry: DepreciationEntry,
        expected_version: ExpectedVersion,
    ) -> Result<RecordOutcome, StoreError> {
        let mut ledger = self.write()?;
        let key = AssetKey {
            tenant_id: entry.tenant_id,
            asset_id: entry.asset_id,
        };

        let already = ledger
            .entries
            .get(&key)
            .is_some_and(|by_period| by_period.contains_key(&entry.period_start));
        if already {
            return Ok(RecordOutcome::AlreadyApplied);
        }

        let asset = ledger
            .assets
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound(format!("asset {}", entry.asset_id)))?;
        if !asset.belongs_to(entry.tenant_id) {
            return Err(StoreError::TenantIsolation(format!(
                "entry for asset {} targets another tenant",
                entry.asset_id
            )));
        }
        if !expected_version.matches(asset.version) {
            return Err(StoreError::Conflict(format!(
                "asset {} expected {expected_version:?}, found {}",
                asset.id, asset.version
            )));
        }

        asset.apply_depreciation(&entry.as_step());
        asset.version += 1;

        ledger
            .entries
            .entry(key)
            .or_default()
            .insert(entry.period_start, entry);
        Ok(RecordOutcome::Applied)
    }

    async fn list_entries(
        &self,
        tenant_id: TenantId,
        asset_id: AssetId,
    ) -> Result<Vec<DepreciationEntry>, StoreError> {
        let ledger = self.read()?;
        Ok(ledger
            .entries
            .get(&AssetKey { tenant_id, asset_id })
            .map(|by_period| by_period.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn record_status_change(
        &self,
        event: AssetEvent,
        expected_version: ExpectedVersion,
    ) -> Result<(), StoreError> {
        let mut ledger = self.write()?;
        let key = AssetKey {
            tenant_id: event.tenant_id,
            asset_id: event.asset_id,
        };

        let asset = ledger
            .assets
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound(format!("asset {}", event.asset_id)))?;
        if !expected_version.matches(asset.version) || asset.status != event.from_status {
            return Err(StoreError::Conflict(format!(
                "asset {} changed since it was read (version {}, status {})",
                asset.id, asset.version, asset.status
            )));
        }

        asset.status = event.to_status;
        asset.version += 1;
        ledger.events.entry(key).or_default().push(event);
        Ok(())
    }

    async fn list_events(&self, tenant_id: TenantId, asset_id: AssetId) -> Result<Vec<AssetEvent>, StoreError> {
        let ledger = self.read()?;
        Ok(ledger
            .events
            .get(&AssetKey { tenant_id, asset_id })
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl RunLogStore for InMemoryLedgerStore {
    async fn append_run_log(&self, log: RunLog) -> Result<(), StoreError> {
        let mut ledger = self.write()?;
        if ledger.runs.iter().any(|r| r.id == log.id) {
            return Err(StoreError::Conflict(format!("run {} already logged", log.id)));
        }
        ledger.runs.push(log);
        Ok(())
    }

    async fn list_runs(&self, tenant_id: TenantId, limit: usize) -> Result<Vec<RunLog>, StoreError> {
        let ledger = self.read()?;
        let mut runs: Vec<RunLog> = ledger
            .runs
            .iter()
            .filter(|r| r.tenant_id == tenant_id)
            .cloned()
            .collect();
        runs.sort_by(|a, b| b.run_date.cmp(&a.run_date).then(b.id.cmp(&a.id)));
        runs.truncate(limit);
        Ok(runs)
    }
}
