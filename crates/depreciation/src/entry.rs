use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use assetbook_core::{AssetId, Entity, EntryId, Money, Period, RunId, TenantId, TenantScoped};

use crate::asset::Asset;
use crate::calculator::PeriodDepreciation;

/// One committed period of depreciation for one asset (immutable).
///
/// At most one entry exists per `(asset_id, period_start)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepreciationEntry {
    pub id: EntryId,
    pub tenant_id: TenantId,
    pub asset_id: AssetId,
    pub run_id: RunId,
    pub period_start: Period,
    pub depreciation_amount: Money,
    pub accumulated_depreciation: Money,
    pub book_value: Money,
    pub created_at: DateTime<Utc>,
}

impl DepreciationEntry {
    pub fn new(asset: &Asset, step: &PeriodDepreciation, run_id: RunId, created_at: DateTime<Utc>) -> Self {
        Self {
            id: EntryId::new(),
            tenant_id: asset.tenant_id,
            asset_id: asset.id,
            run_id,
            period_start: step.period,
            depreciation_amount: step.depreciation_amount,
            accumulated_depreciation: step.accumulated_depreciation,
            book_value: step.book_value,
            created_at,
        }
    }

    /// The period result this entry materializes.
    pub fn as_step(&self) -> PeriodDepreciation {
        PeriodDepreciation {
            period: self.period_start,
            depreciation_amount: self.depreciation_amount,
            accumulated_depreciation: self.accumulated_depreciation,
            book_value: self.book_value,
        }
    }
}

impl Entity for DepreciationEntry {
    type Id = EntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl TenantScoped for DepreciationEntry {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Dry-run projection line (what an entry would look like).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewLine {
    pub asset_id: AssetId,
    pub period_start: Period,
    pub depreciation_amount: Money,
    pub accumulated_depreciation: Money,
    pub book_value: Money,
}

impl PreviewLine {
    pub fn new(asset_id: AssetId, step: &PeriodDepreciation) -> Self {
        Self {
            asset_id,
            period_start: step.period,
            depreciation_amount: step.depreciation_amount,
            accumulated_depreciation: step.accumulated_depreciation,
            book_value: step.book_value,
        }
    }
}
