use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use assetbook_core::{AssetId, DomainError, Entity, Money, Period, TenantId, TenantScoped};

use crate::calculator::PeriodDepreciation;
use crate::status::AssetStatus;

/// Depreciation method configured on an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepreciationMethodKind {
    StraightLine,
}

impl DepreciationMethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepreciationMethodKind::StraightLine => "straight_line",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "straight_line" => Ok(DepreciationMethodKind::StraightLine),
            other => Err(DomainError::validation(format!(
                "unknown depreciation method '{other}'"
            ))),
        }
    }
}

/// The depreciation-relevant view of a tracked asset.
///
/// `accumulated_depreciation`, `book_value` and `last_depreciated_period` are
/// written only by the run orchestrator; `status` only by the status recorder.
/// `version` is bumped by the store on every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub tenant_id: TenantId,
    pub name: String,
    pub cost: Money,
    pub purchase_date: NaiveDate,
    pub useful_life_months: u32,
    pub salvage_value: Money,
    pub depreciation_method: DepreciationMethodKind,
    pub accumulated_depreciation: Money,
    pub book_value: Money,
    pub status: AssetStatus,
    pub is_deleted: bool,
    /// Latest period that already has a depreciation entry.
    pub last_depreciated_period: Option<Period>,
    pub version: u64,
}

impl Asset {
    /// A freshly acquired, not yet depreciated asset.
    pub fn new(
        tenant_id: TenantId,
        name: impl Into<String>,
        cost: Money,
        salvage_value: Money,
        purchase_date: NaiveDate,
        useful_life_months: u32,
    ) -> Result<Self, DomainError> {
        let asset = Self {
            id: AssetId::new(),
            tenant_id,
            name: name.into(),
            cost,
            purchase_date,
            useful_life_months,
            salvage_value,
            depreciation_method: DepreciationMethodKind::StraightLine,
            accumulated_depreciation: Money::ZERO,
            book_value: cost,
            status: AssetStatus::Available,
            is_deleted: false,
            last_depreciated_period: None,
            version: 0,
        };
        asset.validate()?;
        Ok(asset)
    }

    /// Total amount that may ever be depreciated (`cost - salvage_value`).
    pub fn depreciable_base(&self) -> Money {
        self.cost - self.salvage_value
    }

    pub fn is_fully_depreciated(&self) -> bool {
        self.accumulated_depreciation >= self.depreciable_base()
    }

    /// Assets the orchestrator should even look at.
    pub fn is_eligible_for_runs(&self) -> bool {
        !self.is_deleted && !self.status.is_terminal()
    }

    /// Check the field invariants the calculator relies on.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.useful_life_months == 0 {
            return Err(DomainError::invariant("useful_life_months must be greater than zero"));
        }
        if self.cost.is_negative() {
            return Err(DomainError::invariant("cost cannot be negative"));
        }
        if self.salvage_value.is_negative() {
            return Err(DomainError::invariant("salvage_value cannot be negative"));
        }
        if self.salvage_value >= self.cost {
            return Err(DomainError::invariant("salvage_value must be less than cost"));
        }
        if self.accumulated_depreciation.is_negative()
            || self.accumulated_depreciation > self.depreciable_base()
        {
            return Err(DomainError::invariant(
                "accumulated_depreciation must lie within [0, cost - salvage_value]",
            ));
        }
        if self.book_value != self.cost - self.accumulated_depreciation {
            return Err(DomainError::invariant(
                "book_value must equal cost - accumulated_depreciation",
            ));
        }
        Ok(())
    }

    /// Fold one period's result into this snapshot.
    pub fn apply_depreciation(&mut self, period: &PeriodDepreciation) {
        self.accumulated_depreciation = period.accumulated_depreciation;
        self.book_value = period.book_value;
        self.last_depreciated_period = Some(period.period);
    }
}

impl Entity for Asset {
    type Id = AssetId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl TenantScoped for Asset {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
