//! Single-period depreciation calculator.
//!
//! `calculate` is a pure function of an asset snapshot and a target period.
//! It never touches storage; the orchestrator decides what to do with the
//! result.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use assetbook_core::{DomainError, Money, Period};

use crate::asset::Asset;
use crate::method::method_for;
use crate::status::AssetStatus;

/// Outcome of one period's depreciation for one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodDepreciation {
    pub period: Period,
    pub depreciation_amount: Money,
    /// Accumulated depreciation after this period.
    pub accumulated_depreciation: Money,
    /// Book value after this period.
    pub book_value: Money,
}

/// Why an asset does not depreciate in a given period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    BeforePurchase,
    Disposed,
    Deleted,
    FullyDepreciated,
    /// `period` is at or before `last_depreciated_period`. Catch-up runs for
    /// an earlier month that never got an entry land here too; the schedule
    /// only moves forward.
    AlreadyRecorded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Calculation {
    Applicable(PeriodDepreciation),
    NotApplicable(SkipReason),
}

impl Calculation {
    pub fn applicable(self) -> Option<PeriodDepreciation> {
        match self {
            Calculation::Applicable(p) => Some(p),
            Calculation::NotApplicable(_) => None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CalcError {
    #[error("asset fails invariants: {0}")]
    InvalidAsset(#[from] DomainError),

    #[error("arithmetic error: {0}")]
    Arithmetic(&'static str),
}

/// Compute `asset`'s depreciation for `period`.
///
/// Checks run in this order: asset invariants, deleted, disposed, before
/// purchase month, period already recorded, fully depreciated.
pub fn calculate(asset: &Asset, period: Period) -> Result<Calculation, CalcError> {
    asset.validate()?;

    if asset.is_deleted {
        return Ok(Calculation::NotApplicable(SkipReason::Deleted));
    }
    if asset.status == AssetStatus::Disposed {
        return Ok(Calculation::NotApplicable(SkipReason::Disposed));
    }
    if period < Period::containing(asset.purchase_date) {
        return Ok(Calculation::NotApplicable(SkipReason::BeforePurchase));
    }
    if asset.last_depreciated_period.is_some_and(|last| period <= last) {
        return Ok(Calculation::NotApplicable(SkipReason::AlreadyRecorded));
    }

    let base = asset.depreciable_base();
    if asset.accumulated_depreciation >= base {
        return Ok(Calculation::NotApplicable(SkipReason::FullyDepreciated));
    }

    let mut nominal = method_for(asset.depreciation_method).monthly_amount(asset)?;
    if nominal.is_zero() {
        // Bases smaller than half a cent per month still need to reach salvage.
        nominal = Money::from_minor(1);
    }

    let accumulated = (asset.accumulated_depreciation + nominal).min(base);
    let amount = accumulated - asset.accumulated_depreciation;
    let book_value = asset.cost - accumulated;

    Ok(Calculation::Applicable(PeriodDepreciation {
        period,
        depreciation_amount: amount,
        accumulated_depreciation: accumulated,
        book_value,
    }))
}

/// Remaining schedule for `asset`, one entry per month starting at `from`
/// (or the purchase month, whichever is later), until the asset is fully
/// depreciated or `max_periods` entries were produced.
pub fn project_schedule(
    asset: &Asset,
    from: Period,
    max_periods: usize,
) -> Result<Vec<PeriodDepreciation>, CalcError> {
    let mut snapshot = asset.clone();
    let mut period = from.max(Period::containing(asset.purchase_date));
    let mut schedule = Vec::new();

    while schedule.len() < max_periods {
        match calculate(&snapshot, period)? {
            Calculation::Applicable(step) => {
                snapshot.apply_depreciation(&step);
                schedule.push(step);
            }
            Calculation::NotApplicable(SkipReason::AlreadyRecorded) => {}
            Calculation::NotApplicable(_) => break,
        }
        let next = period.next();
        if next == period {
            break;
        }
        period = next;
    }

    Ok(schedule)
}
