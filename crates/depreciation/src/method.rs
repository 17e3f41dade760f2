//! Depreciation method strategies.
//!
//! A method only decides the nominal amount for one period. Eligibility,
//! clamping at salvage value and book value derivation live in the calculator,
//! so every method gets them for free.

use assetbook_core::Money;

use crate::asset::{Asset, DepreciationMethodKind};
use crate::calculator::CalcError;

pub trait DepreciationMethod: Send + Sync {
    fn kind(&self) -> DepreciationMethodKind;

    /// Nominal (unclamped) depreciation for the next period, at ledger precision.
    fn monthly_amount(&self, asset: &Asset) -> Result<Money, CalcError>;
}

/// `(cost - salvage_value) / useful_life_months`, rounded half-up to cents.
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightLine;

impl DepreciationMethod for StraightLine {
    fn kind(&self) -> DepreciationMethodKind {
        DepreciationMethodKind::StraightLine
    }

    fn monthly_amount(&self, asset: &Asset) -> Result<Money, CalcError> {
        asset
            .depreciable_base()
            .divided_by(asset.useful_life_months)
            .ok_or(CalcError::Arithmetic("useful_life_months is zero"))
    }
}

/// Strategy registered for a method kind.
pub fn method_for(kind: DepreciationMethodKind) -> &'static dyn DepreciationMethod {
    match kind {
        DepreciationMethodKind::StraightLine => &StraightLine,
    }
}
