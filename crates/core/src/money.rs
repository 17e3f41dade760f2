//! Fixed-point money at ledger precision.

use core::ops::{Add, Sub};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::value_object::ValueObject;

/// Number of decimal places the ledger keeps for every amount.
pub const CURRENCY_SCALE: u32 = 2;

/// Monetary amount in the tenant's ledger currency.
///
/// Every constructor rounds to [`CURRENCY_SCALE`] using round-half-up, so two
/// `Money` values are always directly comparable. Amounts handled by the
/// depreciation engine are non-negative; half-up and half-away-from-zero
/// coincide there.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Round `amount` to ledger precision.
    pub fn new(amount: Decimal) -> Self {
        Self(amount.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Build from an integer count of minor units (e.g. cents).
    pub fn from_minor(minor: i64) -> Self {
        Self(Decimal::new(minor, CURRENCY_SCALE))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Split this amount into `parts` equal shares, rounded to ledger precision.
    ///
    /// Returns `None` when `parts` is zero.
    pub fn divided_by(&self, parts: u32) -> Option<Money> {
        if parts == 0 {
            return None;
        }
        self.0.checked_div(Decimal::from(parts)).map(Money::new)
    }

    pub fn min(self, other: Money) -> Money {
        if self <= other { self } else { other }
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
