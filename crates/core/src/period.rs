//! Monthly accounting periods.

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_object::ValueObject;

/// A one-month accounting window, identified by its first day.
///
/// The constructor rejects any date that is not a first-of-month; use
/// [`Period::containing`] to truncate an arbitrary date.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "NaiveDate", into = "NaiveDate")]
pub struct Period(NaiveDate);

impl ValueObject for Period {}

impl Period {
    /// Strict constructor: `start` must be the first day of a month.
    pub fn new(start: NaiveDate) -> Result<Self, DomainError> {
        if start.day() != 1 {
            return Err(DomainError::validation(format!(
                "period_start must be the first day of a month, got {start}"
            )));
        }
        Ok(Self(start))
    }

    /// The period a given date falls into.
    pub fn containing(date: NaiveDate) -> Self {
        // Day 1 exists in every month.
        Self(date.with_day(1).unwrap_or(date))
    }

    /// The period containing `now` (UTC).
    pub fn current(now: DateTime<Utc>) -> Self {
        Self::containing(now.date_naive())
    }

    pub fn from_ym(year: i32, month: u32) -> Result<Self, DomainError> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self)
            .ok_or_else(|| DomainError::validation(format!("invalid period {year}-{month:02}")))
    }

    pub fn start(&self) -> NaiveDate {
        self.0
    }

    /// The following period. Saturates at the last representable month.
    pub fn next(&self) -> Self {
        self.0.checked_add_months(Months::new(1)).map(Self).unwrap_or(*self)
    }

    /// The preceding period. Saturates at the first representable month.
    pub fn prev(&self) -> Self {
        self.0.checked_sub_months(Months::new(1)).map(Self).unwrap_or(*self)
    }
}

impl TryFrom<NaiveDate> for Period {
    type Error = DomainError;

    fn try_from(value: NaiveDate) -> Result<Self, Self::Error> {
        Period::new(value)
    }
}

impl From<Period> for NaiveDate {
    fn from(value: Period) -> Self {
        value.0
    }
}

impl core::fmt::Display for Period {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}
