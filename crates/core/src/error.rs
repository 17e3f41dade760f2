//! Domain error model.

use thiserror::Error;

/// Domain-level error.
///
/// Deterministic business failures only (bad input, broken invariants).
/// Stale versions, missing rows and other storage and transport failures are modelled by the infra layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. a period that is not a first-of-month).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated (e.g. salvage value above cost).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
