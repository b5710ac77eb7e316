//! Error types for the vault engine.
//!
//! Every engine operation that can fail returns a [`SavingsError`]. Each
//! variant carries a human-readable message; [`SavingsError::kind`] gives
//! transports a stable tag to switch on without parsing strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::store::StoreError;

/// Errors returned by [`crate::VaultEngine`] operations.
#[derive(Debug, Error)]
pub enum SavingsError {
    /// Deposit amount was zero.
    #[error("{0}")]
    InvalidAmount(String),

    /// A Fixed plan was requested with less than the minimum lock duration.
    #[error("{0}")]
    InvalidPlanDuration(String),

    /// No such plan, or the plan has already been withdrawn.
    #[error("{0}")]
    PlanNotFound(String),

    /// The caller does not own the plan.
    #[error("{0}")]
    UnauthorizedAccess(String),

    /// Fixed plan withdrawal attempted before maturity. Nothing was changed.
    #[error("{0}")]
    WithdrawalBeforeMaturity(String),

    /// Reserved for payout-funding failures. No engine path produces it yet.
    #[error("{0}")]
    InsufficientFunds(String),

    /// An amount, rate, or timestamp computation would not fit in 64 bits.
    #[error("arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    /// The ledger store failed underneath us.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

pub type SavingsResult<T> = Result<T, SavingsError>;

impl SavingsError {
    pub fn invalid_amount() -> Self {
        Self::InvalidAmount("Amount must be greater than 0".into())
    }

    pub fn invalid_plan_duration() -> Self {
        Self::InvalidPlanDuration("Fixed plans require minimum 1 day duration".into())
    }

    pub fn plan_not_found() -> Self {
        Self::PlanNotFound("Savings plan not found".into())
    }

    pub fn plan_inactive() -> Self {
        Self::PlanNotFound("Plan is no longer active".into())
    }

    pub fn unauthorized() -> Self {
        Self::UnauthorizedAccess("You are not the owner of this plan".into())
    }

    pub fn before_maturity() -> Self {
        Self::WithdrawalBeforeMaturity("Early withdrawal will incur penalties".into())
    }

    pub fn overflow(what: &str) -> Self {
        Self::ArithmeticOverflow(format!("{what} exceeds u64 range"))
    }

    /// The stable tag for this error.
    pub fn kind(&self) -> SavingsErrorKind {
        match self {
            SavingsError::InvalidAmount(_) => SavingsErrorKind::InvalidAmount,
            SavingsError::InvalidPlanDuration(_) => SavingsErrorKind::InvalidPlanDuration,
            SavingsError::PlanNotFound(_) => SavingsErrorKind::PlanNotFound,
            SavingsError::UnauthorizedAccess(_) => SavingsErrorKind::UnauthorizedAccess,
            SavingsError::WithdrawalBeforeMaturity(_) => {
                SavingsErrorKind::WithdrawalBeforeMaturity
            }
            SavingsError::InsufficientFunds(_) => SavingsErrorKind::InsufficientFunds,
            SavingsError::ArithmeticOverflow(_) => SavingsErrorKind::ArithmeticOverflow,
            SavingsError::Storage(_) => SavingsErrorKind::Storage,
        }
    }
}

/// Tag-only view of [`SavingsError`], serialized as the variant name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SavingsErrorKind {
    InvalidAmount,
    InvalidPlanDuration,
    PlanNotFound,
    UnauthorizedAccess,
    WithdrawalBeforeMaturity,
    InsufficientFunds,
    ArithmeticOverflow,
    Storage,
}

impl fmt::Display for SavingsErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_interface_wording() {
        assert_eq!(
            SavingsError::invalid_amount().to_string(),
            "Amount must be greater than 0"
        );
        assert_eq!(
            SavingsError::plan_inactive().to_string(),
            "Plan is no longer active"
        );
        assert_eq!(
            SavingsError::before_maturity().to_string(),
            "Early withdrawal will incur penalties"
        );
    }

    #[test]
    fn not_found_and_inactive_share_a_kind() {
        assert_eq!(SavingsError::plan_not_found().kind(), SavingsErrorKind::PlanNotFound);
        assert_eq!(SavingsError::plan_inactive().kind(), SavingsErrorKind::PlanNotFound);
    }

    #[test]
    fn storage_errors_convert() {
        let err: SavingsError = StoreError::Serialization("bad bytes".into()).into();
        assert_eq!(err.kind(), SavingsErrorKind::Storage);
        assert!(err.to_string().contains("bad bytes"));
    }

    #[test]
    fn kind_serializes_as_variant_name() {
        let json = serde_json::to_string(&SavingsErrorKind::WithdrawalBeforeMaturity).unwrap();
        assert_eq!(json, "\"WithdrawalBeforeMaturity\"");
        assert_eq!(SavingsErrorKind::UnauthorizedAccess.to_string(), "UnauthorizedAccess");
    }
}
