//! # Vault Types
//!
//! The persisted [`SavingsPlan`] record and the request/response shapes that
//! flow through the engine. Everything here is plain data: the rules live in
//! [`crate::engine`].
//!
//! Field names serialize as camelCase for JSON clients (`principalAmount`,
//! `maturityDate`, ...). Bincode ignores names, so the on-disk layout is
//! unaffected.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Principal
// ---------------------------------------------------------------------------

/// Opaque identifier of an already-authenticated caller.
///
/// The engine never inspects it. The only thing you can do with two
/// principals is ask whether they are the same one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Principal {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// ---------------------------------------------------------------------------
// PlanType
// ---------------------------------------------------------------------------

/// The two savings products.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanType {
    /// Locked until maturity. Rate grows with the lock duration.
    Fixed,
    /// Withdraw any time. Flat rate.
    Flexible,
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanType::Fixed => write!(f, "Fixed"),
            PlanType::Flexible => write!(f, "Flexible"),
        }
    }
}

// ---------------------------------------------------------------------------
// SavingsPlan
// ---------------------------------------------------------------------------

/// A single savings commitment, as persisted in the ledger.
///
/// Every field except `is_active` is frozen at creation. `is_active` flips
/// from `true` to `false` exactly once, on a successful withdrawal, and the
/// record stays in the ledger afterwards as history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsPlan {
    /// Unique plan identifier (`PLAN-<start_time>[-n]`).
    pub id: String,
    /// The principal who opened the plan.
    pub owner: Principal,
    /// Fixed or Flexible.
    pub plan_type: PlanType,
    /// Deposited amount in the smallest currency unit. Always > 0.
    pub principal_amount: u64,
    /// Annual rate in basis points, fixed at creation.
    pub interest_rate_bps: u64,
    /// Creation time, nanoseconds since epoch.
    pub start_time: u64,
    /// Requested lock duration in nanoseconds.
    pub duration_nanos: u64,
    /// `start_time + duration_nanos`.
    pub maturity_date: u64,
    /// `true` until the plan is withdrawn.
    pub is_active: bool,
}

impl SavingsPlan {
    /// Returns `true` if `caller` opened this plan.
    pub fn is_owned_by(&self, caller: &Principal) -> bool {
        &self.owner == caller
    }

    /// Returns `true` once `now` has reached the maturity date.
    pub fn is_matured(&self, now: u64) -> bool {
        now >= self.maturity_date
    }

    /// Returns `true` if withdrawing at `now` would hit the early-exit rule.
    /// Only Fixed plans are ever locked.
    pub fn is_locked(&self, now: u64) -> bool {
        self.plan_type == PlanType::Fixed && !self.is_matured(now)
    }

    /// The same record with `is_active` cleared. Everything else is copied.
    pub fn closed(&self) -> Self {
        Self {
            is_active: false,
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Requests & Responses
// ---------------------------------------------------------------------------

/// Input to [`crate::VaultEngine::create_savings_plan`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanInput {
    pub plan_type: PlanType,
    pub amount: u64,
    /// Lock duration in days. Ignored by the Flexible rate rule but still
    /// recorded so the plan carries a maturity date.
    pub duration_days: u64,
}

impl CreatePlanInput {
    pub fn fixed(amount: u64, duration_days: u64) -> Self {
        Self {
            plan_type: PlanType::Fixed,
            amount,
            duration_days,
        }
    }

    pub fn flexible(amount: u64, duration_days: u64) -> Self {
        Self {
            plan_type: PlanType::Flexible,
            amount,
            duration_days,
        }
    }
}

/// Read-only preview of what a withdrawal would pay right now.
///
/// A quote authorizes nothing. `early_payout` is the penalized amount
/// (principal plus half the interest) an immature Fixed plan would pay if
/// early exit were allowed; the engine currently rejects early exit outright.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalQuote {
    pub plan_id: String,
    pub interest_earned: u64,
    /// Principal plus full interest.
    pub payout: u64,
    /// `false` only for Fixed plans before maturity.
    pub matured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub early_payout: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan(plan_type: PlanType) -> SavingsPlan {
        SavingsPlan {
            id: "PLAN-1".into(),
            owner: Principal::new("alice"),
            plan_type,
            principal_amount: 1_000,
            interest_rate_bps: 300,
            start_time: 100,
            duration_nanos: 50,
            maturity_date: 150,
            is_active: true,
        }
    }

    #[test]
    fn principal_equality_is_by_value() {
        assert_eq!(Principal::new("alice"), Principal::from("alice"));
        assert_ne!(Principal::new("alice"), Principal::new("bob"));
        assert_eq!(Principal::new("alice").to_string(), "alice");
    }

    #[test]
    fn fixed_plan_locked_until_maturity() {
        let plan = sample_plan(PlanType::Fixed);
        assert!(plan.is_locked(149));
        assert!(!plan.is_locked(150));
        assert!(plan.is_matured(150));
    }

    #[test]
    fn flexible_plan_never_locked() {
        let plan = sample_plan(PlanType::Flexible);
        assert!(!plan.is_locked(100));
        assert!(!plan.is_matured(100));
    }

    #[test]
    fn closed_only_touches_is_active() {
        let plan = sample_plan(PlanType::Fixed);
        let closed = plan.closed();
        assert!(!closed.is_active);
        assert_eq!(closed, SavingsPlan { is_active: false, ..plan });
    }

    #[test]
    fn plan_serializes_camel_case() {
        let json = serde_json::to_value(sample_plan(PlanType::Fixed)).unwrap();
        assert_eq!(json["principalAmount"], 1_000);
        assert_eq!(json["maturityDate"], 150);
        assert_eq!(json["owner"], "alice");
        assert_eq!(json["planType"], "Fixed");
        assert_eq!(json["isActive"], true);
    }

    #[test]
    fn create_input_deserializes_from_json() {
        let input: CreatePlanInput = serde_json::from_str(
            r#"{"planType":"Flexible","amount":100,"durationDays":0}"#,
        )
        .unwrap();
        assert_eq!(input, CreatePlanInput::flexible(100, 0));
    }
}
