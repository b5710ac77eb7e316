//! # Interest Math
//!
//! Rates are in basis points against [`BPS_DENOMINATOR`], time is in
//! nanoseconds, and accrual is simple (non-compounding) interest:
//!
//! ```text
//! interest = principal * rate_bps * elapsed_nanos / (NANOS_PER_YEAR * 10_000)
//! ```
//!
//! `principal * rate_bps` alone can exceed `u64`, and multiplying by elapsed
//! nanoseconds gets there fast, so the numerator is built in `u128` with
//! checked multiplication. Division floors. Anything that doesn't fit back in
//! `u64` is an [`SavingsError::ArithmeticOverflow`], never a silent wrap.

use crate::config::{
    BPS_DENOMINATOR, FIXED_BASE_RATE_BPS, FIXED_RATE_PER_DAY_BPS, FLEXIBLE_RATE_BPS,
    NANOS_PER_DAY, NANOS_PER_YEAR,
};
use crate::error::{SavingsError, SavingsResult};
use crate::types::{PlanType, SavingsPlan};

/// Annual rate for a new plan.
///
/// Fixed plans earn `500 + 100 * days`; Flexible plans earn a flat 300 and
/// ignore the duration.
pub fn interest_rate_bps(plan_type: PlanType, duration_days: u64) -> SavingsResult<u64> {
    match plan_type {
        PlanType::Fixed => duration_days
            .checked_mul(FIXED_RATE_PER_DAY_BPS)
            .and_then(|bonus| bonus.checked_add(FIXED_BASE_RATE_BPS))
            .ok_or_else(|| SavingsError::overflow("interest rate")),
        PlanType::Flexible => Ok(FLEXIBLE_RATE_BPS),
    }
}

/// Converts a lock duration in days to nanoseconds.
pub fn days_to_nanos(days: u64) -> SavingsResult<u64> {
    days.checked_mul(NANOS_PER_DAY)
        .ok_or_else(|| SavingsError::overflow("plan duration"))
}

/// Simple interest on `principal` at `rate_bps` over `elapsed_nanos`.
pub fn accrued_interest(principal: u64, rate_bps: u64, elapsed_nanos: u64) -> SavingsResult<u64> {
    let numerator = (principal as u128)
        .checked_mul(rate_bps as u128)
        .and_then(|n| n.checked_mul(elapsed_nanos as u128))
        .ok_or_else(|| SavingsError::overflow("interest numerator"))?;
    let denominator = NANOS_PER_YEAR as u128 * BPS_DENOMINATOR as u128;

    u64::try_from(numerator / denominator).map_err(|_| SavingsError::overflow("interest"))
}

/// Interest a plan has earned as of `now`.
///
/// A clock reading earlier than the plan's start accrues nothing.
pub fn calculate_interest(plan: &SavingsPlan, now: u64) -> SavingsResult<u64> {
    let elapsed = now.saturating_sub(plan.start_time);
    accrued_interest(plan.principal_amount, plan.interest_rate_bps, elapsed)
}

/// Principal plus interest, checked.
pub fn payout(principal: u64, interest: u64) -> SavingsResult<u64> {
    principal
        .checked_add(interest)
        .ok_or_else(|| SavingsError::overflow("payout"))
}

/// What an early exit would pay: principal plus half the interest.
pub fn penalized_payout(principal: u64, interest: u64) -> SavingsResult<u64> {
    payout(principal, interest / 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SavingsErrorKind;
    use crate::types::Principal;

    fn plan(principal: u64, rate: u64, start: u64) -> SavingsPlan {
        SavingsPlan {
            id: "PLAN-0".into(),
            owner: Principal::new("alice"),
            plan_type: PlanType::Flexible,
            principal_amount: principal,
            interest_rate_bps: rate,
            start_time: start,
            duration_nanos: 0,
            maturity_date: start,
            is_active: true,
        }
    }

    #[test]
    fn fixed_rate_grows_with_duration() {
        assert_eq!(interest_rate_bps(PlanType::Fixed, 1).unwrap(), 600);
        assert_eq!(interest_rate_bps(PlanType::Fixed, 30).unwrap(), 3_500);
    }

    #[test]
    fn flexible_rate_ignores_duration() {
        assert_eq!(interest_rate_bps(PlanType::Flexible, 0).unwrap(), 300);
        assert_eq!(interest_rate_bps(PlanType::Flexible, 10_000).unwrap(), 300);
        assert_eq!(interest_rate_bps(PlanType::Flexible, u64::MAX).unwrap(), 300);
    }

    #[test]
    fn fixed_rate_overflow_is_an_error() {
        let err = interest_rate_bps(PlanType::Fixed, u64::MAX).unwrap_err();
        assert_eq!(err.kind(), SavingsErrorKind::ArithmeticOverflow);
    }

    #[test]
    fn days_convert_to_nanos() {
        assert_eq!(days_to_nanos(0).unwrap(), 0);
        assert_eq!(days_to_nanos(30).unwrap(), 30 * 86_400 * 1_000_000_000);
    }

    #[test]
    fn huge_duration_overflows() {
        // u64::MAX nanos is roughly 213_503 days.
        assert!(days_to_nanos(213_503).is_ok());
        let err = days_to_nanos(213_504).unwrap_err();
        assert_eq!(err.kind(), SavingsErrorKind::ArithmeticOverflow);
    }

    #[test]
    fn one_year_flexible_interest_is_exact() {
        // 100_000 * 300 * Y / (Y * 10_000) = 3_000
        let p = plan(100_000, 300, 0);
        assert_eq!(calculate_interest(&p, NANOS_PER_YEAR).unwrap(), 3_000);
    }

    #[test]
    fn interest_floors() {
        // 1 * 300 * Y / (Y * 10_000) = 0.03 -> 0
        assert_eq!(accrued_interest(1, 300, NANOS_PER_YEAR).unwrap(), 0);
        // 30 days of 1_000_000 at 3_500 bps = 28_767.12... -> 28_767
        assert_eq!(
            accrued_interest(1_000_000, 3_500, 30 * NANOS_PER_DAY).unwrap(),
            28_767
        );
    }

    #[test]
    fn clock_before_start_accrues_nothing() {
        let p = plan(1_000_000, 300, 1_000);
        assert_eq!(calculate_interest(&p, 10).unwrap(), 0);
    }

    #[test]
    fn large_magnitudes_stay_exact_in_u128() {
        // u64::MAX principal at 300 bps for one year: numerator overflows
        // u64 by a wide margin but the result is 3% of principal.
        let interest = accrued_interest(u64::MAX, 300, NANOS_PER_YEAR).unwrap();
        assert_eq!(interest, (u64::MAX as u128 * 300 / 10_000) as u64);
    }

    #[test]
    fn interest_beyond_u64_is_an_error() {
        let err = accrued_interest(u64::MAX, u64::MAX, NANOS_PER_YEAR).unwrap_err();
        assert_eq!(err.kind(), SavingsErrorKind::ArithmeticOverflow);
    }

    #[test]
    fn penalty_halves_interest() {
        assert_eq!(penalized_payout(1_000, 101).unwrap(), 1_050);
        assert_eq!(payout(1_000, 101).unwrap(), 1_101);
        assert!(payout(u64::MAX, 1).is_err());
    }
}
