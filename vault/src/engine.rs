//! # Vault Engine
//!
//! Owns the plan lifecycle rules. The engine itself is stateless between
//! calls: everything it knows comes out of the [`LedgerStore`] at the start
//! of a call and goes back in at the end.
//!
//! ## State Machine
//!
//! ```text
//!   create_savings_plan
//!          │
//!    ┌─────▼─────┐  withdraw (Flexible, or Fixed at/after maturity)  ┌──────────┐
//!    │  Active   │ ─────────────────────────────────────────────────► │  Closed  │
//!    └─────┬─────┘                                                    └──────────┘
//!          │ withdraw (Fixed, before maturity)
//!          ▼
//!    WithdrawalBeforeMaturity: plan untouched, still Active
//! ```
//!
//! `Closed` is terminal. Closed plans stay in the ledger and show up in
//! listings, but every withdrawal attempt reports `PlanNotFound`.
//!
//! ## Concurrency
//!
//! Calls are assumed to run one at a time against a given ledger. The engine
//! takes no locks; the host serializes calls (the node keeps the engine
//! behind a mutex). Each mutating call validates everything first and then
//! performs one store write. If that write errors, a withdrawal writes the
//! active plan back before returning, so a failed call leaves no partial
//! update behind.

use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{MIN_FIXED_DURATION_DAYS, PLAN_ID_PREFIX};
use crate::error::{SavingsError, SavingsResult};
use crate::interest;
use crate::store::LedgerStore;
use crate::types::{CreatePlanInput, PlanType, Principal, SavingsPlan, WithdrawalQuote};

/// The savings-plan lifecycle engine.
#[derive(Debug)]
pub struct VaultEngine<S, C = SystemClock> {
    store: S,
    clock: C,
}

impl<S: LedgerStore> VaultEngine<S, SystemClock> {
    /// Engine over `store`, reading time from the system clock.
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: LedgerStore, C: Clock> VaultEngine<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // -- Creation -----------------------------------------------------------

    /// Opens a new plan owned by `caller`.
    ///
    /// # Errors
    ///
    /// - [`SavingsError::InvalidAmount`] if `input.amount == 0`.
    /// - [`SavingsError::InvalidPlanDuration`] if a Fixed plan asks for less
    ///   than one day.
    /// - [`SavingsError::ArithmeticOverflow`] if the duration, rate, or
    ///   maturity date does not fit in 64 bits.
    pub fn create_savings_plan(
        &self,
        caller: &Principal,
        input: CreatePlanInput,
    ) -> SavingsResult<SavingsPlan> {
        if input.amount == 0 {
            return Err(SavingsError::invalid_amount());
        }
        if input.plan_type == PlanType::Fixed && input.duration_days < MIN_FIXED_DURATION_DAYS {
            return Err(SavingsError::invalid_plan_duration());
        }

        let interest_rate_bps = interest::interest_rate_bps(input.plan_type, input.duration_days)?;
        let duration_nanos = interest::days_to_nanos(input.duration_days)?;
        let start_time = self.clock.now_nanos();
        let maturity_date = start_time
            .checked_add(duration_nanos)
            .ok_or_else(|| SavingsError::overflow("maturity date"))?;
        let id = self.next_plan_id(start_time)?;

        let plan = SavingsPlan {
            id,
            owner: caller.clone(),
            plan_type: input.plan_type,
            principal_amount: input.amount,
            interest_rate_bps,
            start_time,
            duration_nanos,
            maturity_date,
            is_active: true,
        };
        self.store.insert(&plan.id, &plan)?;

        info!(
            plan_id = %plan.id,
            owner = %caller,
            plan_type = %plan.plan_type,
            amount = plan.principal_amount,
            rate_bps = plan.interest_rate_bps,
            maturity = plan.maturity_date,
            "savings plan created"
        );
        Ok(plan)
    }

    /// `PLAN-<now>`, or `PLAN-<now>-<n>` for the first free `n` if another
    /// plan was opened in the same nanosecond.
    fn next_plan_id(&self, now: u64) -> SavingsResult<String> {
        let base = format!("{PLAN_ID_PREFIX}{now}");
        if !self.store.contains(&base)? {
            return Ok(base);
        }
        let mut suffix: u64 = 1;
        loop {
            let candidate = format!("{base}-{suffix}");
            if !self.store.contains(&candidate)? {
                return Ok(candidate);
            }
            suffix += 1;
        }
    }

    // -- Reads --------------------------------------------------------------

    /// Every plan `caller` has ever opened, closed ones included, in store
    /// enumeration order.
    pub fn get_user_plans(&self, caller: &Principal) -> SavingsResult<Vec<SavingsPlan>> {
        let mut plans = Vec::new();
        for entry in self.store.entries() {
            let (_, plan) = entry?;
            if plan.is_owned_by(caller) {
                plans.push(plan);
            }
        }
        debug!(owner = %caller, count = plans.len(), "listed savings plans");
        Ok(plans)
    }

    /// A single plan, owner only. Closed plans are returned as history.
    pub fn get_plan(&self, caller: &Principal, plan_id: &str) -> SavingsResult<SavingsPlan> {
        let plan = self
            .store
            .get(plan_id)?
            .ok_or_else(SavingsError::plan_not_found)?;
        if !plan.is_owned_by(caller) {
            return Err(SavingsError::unauthorized());
        }
        Ok(plan)
    }

    /// What [`withdraw_from_plan`](Self::withdraw_from_plan) would pay right
    /// now, without touching the ledger.
    pub fn quote_withdrawal(
        &self,
        caller: &Principal,
        plan_id: &str,
    ) -> SavingsResult<WithdrawalQuote> {
        let plan = self.load_withdrawable(caller, plan_id)?;
        let now = self.clock.now_nanos();
        let interest_earned = interest::calculate_interest(&plan, now)?;
        let payout = interest::payout(plan.principal_amount, interest_earned)?;
        let locked = plan.is_locked(now);
        let early_payout = if locked {
            Some(interest::penalized_payout(plan.principal_amount, interest_earned)?)
        } else {
            None
        };

        Ok(WithdrawalQuote {
            plan_id: plan.id,
            interest_earned,
            payout,
            matured: !locked,
            early_payout,
        })
    }

    // -- Withdrawal ---------------------------------------------------------

    /// Closes the plan and returns principal plus accrued interest.
    ///
    /// # Errors
    ///
    /// - [`SavingsError::PlanNotFound`] if the id is unknown or the plan is
    ///   already closed. The two cases share a kind; only the message
    ///   differs.
    /// - [`SavingsError::UnauthorizedAccess`] if `caller` is not the owner.
    /// - [`SavingsError::WithdrawalBeforeMaturity`] for a Fixed plan before
    ///   its maturity date. The plan stays active and unmodified.
    pub fn withdraw_from_plan(&self, caller: &Principal, plan_id: &str) -> SavingsResult<u64> {
        let plan = self.load_withdrawable(caller, plan_id)?;
        let now = self.clock.now_nanos();
        let interest_earned = interest::calculate_interest(&plan, now)?;

        if plan.is_locked(now) {
            // Early exit would pay half the interest, but it is not allowed:
            // the penalized amount is computed and dropped, nothing is written.
            let penalized = interest::penalized_payout(plan.principal_amount, interest_earned)?;
            warn!(
                plan_id = %plan.id,
                owner = %caller,
                now,
                maturity = plan.maturity_date,
                penalized_payout = penalized,
                "withdrawal rejected before maturity"
            );
            return Err(SavingsError::before_maturity());
        }

        let payout = interest::payout(plan.principal_amount, interest_earned)?;
        if let Err(e) = self.store.insert(&plan.id, &plan.closed()) {
            // The store may have applied the write before failing.
            if let Err(undo) = self.store.insert(&plan.id, &plan) {
                error!(plan_id = %plan.id, "failed to reopen plan after store error: {}", undo);
            }
            return Err(e.into());
        }

        info!(
            plan_id = %plan.id,
            owner = %caller,
            interest = interest_earned,
            payout,
            "savings plan withdrawn"
        );
        Ok(payout)
    }

    /// Lookup → ownership → activity, in that order.
    fn load_withdrawable(&self, caller: &Principal, plan_id: &str) -> SavingsResult<SavingsPlan> {
        let plan = self.get_plan(caller, plan_id)?;
        if !plan.is_active {
            return Err(SavingsError::plan_inactive());
        }
        Ok(plan)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
