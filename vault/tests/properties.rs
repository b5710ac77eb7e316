//! Property-based tests for the plan invariants.
//!
//! 1. Every stored plan has `principal_amount > 0` and
//!    `maturity_date == start_time + duration_nanos`.
//! 2. `is_active` only ever goes from `true` to `false`.
//! 3. Only the owner can withdraw.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

use saving_vault::config::NANOS_PER_DAY;
use saving_vault::{
    CreatePlanInput, LedgerStore, ManualClock, MemoryLedger, PlanType, Principal,
    SavingsErrorKind, VaultEngine,
};

const T0: u64 = 1_700_000_000_000_000_000;
const OWNERS: [&str; 3] = ["alice", "bob", "carol"];

#[derive(Clone, Debug)]
enum Op {
    Create {
        owner: usize,
        fixed: bool,
        amount: u64,
        days: u64,
    },
    Withdraw {
        caller: usize,
        plan: usize,
    },
    Advance {
        days: u64,
    },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..OWNERS.len(), any::<bool>(), 0u64..1_000_000, 0u64..400).prop_map(
            |(owner, fixed, amount, days)| Op::Create {
                owner,
                fixed,
                amount,
                days
            }
        ),
        (0..OWNERS.len(), 0usize..16).prop_map(|(caller, plan)| Op::Withdraw { caller, plan }),
        (0u64..120).prop_map(|days| Op::Advance { days }),
    ]
}

proptest! {
    #[test]
    fn prop_created_plans_satisfy_invariants(
        fixed in any::<bool>(),
        amount in 1u64..=u64::MAX / 2,
        days in 1u64..=10_000,
    ) {
        let engine = VaultEngine::with_clock(MemoryLedger::new(), ManualClock::new(T0));
        let input = CreatePlanInput {
            plan_type: if fixed { PlanType::Fixed } else { PlanType::Flexible },
            amount,
            duration_days: days,
        };
        let plan = engine.create_savings_plan(&Principal::new("alice"), input).unwrap();

        prop_assert!(plan.principal_amount > 0);
        prop_assert_eq!(plan.maturity_date, plan.start_time + plan.duration_nanos);
        prop_assert_eq!(plan.duration_nanos, days * NANOS_PER_DAY);
        prop_assert!(plan.is_active);
    }

    #[test]
    fn prop_is_active_is_monotonic_and_owner_only(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let clock = Arc::new(ManualClock::new(T0));
        let engine = VaultEngine::with_clock(MemoryLedger::new(), Arc::clone(&clock));
        let mut ids: Vec<String> = Vec::new();
        let mut closed: HashMap<String, bool> = HashMap::new();

        for op in ops {
            match op {
                Op::Create { owner, fixed, amount, days } => {
                    let input = CreatePlanInput {
                        plan_type: if fixed { PlanType::Fixed } else { PlanType::Flexible },
                        amount,
                        duration_days: days,
                    };
                    if let Ok(plan) = engine.create_savings_plan(&Principal::new(OWNERS[owner]), input) {
                        prop_assert!(!ids.contains(&plan.id));
                        ids.push(plan.id);
                    }
                }
                Op::Withdraw { caller, plan } => {
                    if ids.is_empty() {
                        continue;
                    }
                    let id = &ids[plan % ids.len()];
                    let before = engine.store().get(id).unwrap().unwrap();
                    let caller = Principal::new(OWNERS[caller]);
                    let result = engine.withdraw_from_plan(&caller, id);

                    if before.owner != caller {
                        prop_assert_eq!(result.unwrap_err().kind(), SavingsErrorKind::UnauthorizedAccess);
                    } else if result.is_ok() {
                        prop_assert!(before.is_active);
                        closed.insert(id.clone(), true);
                    }
                }
                Op::Advance { days } => clock.advance(days * NANOS_PER_DAY),
            }

            // Once closed, a plan never comes back.
            for id in closed.keys() {
                prop_assert!(!engine.store().get(id).unwrap().unwrap().is_active);
            }
        }
    }
}
