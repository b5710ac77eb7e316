//! In-memory ledger.
//!
//! A `BTreeMap` behind a `parking_lot::RwLock`. Enumeration is in key order,
//! which for generated ids (`PLAN-<nanos>`) is also creation order as long
//! as timestamps share a digit count.

use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::{LedgerStore, PlanIter, StoreResult};
use crate::types::SavingsPlan;

#[derive(Debug, Default)]
pub struct MemoryLedger {
    plans: RwLock<BTreeMap<String, SavingsPlan>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.plans.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.read().is_empty()
    }
}

impl LedgerStore for MemoryLedger {
    fn get(&self, id: &str) -> StoreResult<Option<SavingsPlan>> {
        Ok(self.plans.read().get(id).cloned())
    }

    fn insert(&self, id: &str, plan: &SavingsPlan) -> StoreResult<Option<SavingsPlan>> {
        Ok(self.plans.write().insert(id.to_string(), plan.clone()))
    }

    fn entries(&self) -> PlanIter<'_> {
        // Snapshot under the read lock so the iterator doesn't hold it.
        let snapshot: Vec<_> = self
            .plans
            .read()
            .iter()
            .map(|(id, plan)| Ok((id.clone(), plan.clone())))
            .collect();
        Box::new(snapshot.into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PlanType, Principal};

    fn plan(id: &str, owner: &str) -> SavingsPlan {
        SavingsPlan {
            id: id.into(),
            owner: Principal::new(owner),
            plan_type: PlanType::Flexible,
            principal_amount: 10,
            interest_rate_bps: 300,
            start_time: 0,
            duration_nanos: 0,
            maturity_date: 0,
            is_active: true,
        }
    }

    #[test]
    fn get_missing_is_none() {
        let ledger = MemoryLedger::new();
        assert!(ledger.get("PLAN-1").unwrap().is_none());
        assert!(!ledger.contains("PLAN-1").unwrap());
        assert!(ledger.is_empty());
    }

    #[test]
    fn insert_returns_previous_value() {
        let ledger = MemoryLedger::new();
        let first = plan("PLAN-1", "alice");
        assert!(ledger.insert("PLAN-1", &first).unwrap().is_none());

        let closed = first.closed();
        let previous = ledger.insert("PLAN-1", &closed).unwrap();
        assert_eq!(previous, Some(first));
        assert_eq!(ledger.get("PLAN-1").unwrap(), Some(closed));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn entries_enumerate_in_key_order_and_restart() {
        let ledger = MemoryLedger::new();
        ledger.insert("PLAN-2", &plan("PLAN-2", "bob")).unwrap();
        ledger.insert("PLAN-1", &plan("PLAN-1", "alice")).unwrap();

        let ids: Vec<String> = ledger.entries().map(|e| e.unwrap().0).collect();
        assert_eq!(ids, vec!["PLAN-1", "PLAN-2"]);

        // A second scan sees the same contents.
        assert_eq!(ledger.entries().count(), 2);
    }
}
