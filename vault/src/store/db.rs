//! # VaultDB: Persistent Ledger
//!
//! The durable [`LedgerStore`], built on sled's embedded key-value store.
//!
//! ## Tree Layout
//!
//! | Tree    | Key               | Value                |
//! |---------|-------------------|----------------------|
//! | `plans` | plan id (UTF-8)   | `bincode(SavingsPlan)` |
//!
//! sled iterates keys lexicographically, so [`LedgerStore::entries`] returns
//! plans in id order.
//!
//! ## Durability
//!
//! Every insert is followed by a flush. A withdrawal that returned a payout
//! must not come back active after a restart. If the flush fails, the tree
//! is put back the way it was before the error is returned.

use sled::{Db, IVec, Tree};
use std::path::Path;
use tracing::error;

use super::{LedgerStore, PlanIter, StoreError, StoreResult};
use crate::config::PLANS_TREE;
use crate::types::SavingsPlan;

/// sled-backed plan ledger.
///
/// Cheap to clone: sled handles are reference counted, and all clones see
/// the same data.
#[derive(Debug, Clone)]
pub struct VaultDB {
    /// The underlying sled database handle.
    db: Db,
    /// Plan records keyed by id.
    plans: Tree,
}

impl VaultDB {
    /// Open or create a database at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Create a temporary database that is removed when dropped.
    ///
    /// Used by unit tests; nothing to clean up on disk.
    pub fn open_temporary() -> StoreResult<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> StoreResult<Self> {
        let plans = db.open_tree(PLANS_TREE)?;
        Ok(Self { db, plans })
    }

    /// Number of plans stored, active or not.
    pub fn plan_count(&self) -> usize {
        self.plans.len()
    }

    /// Block until all pending writes are durable.
    pub fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl VaultDB {
    /// Puts `id` back to `previous`, or removes it if there was none.
    fn restore(&self, id: &str, previous: Option<&IVec>) -> StoreResult<()> {
        match previous {
            Some(bytes) => self.plans.insert(id.as_bytes(), bytes.clone())?,
            None => self.plans.remove(id.as_bytes())?,
        };
        Ok(())
    }
}

fn decode(bytes: &IVec) -> StoreResult<SavingsPlan> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

impl LedgerStore for VaultDB {
    fn get(&self, id: &str) -> StoreResult<Option<SavingsPlan>> {
        match self.plans.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn insert(&self, id: &str, plan: &SavingsPlan) -> StoreResult<Option<SavingsPlan>> {
        let bytes =
            bincode::serialize(plan).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let previous = self.plans.insert(id.as_bytes(), bytes)?;
        if let Err(e) = self.db.flush() {
            if let Err(undo) = self.restore(id, previous.as_ref()) {
                error!(plan_id = id, "failed to roll back unflushed write: {}", undo);
            }
            return Err(e.into());
        }

        previous.as_ref().map(decode).transpose()
    }

    fn entries(&self) -> PlanIter<'_> {
        Box::new(self.plans.iter().map(|item| -> StoreResult<(String, SavingsPlan)> {
            let (key, value) = item?;
            let id = String::from_utf8(key.to_vec())
                .map_err(|e| StoreError::Serialization(format!("invalid plan id: {e}")))?;
            Ok((id, decode(&value)?))
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
