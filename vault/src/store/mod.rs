//! # Ledger Store
//!
//! The durable mapping from plan id to [`SavingsPlan`]. The engine only
//! needs three things from it: point lookup, upsert, and a full scan.
//!
//! ```text
//! memory.rs: MemoryLedger: ordered map behind a RwLock (tests, simulations)
//! db.rs    : VaultDB: sled tree, bincode values, flushed on every write
//! ```
//!
//! Durability, crash consistency, and on-disk layout are the store's
//! business. The engine treats every implementation as a reliable,
//! synchronous key-value map and writes back whole records, never fields.

pub mod db;
pub mod memory;

pub use db::VaultDB;
pub use memory::MemoryLedger;

use std::sync::Arc;

use crate::types::SavingsPlan;

/// Errors that can occur inside a ledger store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Lazy scan over `(id, plan)` pairs.
pub type PlanIter<'a> = Box<dyn Iterator<Item = StoreResult<(String, SavingsPlan)>> + 'a>;

/// The store contract consumed by [`crate::VaultEngine`].
///
/// Methods take `&self`; implementations provide their own interior
/// mutability. Callers are expected to serialize writes.
pub trait LedgerStore {
    /// Point lookup. `Ok(None)` if the id was never written.
    fn get(&self, id: &str) -> StoreResult<Option<SavingsPlan>>;

    /// Upsert. Returns the record previously stored under `id`, if any.
    fn insert(&self, id: &str, plan: &SavingsPlan) -> StoreResult<Option<SavingsPlan>>;

    /// Full scan in the store's enumeration order. Each call starts over.
    fn entries(&self) -> PlanIter<'_>;

    fn contains(&self, id: &str) -> StoreResult<bool> {
        Ok(self.get(id)?.is_some())
    }
}

impl<S: LedgerStore + ?Sized> LedgerStore for Arc<S> {
    fn get(&self, id: &str) -> StoreResult<Option<SavingsPlan>> {
        (**self).get(id)
    }

    fn insert(&self, id: &str, plan: &SavingsPlan) -> StoreResult<Option<SavingsPlan>> {
        (**self).insert(id, plan)
    }

    fn entries(&self) -> PlanIter<'_> {
        (**self).entries()
    }

    fn contains(&self, id: &str) -> StoreResult<bool> {
        (**self).contains(id)
    }
}
