// Copyright (c) 2026 SavingVault Contributors. MIT License.
// See LICENSE for details.

//! # SavingVault Core Library
//!
//! The savings-plan lifecycle engine. Users lock a principal into a plan,
//! the plan accrues interest at a rate fixed on the day it was opened, and
//! the owner eventually withdraws principal plus interest. That's the whole
//! product. The hard part is making sure money only leaves a plan once, only
//! to its owner, and only when the rules say so.
//!
//! ## Architecture
//!
//! - **config**: Every constant: time units, rate schedule, storage names.
//! - **types**: `SavingsPlan`, `PlanType`, `Principal`, request/response shapes.
//! - **error**: The `SavingsError` taxonomy returned by every engine call.
//! - **interest**: Rate schedule and accrual math, 128-bit checked.
//! - **clock**: Injected time source (system clock or a manual one for tests).
//! - **store**: The `LedgerStore` contract plus in-memory and sled backends.
//! - **engine**: `VaultEngine`: create, list, withdraw.
//!
//! ## Design Philosophy
//!
//! 1. No floating point anywhere near money. Amounts are `u64`, rates are
//!    basis points, time is nanoseconds.
//! 2. Overflow is an error, never a wrap.
//! 3. Validate everything, then write once. A failed call leaves the ledger
//!    exactly as it found it.
//! 4. The engine owns rules, not data. The store owns data.

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod interest;
pub mod store;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::VaultEngine;
pub use error::{SavingsError, SavingsErrorKind, SavingsResult};
pub use store::{LedgerStore, MemoryLedger, StoreError, VaultDB};
pub use types::{CreatePlanInput, PlanType, Principal, SavingsPlan, WithdrawalQuote};
