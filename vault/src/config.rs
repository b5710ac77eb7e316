//! # Vault Configuration & Constants
//!
//! Every magic number in the vault lives here. The rate schedule in
//! particular is part of the product contract: a plan's rate is frozen at
//! creation, so changing these values only affects plans opened afterwards.

// ---------------------------------------------------------------------------
// Engine Version
// ---------------------------------------------------------------------------

/// Engine version string, reported by the node's `version` subcommand.
pub const ENGINE_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Time Units
// ---------------------------------------------------------------------------

/// Nanoseconds in one second. All timestamps are nanoseconds since epoch.
pub const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Seconds in one day. No leap seconds, no DST, no surprises.
pub const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Nanoseconds in one day.
pub const NANOS_PER_DAY: u64 = SECONDS_PER_DAY * NANOS_PER_SECOND;

/// Days in an interest year. Always 365, leap years included.
pub const DAYS_PER_YEAR: u64 = 365;

/// Nanoseconds in one interest year: the denominator of the accrual formula.
pub const NANOS_PER_YEAR: u64 = DAYS_PER_YEAR * NANOS_PER_DAY;

// ---------------------------------------------------------------------------
// Rate Schedule
// ---------------------------------------------------------------------------

/// Rates are expressed against this denominator. 10_000 = 100%.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Fixed plans start here before the per-day bonus.
pub const FIXED_BASE_RATE_BPS: u64 = 500;

/// Fixed plans earn this much extra rate for each locked day.
pub const FIXED_RATE_PER_DAY_BPS: u64 = 100;

/// Flexible plans earn a flat rate regardless of duration.
pub const FLEXIBLE_RATE_BPS: u64 = 300;

/// Shortest lock a Fixed plan accepts, in days. Flexible plans have no minimum.
pub const MIN_FIXED_DURATION_DAYS: u64 = 1;

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Prefix of every generated plan identifier.
pub const PLAN_ID_PREFIX: &str = "PLAN-";

/// Name of the sled tree holding plan records.
pub const PLANS_TREE: &str = "plans";

// ---------------------------------------------------------------------------
// Node Defaults
// ---------------------------------------------------------------------------

/// Default port for the REST / JSON-RPC API.
pub const DEFAULT_API_PORT: u16 = 9841;

/// Default port for the Prometheus metrics endpoint.
pub const DEFAULT_METRICS_PORT: u16 = 9842;

/// Header carrying the already-authenticated caller principal.
pub const CALLER_PRINCIPAL_HEADER: &str = "x-caller-principal";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_unit_derivations() {
        assert_eq!(NANOS_PER_DAY, 86_400_000_000_000);
        assert_eq!(NANOS_PER_YEAR, 31_536_000_000_000_000);
    }

    #[test]
    fn test_rate_schedule_sanity() {
        // A one-day Fixed plan must beat a Flexible plan, otherwise nobody
        // would ever lock funds.
        assert!(FIXED_BASE_RATE_BPS + FIXED_RATE_PER_DAY_BPS * MIN_FIXED_DURATION_DAYS > FLEXIBLE_RATE_BPS);
        assert!(FLEXIBLE_RATE_BPS < BPS_DENOMINATOR);
    }

    #[test]
    fn test_ports_are_distinct() {
        assert_ne!(DEFAULT_API_PORT, DEFAULT_METRICS_PORT);
    }

    #[test]
    fn test_plan_id_prefix_format() {
        assert!(PLAN_ID_PREFIX.ends_with('-'));
        assert!(!PLAN_ID_PREFIX.is_empty());
    }
}
