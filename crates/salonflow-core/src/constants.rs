//! Application-wide constants.

/// Milliseconds in one day, used for day countdowns.
pub const MS_PER_DAY: i64 = 86_400_000;

/// Milliseconds in one hour, used for hour countdowns.
pub const MS_PER_HOUR: i64 = 3_600_000;

/// Months in a year; the annual projection multiplies the monthly rate by this.
pub const MONTHS_PER_YEAR: u32 = 12;

/// Utilization ratio above which a resource counts as "near its limit".
pub const NEAR_LIMIT_UTILIZATION: f64 = 0.8;

/// Remaining days at or below which a countdown is critical.
pub const CRITICAL_DAYS_REMAINING: i64 = 2;

/// Remaining days at or below which a countdown is a warning.
pub const WARNING_DAYS_REMAINING: i64 = 7;

/// Stored value meaning "no limit" on plan and billing limit columns.
pub const UNLIMITED_SENTINEL: i64 = -1;

/// Upper bound accepted for purchased add-on seats in a single billing record.
pub const MAX_ADD_ON_SEATS: u32 = 10_000;

/// Default display currency.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Upper bound accepted for an included-seat override.
pub const MAX_INCLUDED_SEATS: u32 = 100_000;
