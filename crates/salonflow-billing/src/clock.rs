//! Countdown arithmetic against an injected evaluation time.

use chrono::{DateTime, Utc};
use salonflow_core::constants::{MS_PER_DAY, MS_PER_HOUR};

/// True when `at` is set and strictly after `now`.
pub fn is_future(at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    at.is_some_and(|t| t > now)
}

/// Whole days from `now` until `at`, rounded up. Negative once `at` has passed.
pub fn days_until(at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    ceil_div((at - now).num_milliseconds(), MS_PER_DAY)
}

/// Whole hours from `now` until `at`, rounded up.
pub fn hours_until(at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    ceil_div((at - now).num_milliseconds(), MS_PER_HOUR)
}

/// Ceiling division for a positive divisor.
pub(crate) fn ceil_div(value: i64, divisor: i64) -> i64 {
    let quotient = value.div_euclid(divisor);
    if value.rem_euclid(divisor) == 0 {
        quotient
    } else {
        quotient + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_ceil_div() {
        assert_eq!(ceil_div(10, 5), 2);
        assert_eq!(ceil_div(11, 5), 3);
        assert_eq!(ceil_div(-1, 5), 0);
        assert_eq!(ceil_div(-5, 5), -1);
        assert_eq!(ceil_div(-6, 5), -1);
        assert_eq!(ceil_div(0, 5), 0);
    }

    #[test]
    fn test_days_until_rounds_up() {
        assert_eq!(days_until(now() + Duration::hours(1), now()), 1);
        assert_eq!(days_until(now() + Duration::days(2), now()), 2);
        assert_eq!(days_until(now() + Duration::hours(49), now()), 3);
        assert_eq!(days_until(now() - Duration::hours(36), now()), -1);
    }

    #[test]
    fn test_hours_until() {
        assert_eq!(hours_until(now() + Duration::minutes(61), now()), 2);
        assert_eq!(hours_until(now(), now()), 0);
    }

    #[test]
    fn test_is_future_is_strict() {
        assert!(!is_future(Some(now()), now()));
        assert!(is_future(Some(now() + Duration::seconds(1)), now()));
        assert!(!is_future(None, now()));
    }
}
