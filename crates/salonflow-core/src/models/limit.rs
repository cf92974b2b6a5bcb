use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::constants::UNLIMITED_SENTINEL;

/// A seat limit (locations or users).
///
/// Stored rows use `-1` for "unlimited". Any negative number or `null` reads
/// as `Unlimited`, and `Unlimited` writes back as `-1`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<i64>", into = "i64")]
pub enum Limit {
    #[default]
    Unlimited,
    Limited(u32),
}

impl Limit {
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Limit::Unlimited)
    }

    /// Raise the limit by purchased add-on seats. Unlimited stays unlimited.
    pub fn plus(self, extra: u32) -> Limit {
        match self {
            Limit::Unlimited => Limit::Unlimited,
            Limit::Limited(n) => Limit::Limited(n.saturating_add(extra)),
        }
    }

    /// Units used beyond the limit (0 when unlimited or within the limit).
    pub fn overage(self, used: u32) -> u32 {
        match self {
            Limit::Unlimited => 0,
            Limit::Limited(n) => used.saturating_sub(n),
        }
    }

    /// Units still available under the limit, floored at zero.
    pub fn headroom(self, used: u32) -> Limit {
        match self {
            Limit::Unlimited => Limit::Unlimited,
            Limit::Limited(n) => Limit::Limited(n.saturating_sub(used)),
        }
    }

    /// Used-over-total ratio; 0 when unlimited or when the limit is 0.
    pub fn utilization(self, used: u32) -> f64 {
        match self {
            Limit::Unlimited | Limit::Limited(0) => 0.0,
            Limit::Limited(n) => f64::from(used) / f64::from(n),
        }
    }

    pub fn is_exceeded_by(self, used: u32) -> bool {
        match self {
            Limit::Unlimited => false,
            Limit::Limited(n) => used > n,
        }
    }

    pub fn as_sentinel(self) -> i64 {
        self.into()
    }
}

impl From<i64> for Limit {
    fn from(value: i64) -> Self {
        if value < 0 {
            Limit::Unlimited
        } else {
            Limit::Limited(u32::try_from(value).unwrap_or(u32::MAX))
        }
    }
}

impl From<Option<i64>> for Limit {
    fn from(value: Option<i64>) -> Self {
        value.map_or(Limit::Unlimited, Limit::from)
    }
}

impl From<Limit> for i64 {
    fn from(limit: Limit) -> Self {
        match limit {
            Limit::Unlimited => UNLIMITED_SENTINEL,
            Limit::Limited(n) => i64::from(n),
        }
    }
}

impl Display for Limit {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Limit::Unlimited => write!(f, "unlimited"),
            Limit::Limited(n) => write!(f, "{}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_round_trip_on_wire() {
        let unlimited: Limit = serde_json::from_str("-1").unwrap();
        assert_eq!(unlimited, Limit::Unlimited);
        assert_eq!(serde_json::to_string(&unlimited).unwrap(), "-1");

        let five: Limit = serde_json::from_str("5").unwrap();
        assert_eq!(five, Limit::Limited(5));
    }

    #[test]
    fn test_null_reads_as_unlimited() {
        let limit: Limit = serde_json::from_str("null").unwrap();
        assert_eq!(limit, Limit::Unlimited);

        let overridden: Option<Limit> = serde_json::from_str("null").unwrap();
        assert_eq!(overridden, None);
    }

    #[test]
    fn test_any_negative_reads_as_unlimited() {
        assert_eq!(Limit::from(-7_i64), Limit::Unlimited);
        assert_eq!(Limit::from(0_i64), Limit::Limited(0));
    }

    #[test]
    fn test_plus_keeps_unlimited() {
        assert_eq!(Limit::Unlimited.plus(3), Limit::Unlimited);
        assert_eq!(Limit::Limited(2).plus(1), Limit::Limited(3));
    }

    #[test]
    fn test_overage_and_headroom() {
        assert_eq!(Limit::Limited(3).overage(5), 2);
        assert_eq!(Limit::Limited(3).overage(2), 0);
        assert_eq!(Limit::Unlimited.overage(500), 0);

        assert_eq!(Limit::Limited(3).headroom(5), Limit::Limited(0));
        assert_eq!(Limit::Limited(3).headroom(1), Limit::Limited(2));
        assert_eq!(Limit::Unlimited.headroom(9), Limit::Unlimited);
    }

    #[test]
    fn test_utilization_guards_zero_and_unlimited() {
        assert_eq!(Limit::Limited(0).utilization(4), 0.0);
        assert_eq!(Limit::Unlimited.utilization(4), 0.0);
        assert_eq!(Limit::Limited(4).utilization(3), 0.75);
    }

    #[test]
    fn test_display() {
        assert_eq!(Limit::Unlimited.to_string(), "unlimited");
        assert_eq!(Limit::Limited(12).to_string(), "12");
    }
}
