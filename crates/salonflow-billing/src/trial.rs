//! Trial and promo countdowns for billing banners.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use salonflow_core::constants::{CRITICAL_DAYS_REMAINING, WARNING_DAYS_REMAINING};
use salonflow_core::models::{Organization, OrganizationBilling};

use crate::clock::{days_until, hours_until, is_future};
use crate::precedence::first_defined;
use crate::pricing::BillingCalculation;

/// How urgently a countdown should be surfaced
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    #[default]
    Normal,
    Warning,
    Critical,
    Expired,
}

impl UrgencyLevel {
    pub fn from_days_remaining(days: i64) -> Self {
        if days <= 0 {
            UrgencyLevel::Expired
        } else if days <= CRITICAL_DAYS_REMAINING {
            UrgencyLevel::Critical
        } else if days <= WARNING_DAYS_REMAINING {
            UrgencyLevel::Warning
        } else {
            UrgencyLevel::Normal
        }
    }
}

impl Display for UrgencyLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UrgencyLevel::Normal => write!(f, "normal"),
            UrgencyLevel::Warning => write!(f, "warning"),
            UrgencyLevel::Critical => write!(f, "critical"),
            UrgencyLevel::Expired => write!(f, "expired"),
        }
    }
}

impl FromStr for UrgencyLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(UrgencyLevel::Normal),
            "warning" => Ok(UrgencyLevel::Warning),
            "critical" => Ok(UrgencyLevel::Critical),
            "expired" => Ok(UrgencyLevel::Expired),
            _ => Err(anyhow::anyhow!("Invalid urgency level: {}", s)),
        }
    }
}

/// Remaining time until a deadline, clamped at zero once it has passed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Countdown {
    days: i64,
    hours: i64,
    is_expired: bool,
}

impl Countdown {
    fn until(at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let is_expired = at <= now;
        if is_expired {
            Self {
                days: 0,
                hours: 0,
                is_expired,
            }
        } else {
            Self {
                days: days_until(at, now),
                hours: hours_until(at, now),
                is_expired,
            }
        }
    }

    fn urgency(&self) -> UrgencyLevel {
        UrgencyLevel::from_days_remaining(self.days)
    }
}

/// Trial banner state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TrialStatus {
    pub is_in_trial: bool,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub days_remaining: Option<i64>,
    pub hours_remaining: Option<i64>,
    pub urgency_level: UrgencyLevel,
    pub is_expired: bool,
}

/// Resolve the trial countdown for an organization.
///
/// Any one trial signal is enough: the pricing result, a `trialing`
/// subscription status, or a trial end still in the future.
pub fn compute_trial_status(
    organization: Option<&Organization>,
    billing: Option<&OrganizationBilling>,
    calculation: &BillingCalculation,
    now: DateTime<Utc>,
) -> TrialStatus {
    let trial_ends_at = first_defined([
        billing.and_then(|b| b.trial_ends_at),
        organization.and_then(|o| o.trial_ends_at),
    ]);

    let is_in_trial = calculation.is_in_trial
        || organization.is_some_and(Organization::is_trialing)
        || is_future(trial_ends_at, now);

    let Some(ends_at) = trial_ends_at.filter(|_| is_in_trial) else {
        return TrialStatus::default();
    };

    let countdown = Countdown::until(ends_at, now);
    TrialStatus {
        is_in_trial: true,
        trial_ends_at: Some(ends_at),
        days_remaining: Some(countdown.days),
        hours_remaining: Some(countdown.hours),
        urgency_level: countdown.urgency(),
        is_expired: countdown.is_expired,
    }
}

/// Promo banner state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PromoStatus {
    pub is_active: bool,
    pub promo_ends_at: Option<DateTime<Utc>>,
    pub days_remaining: Option<i64>,
    pub hours_remaining: Option<i64>,
    pub urgency_level: UrgencyLevel,
}

/// Countdown to the end of a promo window. Inactive when no promo is running.
pub fn compute_promo_status(
    billing: Option<&OrganizationBilling>,
    now: DateTime<Utc>,
) -> PromoStatus {
    let promo_ends_at = billing.and_then(|b| b.promo_ends_at);
    let Some(ends_at) = promo_ends_at.filter(|at| *at > now) else {
        return PromoStatus::default();
    };

    let countdown = Countdown::until(ends_at, now);
    PromoStatus {
        is_active: true,
        promo_ends_at: Some(ends_at),
        days_remaining: Some(countdown.days),
        hours_remaining: Some(countdown.hours),
        urgency_level: countdown.urgency(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::compute_billing;
    use chrono::{Duration, TimeZone};
    use salonflow_core::models::SubscriptionStatus;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 8, 30, 0).unwrap()
    }

    fn organization(
        status: Option<SubscriptionStatus>,
        trial_ends_at: Option<DateTime<Utc>>,
    ) -> Organization {
        Organization {
            id: Uuid::new_v4(),
            name: "Blue Door Barbers".to_string(),
            plan_id: None,
            subscription_status: status,
            trial_ends_at,
        }
    }

    fn no_calculation() -> BillingCalculation {
        compute_billing(None, None, 0, 0, now())
    }

    #[test]
    fn test_urgency_thresholds() {
        assert_eq!(UrgencyLevel::from_days_remaining(-3), UrgencyLevel::Expired);
        assert_eq!(UrgencyLevel::from_days_remaining(0), UrgencyLevel::Expired);
        assert_eq!(UrgencyLevel::from_days_remaining(1), UrgencyLevel::Critical);
        assert_eq!(UrgencyLevel::from_days_remaining(2), UrgencyLevel::Critical);
        assert_eq!(UrgencyLevel::from_days_remaining(3), UrgencyLevel::Warning);
        assert_eq!(UrgencyLevel::from_days_remaining(7), UrgencyLevel::Warning);
        assert_eq!(UrgencyLevel::from_days_remaining(8), UrgencyLevel::Normal);
    }

    #[test]
    fn test_no_trial_signals() {
        let org = organization(Some(SubscriptionStatus::Active), None);
        let status = compute_trial_status(Some(&org), None, &no_calculation(), now());
        assert_eq!(status, TrialStatus::default());
        assert_eq!(status.urgency_level, UrgencyLevel::Normal);
    }

    #[test]
    fn test_two_days_left_is_critical() {
        let org = organization(None, Some(now() + Duration::days(2)));
        let status = compute_trial_status(Some(&org), None, &no_calculation(), now());

        assert!(status.is_in_trial);
        assert_eq!(status.days_remaining, Some(2));
        assert_eq!(status.hours_remaining, Some(48));
        assert_eq!(status.urgency_level, UrgencyLevel::Critical);
        assert!(!status.is_expired);
    }

    #[test]
    fn test_trialing_status_past_end_is_expired() {
        let ended = now() - Duration::hours(5);
        let org = organization(Some(SubscriptionStatus::Trialing), Some(ended));
        let status = compute_trial_status(Some(&org), None, &no_calculation(), now());

        assert!(status.is_in_trial);
        assert!(status.is_expired);
        assert_eq!(status.days_remaining, Some(0));
        assert_eq!(status.hours_remaining, Some(0));
        assert_eq!(status.urgency_level, UrgencyLevel::Expired);
    }

    #[test]
    fn test_trial_ending_exactly_now_is_expired() {
        let org = organization(Some(SubscriptionStatus::Trialing), Some(now()));
        let status = compute_trial_status(Some(&org), None, &no_calculation(), now());
        assert!(status.is_expired);
        assert_eq!(status.urgency_level, UrgencyLevel::Expired);
    }

    #[test]
    fn test_past_trial_without_other_signals_is_not_in_trial() {
        let org = organization(
            Some(SubscriptionStatus::Active),
            Some(now() - Duration::days(3)),
        );
        let status = compute_trial_status(Some(&org), None, &no_calculation(), now());
        assert!(!status.is_in_trial);
        assert!(!status.is_expired);
    }

    #[test]
    fn test_trialing_without_timestamp_is_not_in_trial() {
        let org = organization(Some(SubscriptionStatus::Trialing), None);
        let status = compute_trial_status(Some(&org), None, &no_calculation(), now());
        assert_eq!(status, TrialStatus::default());
    }

    #[test]
    fn test_billing_trial_end_wins() {
        let org = organization(None, Some(now() + Duration::days(30)));
        let billing = OrganizationBilling {
            trial_ends_at: Some(now() + Duration::days(5)),
            ..Default::default()
        };
        let status = compute_trial_status(Some(&org), Some(&billing), &no_calculation(), now());

        assert_eq!(status.trial_ends_at, billing.trial_ends_at);
        assert_eq!(status.days_remaining, Some(5));
        assert_eq!(status.urgency_level, UrgencyLevel::Warning);
    }

    #[test]
    fn test_partial_day_rounds_up() {
        let org = organization(None, Some(now() + Duration::hours(200)));
        let status = compute_trial_status(Some(&org), None, &no_calculation(), now());
        assert_eq!(status.days_remaining, Some(9));
        assert_eq!(status.urgency_level, UrgencyLevel::Normal);
    }

    #[test]
    fn test_no_organization_or_billing() {
        let status = compute_trial_status(None, None, &no_calculation(), now());
        assert!(!status.is_in_trial);
    }

    #[test]
    fn test_promo_status_active_and_inactive() {
        let billing = OrganizationBilling {
            promo_ends_at: Some(now() + Duration::hours(30)),
            ..Default::default()
        };
        let promo = compute_promo_status(Some(&billing), now());
        assert!(promo.is_active);
        assert_eq!(promo.days_remaining, Some(2));
        assert_eq!(promo.urgency_level, UrgencyLevel::Critical);

        let expired = OrganizationBilling {
            promo_ends_at: Some(now() - Duration::hours(1)),
            ..Default::default()
        };
        assert_eq!(compute_promo_status(Some(&expired), now()), PromoStatus::default());
        assert!(!compute_promo_status(None, now()).is_active);
    }
}
