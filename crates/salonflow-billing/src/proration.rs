//! Mid-cycle plan change proration.

use chrono::{DateTime, Months, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use salonflow_core::error::AppError;
use salonflow_core::models::BillingCycle;

use crate::pricing::BillingCalculation;

/// A billing period, start inclusive and end exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BillingPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BillingPeriod {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, AppError> {
        if end < start {
            return Err(AppError::InvalidInput(format!(
                "Billing period ends ({}) before it starts ({})",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// The period of one `cycle` starting at `start`.
    pub fn for_cycle(start: DateTime<Utc>, cycle: BillingCycle) -> Result<Self, AppError> {
        let end = start
            .checked_add_months(Months::new(cycle.months()))
            .ok_or_else(|| {
                AppError::InvalidInput(format!("Billing period starting {} overflows", start))
            })?;
        Ok(Self { start, end })
    }

    /// Fraction of the period still ahead of `now`, within [0, 1].
    pub fn remaining_fraction(&self, now: DateTime<Utc>) -> Decimal {
        let total_ms = (self.end - self.start).num_milliseconds();
        if total_ms <= 0 {
            return Decimal::ZERO;
        }
        let remaining_ms = (self.end - now).num_milliseconds().clamp(0, total_ms);
        Decimal::from(remaining_ms) / Decimal::from(total_ms)
    }
}

/// Credit and charge for switching subscriptions partway through a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProrationPreview {
    pub period: BillingPeriod,
    #[schema(value_type = f64)]
    pub remaining_fraction: Decimal,
    /// Unused part of the current cycle, credited back
    #[schema(value_type = f64)]
    pub unused_credit: Decimal,
    /// Proposed monthly rate over the current period's length, for the part left
    #[schema(value_type = f64)]
    pub prorated_charge: Decimal,
    /// Charge minus credit; negative means the customer is owed money
    #[schema(value_type = f64)]
    pub net_amount: Decimal,
}

fn to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Prorate a change from `current` to `proposed` at `now` within `period`.
///
/// The credit is the unused part of the current cycle. The charge applies the
/// proposed monthly rate to the months the current cycle spans, so a cycle
/// change bills only what remains of the period being replaced.
pub fn compute_proration(
    current: &BillingCalculation,
    proposed: &BillingCalculation,
    period: BillingPeriod,
    now: DateTime<Utc>,
) -> ProrationPreview {
    let fraction = period.remaining_fraction(now);
    let unused_credit = to_cents(current.cycle_amount.saturating_mul(fraction));
    let prorated_charge = to_cents(
        proposed
            .monthly_rate()
            .saturating_mul(Decimal::from(current.cycle_multiplier))
            .saturating_mul(fraction),
    );

    ProrationPreview {
        period,
        remaining_fraction: fraction,
        unused_credit,
        prorated_charge,
        net_amount: prorated_charge.saturating_sub(unused_credit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::compute_billing;
    use chrono::{Duration, TimeZone};
    use salonflow_core::models::{Limit, OrganizationBilling, SubscriptionPlan};
    use uuid::Uuid;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
    }

    fn calculation(price: i64) -> BillingCalculation {
        calculation_on(price, BillingCycle::Monthly)
    }

    fn calculation_on(price: i64, cycle: BillingCycle) -> BillingCalculation {
        let plan = SubscriptionPlan {
            id: Uuid::new_v4(),
            name: format!("Plan {price}"),
            price_monthly: Decimal::from(price),
            price_annually: None,
            max_users: Limit::Unlimited,
            max_locations: Limit::Unlimited,
            features: serde_json::json!({}),
        };
        let billing = OrganizationBilling {
            billing_cycle: cycle,
            ..OrganizationBilling::new(Uuid::new_v4(), plan.id)
        };
        compute_billing(Some(&billing), Some(&plan), 0, 0, start())
    }

    #[test]
    fn test_upgrade_halfway_through() {
        let period = BillingPeriod::new(start(), start() + Duration::days(30)).unwrap();
        let preview = compute_proration(
            &calculation(100),
            &calculation(200),
            period,
            start() + Duration::days(15),
        );

        assert_eq!(preview.remaining_fraction, Decimal::new(5, 1));
        assert_eq!(preview.unused_credit, Decimal::from(50));
        assert_eq!(preview.prorated_charge, Decimal::from(100));
        assert_eq!(preview.net_amount, Decimal::from(50));
    }

    #[test]
    fn test_downgrade_is_net_credit() {
        let period = BillingPeriod::new(start(), start() + Duration::days(30)).unwrap();
        let preview = compute_proration(
            &calculation(90),
            &calculation(30),
            period,
            start() + Duration::days(20),
        );

        assert_eq!(preview.unused_credit, Decimal::from(30));
        assert_eq!(preview.prorated_charge, Decimal::from(10));
        assert_eq!(preview.net_amount, Decimal::from(-20));
    }

    #[test]
    fn test_cycle_change_charges_remaining_months_only() {
        let period = BillingPeriod::new(start(), start() + Duration::days(30)).unwrap();
        let annual = calculation_on(100, BillingCycle::Annual);
        assert_eq!(annual.cycle_amount, Decimal::from(960));

        let preview = compute_proration(
            &calculation(100),
            &annual,
            period,
            start() + Duration::days(15),
        );

        assert_eq!(preview.unused_credit, Decimal::from(50));
        assert_eq!(preview.prorated_charge, Decimal::from(40));
        assert_eq!(preview.net_amount, Decimal::from(-10));
    }

    #[test]
    fn test_annual_to_monthly_over_annual_period() {
        let period = BillingPeriod::for_cycle(start(), BillingCycle::Annual).unwrap();
        let now = start() + (period.end - period.start) / 2;
        let preview = compute_proration(
            &calculation_on(100, BillingCycle::Annual),
            &calculation(100),
            period,
            now,
        );

        assert_eq!(preview.remaining_fraction, Decimal::new(5, 1));
        assert_eq!(preview.unused_credit, Decimal::from(480));
        assert_eq!(preview.prorated_charge, Decimal::from(600));
        assert_eq!(preview.net_amount, Decimal::from(120));
    }

    #[test]
    fn test_rounds_to_cents() {
        let period = BillingPeriod::new(start(), start() + Duration::days(3)).unwrap();
        let preview = compute_proration(
            &calculation(100),
            &calculation(0),
            period,
            start() + Duration::days(2),
        );
        assert_eq!(preview.unused_credit, Decimal::new(3333, 2));
    }

    #[test]
    fn test_now_outside_period_is_clamped() {
        let period = BillingPeriod::new(start(), start() + Duration::days(30)).unwrap();

        let before = compute_proration(
            &calculation(100),
            &calculation(200),
            period,
            start() - Duration::days(5),
        );
        assert_eq!(before.remaining_fraction, Decimal::ONE);
        assert_eq!(before.net_amount, Decimal::from(100));

        let after = compute_proration(
            &calculation(100),
            &calculation(200),
            period,
            start() + Duration::days(45),
        );
        assert_eq!(after.remaining_fraction, Decimal::ZERO);
        assert_eq!(after.net_amount, Decimal::ZERO);
    }

    #[test]
    fn test_zero_length_period_yields_zeros() {
        let period = BillingPeriod::new(start(), start()).unwrap();
        let preview = compute_proration(&calculation(100), &calculation(200), period, start());
        assert_eq!(preview.unused_credit, Decimal::ZERO);
        assert_eq!(preview.prorated_charge, Decimal::ZERO);
        assert_eq!(preview.net_amount, Decimal::ZERO);
    }

    #[test]
    fn test_period_validation_and_cycles() {
        assert!(BillingPeriod::new(start(), start() - Duration::seconds(1)).is_err());

        let quarter = BillingPeriod::for_cycle(start(), BillingCycle::Quarterly).unwrap();
        assert_eq!(quarter.end, Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap());

        let year = BillingPeriod::for_cycle(start(), BillingCycle::Annual).unwrap();
        assert_eq!(year.end, Utc.with_ymd_and_hms(2027, 3, 1, 0, 0, 0).unwrap());
    }
}
