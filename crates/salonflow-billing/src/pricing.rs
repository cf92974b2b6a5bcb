//! Pricing resolver
//!
//! Turns a plan, an organization's billing overrides and its current usage into
//! the monthly, per-cycle, annual and first-invoice amounts shown on the
//! billing screens.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use utoipa::ToSchema;

use salonflow_core::constants::MONTHS_PER_YEAR;
use salonflow_core::models::{
    BillingCycle, DiscountType, Limit, OrganizationBilling, SubscriptionPlan,
};

use crate::clock::{days_until, is_future};
use crate::precedence::first_defined;

/// Result of pricing an organization's subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BillingCalculation {
    pub billing_cycle: BillingCycle,
    /// Resolved monthly price before promo, discount and seat fees
    #[schema(value_type = f64)]
    pub monthly_amount: Decimal,
    /// Monthly price after promo or discount, plus seat fees
    #[schema(value_type = f64)]
    pub effective_monthly_amount: Decimal,
    pub cycle_multiplier: u32,
    #[schema(value_type = f64)]
    pub cycle_amount: Decimal,
    #[schema(value_type = f64)]
    pub annual_amount: Decimal,
    #[schema(value_type = f64)]
    pub savings_amount: Decimal,
    #[schema(value_type = f64)]
    pub savings_percentage: Decimal,
    #[schema(value_type = f64)]
    pub first_invoice_amount: Decimal,
    /// Unpaid one-time setup fee (billed on the first paid invoice)
    #[schema(value_type = f64)]
    pub setup_fee_due: Decimal,
    pub is_in_promo: bool,
    #[schema(value_type = f64)]
    pub promo_savings: Decimal,
    pub days_until_promo_ends: Option<i64>,
    #[schema(value_type = f64)]
    pub discount_savings: Decimal,
    pub is_in_trial: bool,
    pub days_until_trial_ends: Option<i64>,
    #[schema(value_type = i64)]
    pub included_locations: Limit,
    #[schema(value_type = i64)]
    pub included_users: Limit,
    pub billable_locations: u32,
    pub billable_users: u32,
    #[schema(value_type = f64)]
    pub location_overage_fees: Decimal,
    #[schema(value_type = f64)]
    pub user_overage_fees: Decimal,
    #[schema(value_type = f64)]
    pub location_add_on_fees: Decimal,
    #[schema(value_type = f64)]
    pub user_add_on_fees: Decimal,
}

impl BillingCalculation {
    /// Result when no billing record (or no plan) is configured yet: the plan's
    /// list price, billed monthly, with nothing else applied.
    fn list_price(plan: Option<&SubscriptionPlan>) -> Self {
        let monthly = plan.map(|p| p.price_monthly).unwrap_or(Decimal::ZERO);
        Self {
            billing_cycle: BillingCycle::Monthly,
            monthly_amount: monthly,
            effective_monthly_amount: monthly,
            cycle_multiplier: BillingCycle::Monthly.multiplier(),
            cycle_amount: monthly,
            annual_amount: monthly.saturating_mul(Decimal::from(MONTHS_PER_YEAR)),
            savings_amount: Decimal::ZERO,
            savings_percentage: Decimal::ZERO,
            first_invoice_amount: monthly,
            setup_fee_due: Decimal::ZERO,
            is_in_promo: false,
            promo_savings: Decimal::ZERO,
            days_until_promo_ends: None,
            discount_savings: Decimal::ZERO,
            is_in_trial: false,
            days_until_trial_ends: None,
            included_locations: plan.map(|p| p.max_locations).unwrap_or(Limit::Unlimited),
            included_users: plan.map(|p| p.max_users).unwrap_or(Limit::Unlimited),
            billable_locations: 0,
            billable_users: 0,
            location_overage_fees: Decimal::ZERO,
            user_overage_fees: Decimal::ZERO,
            location_add_on_fees: Decimal::ZERO,
            user_add_on_fees: Decimal::ZERO,
        }
    }

    /// Seat-related additions to the monthly price.
    pub fn seat_fees(&self) -> Decimal {
        self.location_overage_fees
            .saturating_add(self.user_overage_fees)
            .saturating_add(self.location_add_on_fees)
            .saturating_add(self.user_add_on_fees)
    }

    /// Cycle amount spread over the months the cycle covers.
    pub fn monthly_rate(&self) -> Decimal {
        self.cycle_amount
            .checked_div(Decimal::from(self.cycle_multiplier))
            .unwrap_or(self.cycle_amount)
    }
}

/// Fees for one seat resource (locations or users).
#[derive(Debug, Clone, Copy)]
struct SeatCharges {
    included: Limit,
    billable: u32,
    overage_fees: Decimal,
    add_on_fees: Decimal,
}

impl SeatCharges {
    /// Purchased seats both raise the included allowance and carry their own
    /// recurring fee, whether or not usage reaches them.
    fn compute(base: Limit, purchased: u32, used: u32, per_seat_fee: Decimal) -> Self {
        let included = base.plus(purchased);
        let billable = included.overage(used);
        Self {
            included,
            billable,
            overage_fees: Decimal::from(billable).saturating_mul(per_seat_fee),
            add_on_fees: Decimal::from(purchased).saturating_mul(per_seat_fee),
        }
    }

    fn total(&self) -> Decimal {
        self.overage_fees.saturating_add(self.add_on_fees)
    }
}

fn apply_discount(amount: Decimal, kind: DiscountType, value: Decimal) -> Decimal {
    match kind {
        DiscountType::Percentage => {
            if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
                warn!(discount_value = %value, "Percentage discount outside 0-100, clamping");
            }
            let percent = value.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
            (amount * (Decimal::ONE - percent / Decimal::ONE_HUNDRED)).max(Decimal::ZERO)
        }
        DiscountType::FixedAmount => amount
            .saturating_sub(value.max(Decimal::ZERO))
            .max(Decimal::ZERO),
        DiscountType::Promotional => amount,
    }
}

/// Price an organization's subscription at `now`.
///
/// Total over its inputs: missing records fall back to the plan list price (or
/// zero) instead of failing, and amounts saturate at `Decimal::MAX` rather
/// than overflow.
pub fn compute_billing(
    billing: Option<&OrganizationBilling>,
    plan: Option<&SubscriptionPlan>,
    location_count: u32,
    user_count: u32,
    now: DateTime<Utc>,
) -> BillingCalculation {
    let (billing, plan) = match (billing, plan) {
        (Some(billing), Some(plan)) => (billing, plan),
        (billing, plan) => {
            debug!(
                has_billing = billing.is_some(),
                has_plan = plan.is_some(),
                "Billing not configured, using plan list price"
            );
            return BillingCalculation::list_price(plan);
        }
    };

    let monthly_amount = first_defined([
        billing.custom_price,
        billing.base_price,
        Some(plan.price_monthly),
    ])
    .unwrap_or(Decimal::ZERO);

    let is_in_promo = is_future(billing.promo_ends_at, now);
    let days_until_promo_ends = billing.promo_ends_at.map(|at| days_until(at, now));
    let is_in_trial = is_future(billing.trial_ends_at, now);
    let days_until_trial_ends = billing.trial_ends_at.map(|at| days_until(at, now));

    let mut effective = monthly_amount;
    let mut promo_savings = Decimal::ZERO;
    let mut discount_savings = Decimal::ZERO;

    if is_in_promo {
        if let Some(promo_price) = billing.promo_price {
            promo_savings = monthly_amount.saturating_sub(promo_price);
            effective = promo_price.max(Decimal::ZERO);
        }
    } else if let (Some(kind), Some(value)) = (billing.discount_type, billing.discount_value) {
        let discounted = apply_discount(effective, kind, value);
        discount_savings = effective.saturating_sub(discounted);
        effective = discounted;
    }

    let locations = SeatCharges::compute(
        first_defined([billing.included_locations, Some(plan.max_locations)])
            .unwrap_or(Limit::Unlimited),
        billing.additional_locations_purchased,
        location_count,
        billing.per_location_fee,
    );
    let users = SeatCharges::compute(
        first_defined([billing.included_users, Some(plan.max_users)]).unwrap_or(Limit::Unlimited),
        billing.additional_users_purchased,
        user_count,
        billing.per_user_fee,
    );
    effective = effective
        .saturating_add(locations.total())
        .saturating_add(users.total());

    let cycle = billing.billing_cycle;
    let multiplier = Decimal::from(cycle.multiplier());
    let cycle_discount = cycle.discount_rate();
    let undiscounted_cycle = effective.saturating_mul(multiplier);
    let cycle_amount = undiscounted_cycle.saturating_mul(Decimal::ONE - cycle_discount);
    let annual_amount =
        (cycle_amount / multiplier).saturating_mul(Decimal::from(MONTHS_PER_YEAR));

    let setup_fee_due = if !billing.setup_fee_paid && billing.setup_fee > Decimal::ZERO {
        billing.setup_fee
    } else {
        Decimal::ZERO
    };
    let first_invoice_amount = if is_in_trial {
        Decimal::ZERO
    } else {
        cycle_amount.saturating_add(setup_fee_due)
    };

    BillingCalculation {
        billing_cycle: cycle,
        monthly_amount,
        effective_monthly_amount: effective,
        cycle_multiplier: cycle.multiplier(),
        cycle_amount,
        annual_amount,
        savings_amount: undiscounted_cycle.saturating_sub(cycle_amount),
        savings_percentage: cycle_discount * Decimal::ONE_HUNDRED,
        first_invoice_amount,
        setup_fee_due,
        is_in_promo,
        promo_savings,
        days_until_promo_ends,
        discount_savings,
        is_in_trial,
        days_until_trial_ends,
        included_locations: locations.included,
        included_users: users.included,
        billable_locations: locations.billable,
        billable_users: users.billable,
        location_overage_fees: locations.overage_fees,
        user_overage_fees: users.overage_fees,
        location_add_on_fees: locations.add_on_fees,
        user_add_on_fees: users.add_on_fees,
    }
}
