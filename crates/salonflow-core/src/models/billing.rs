use std::borrow::Cow;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::limit::Limit;
use crate::constants::{MAX_ADD_ON_SEATS, MAX_INCLUDED_SEATS, UNLIMITED_SENTINEL};
use crate::error::AppError;

/// Billing frequency
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    #[default]
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
}

impl BillingCycle {
    /// Number of months billed per cycle.
    pub fn multiplier(&self) -> u32 {
        match self {
            BillingCycle::Monthly => 1,
            BillingCycle::Quarterly => 3,
            BillingCycle::SemiAnnual => 6,
            BillingCycle::Annual => 12,
        }
    }

    /// Loyalty discount for prepaying the cycle, as a fraction.
    pub fn discount_rate(&self) -> Decimal {
        match self {
            BillingCycle::Monthly => Decimal::ZERO,
            BillingCycle::Quarterly => Decimal::new(5, 2),
            BillingCycle::SemiAnnual => Decimal::new(10, 2),
            BillingCycle::Annual => Decimal::new(20, 2),
        }
    }

    pub fn months(&self) -> u32 {
        self.multiplier()
    }
}

impl Display for BillingCycle {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            BillingCycle::Monthly => write!(f, "monthly"),
            BillingCycle::Quarterly => write!(f, "quarterly"),
            BillingCycle::SemiAnnual => write!(f, "semi_annual"),
            BillingCycle::Annual => write!(f, "annual"),
        }
    }
}

impl FromStr for BillingCycle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(BillingCycle::Monthly),
            "quarterly" => Ok(BillingCycle::Quarterly),
            "semi_annual" => Ok(BillingCycle::SemiAnnual),
            "annual" => Ok(BillingCycle::Annual),
            _ => Err(anyhow::anyhow!("Invalid billing cycle: {}", s)),
        }
    }
}

/// Kind of standing discount on a billing record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percentage,
    FixedAmount,
    /// Marks promo-window pricing; carries no standing reduction of its own.
    Promotional,
}

impl Display for DiscountType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DiscountType::Percentage => write!(f, "percentage"),
            DiscountType::FixedAmount => write!(f, "fixed_amount"),
            DiscountType::Promotional => write!(f, "promotional"),
        }
    }
}

impl FromStr for DiscountType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(DiscountType::Percentage),
            "fixed_amount" => Ok(DiscountType::FixedAmount),
            "promotional" => Ok(DiscountType::Promotional),
            _ => Err(anyhow::anyhow!("Invalid discount type: {}", s)),
        }
    }
}

/// Per-organization billing override record.
///
/// One per organization; platform admins update it, it is never deleted.
/// Every optional price or limit falls back to the plan when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct OrganizationBilling {
    pub organization_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub billing_cycle: BillingCycle,
    #[schema(value_type = Option<f64>)]
    pub custom_price: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub base_price: Option<Decimal>,
    pub discount_type: Option<DiscountType>,
    #[schema(value_type = Option<f64>)]
    pub discount_value: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub promo_price: Option<Decimal>,
    pub promo_ends_at: Option<DateTime<Utc>>,
    pub trial_ends_at: Option<DateTime<Utc>>,
    #[schema(value_type = f64)]
    pub setup_fee: Decimal,
    pub setup_fee_paid: bool,
    #[schema(value_type = f64)]
    pub per_location_fee: Decimal,
    #[schema(value_type = f64)]
    pub per_user_fee: Decimal,
    /// Overrides the plan's `max_locations`; `-1` = unlimited
    #[schema(value_type = Option<i64>)]
    pub included_locations: Option<Limit>,
    /// Overrides the plan's `max_users`; `-1` = unlimited
    #[schema(value_type = Option<i64>)]
    pub included_users: Option<Limit>,
    pub additional_locations_purchased: u32,
    pub additional_users_purchased: u32,
}

impl OrganizationBilling {
    pub fn new(organization_id: Uuid, plan_id: Uuid) -> Self {
        Self {
            organization_id,
            plan_id: Some(plan_id),
            ..Default::default()
        }
    }

    /// Validate and merge an admin update into this record.
    pub fn apply_update(&mut self, update: &UpdateOrganizationBilling) -> Result<(), AppError> {
        update.validate()?;
        update.apply_to(self);
        Ok(())
    }
}

/// Admin request to change an organization's billing record
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
#[validate(schema(function = "validate_billing_update"))]
#[serde(default)]
pub struct UpdateOrganizationBilling {
    pub plan_id: Option<Uuid>,
    pub billing_cycle: Option<BillingCycle>,
    #[schema(value_type = Option<f64>)]
    pub custom_price: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub base_price: Option<Decimal>,
    pub discount_type: Option<DiscountType>,
    #[schema(value_type = Option<f64>)]
    pub discount_value: Option<Decimal>,
    /// Remove the standing discount (applied before `discount_*`)
    pub clear_discount: bool,
    #[schema(value_type = Option<f64>)]
    pub promo_price: Option<Decimal>,
    pub promo_ends_at: Option<DateTime<Utc>>,
    /// Remove the promo window (applied before `promo_*`)
    pub clear_promo: bool,
    pub trial_ends_at: Option<DateTime<Utc>>,
    #[schema(value_type = Option<f64>)]
    pub setup_fee: Option<Decimal>,
    pub setup_fee_paid: Option<bool>,
    #[schema(value_type = Option<f64>)]
    pub per_location_fee: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub per_user_fee: Option<Decimal>,
    /// `-1` = unlimited
    pub included_locations: Option<i64>,
    /// `-1` = unlimited
    pub included_users: Option<i64>,
    pub additional_locations_purchased: Option<u32>,
    pub additional_users_purchased: Option<u32>,
}

fn validation_error(code: &'static str, message: String) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Owned(message))
}

fn validate_billing_update(update: &UpdateOrganizationBilling) -> Result<(), ValidationError> {
    let amounts = [
        ("custom_price", update.custom_price),
        ("base_price", update.base_price),
        ("discount_value", update.discount_value),
        ("promo_price", update.promo_price),
        ("setup_fee", update.setup_fee),
        ("per_location_fee", update.per_location_fee),
        ("per_user_fee", update.per_user_fee),
    ];
    for (field, value) in amounts {
        if value.is_some_and(|v| v < Decimal::ZERO) {
            return Err(validation_error(
                "negative_amount",
                format!("{} must not be negative", field),
            ));
        }
    }

    let limits = [
        ("included_locations", update.included_locations),
        ("included_users", update.included_users),
    ];
    for (field, value) in limits {
        if value.is_some_and(|v| v < UNLIMITED_SENTINEL || v > i64::from(MAX_INCLUDED_SEATS)) {
            return Err(validation_error(
                "limit_out_of_range",
                format!(
                    "{} must be -1 (unlimited) or between 0 and {}",
                    field, MAX_INCLUDED_SEATS
                ),
            ));
        }
    }

    let add_on_seats = [
        ("additional_locations_purchased", update.additional_locations_purchased),
        ("additional_users_purchased", update.additional_users_purchased),
    ];
    for (field, value) in add_on_seats {
        if value.is_some_and(|v| v > MAX_ADD_ON_SEATS) {
            return Err(validation_error(
                "add_on_seats_out_of_range",
                format!("{} must be at most {}", field, MAX_ADD_ON_SEATS),
            ));
        }
    }

    if update.discount_type.is_some() != update.discount_value.is_some() {
        return Err(validation_error(
            "incomplete_discount",
            "discount_type and discount_value must be set together".to_string(),
        ));
    }

    if update.discount_type == Some(DiscountType::Percentage)
        && update
            .discount_value
            .is_some_and(|v| v > Decimal::ONE_HUNDRED)
    {
        return Err(validation_error(
            "percentage_out_of_range",
            "Percentage discount must be between 0 and 100".to_string(),
        ));
    }

    if update.promo_price.is_some() != update.promo_ends_at.is_some() {
        return Err(validation_error(
            "incomplete_promo",
            "promo_price and promo_ends_at must be set together".to_string(),
        ));
    }

    Ok(())
}

impl UpdateOrganizationBilling {
    /// Merge into an existing record. Bounds are enforced by `validate()`, so
    /// callers go through `OrganizationBilling::apply_update`.
    pub fn apply_to(&self, billing: &mut OrganizationBilling) {
        if self.plan_id.is_some() {
            billing.plan_id = self.plan_id;
        }
        if let Some(cycle) = self.billing_cycle {
            billing.billing_cycle = cycle;
        }
        if self.custom_price.is_some() {
            billing.custom_price = self.custom_price;
        }
        if self.base_price.is_some() {
            billing.base_price = self.base_price;
        }

        if self.clear_discount {
            billing.discount_type = None;
            billing.discount_value = None;
        }
        if self.discount_type.is_some() {
            billing.discount_type = self.discount_type;
            billing.discount_value = self.discount_value;
        }

        if self.clear_promo {
            billing.promo_price = None;
            billing.promo_ends_at = None;
        }
        if self.promo_price.is_some() {
            billing.promo_price = self.promo_price;
            billing.promo_ends_at = self.promo_ends_at;
        }

        if self.trial_ends_at.is_some() {
            billing.trial_ends_at = self.trial_ends_at;
        }
        if let Some(fee) = self.setup_fee {
            billing.setup_fee = fee;
        }
        if let Some(paid) = self.setup_fee_paid {
            billing.setup_fee_paid = paid;
        }
        if let Some(fee) = self.per_location_fee {
            billing.per_location_fee = fee;
        }
        if let Some(fee) = self.per_user_fee {
            billing.per_user_fee = fee;
        }
        if let Some(included) = self.included_locations {
            billing.included_locations = Some(Limit::from(included));
        }
        if let Some(included) = self.included_users {
            billing.included_users = Some(Limit::from(included));
        }
        if let Some(seats) = self.additional_locations_purchased {
            billing.additional_locations_purchased = seats;
        }
        if let Some(seats) = self.additional_users_purchased {
            billing.additional_users_purchased = seats;
        }
    }
}
