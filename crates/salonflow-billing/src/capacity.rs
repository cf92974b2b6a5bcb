//! Capacity evaluator
//!
//! Reports how much of each seat resource an organization is using against
//! its included plus purchased allowance.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use salonflow_core::constants::NEAR_LIMIT_UTILIZATION;
use salonflow_core::error::AppError;
use salonflow_core::models::{Limit, OrganizationBilling, SubscriptionPlan, UsageSnapshot};

use crate::precedence::first_defined;

/// Seat resource tracked against a limit
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Locations,
    Users,
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ResourceKind::Locations => write!(f, "locations"),
            ResourceKind::Users => write!(f, "users"),
        }
    }
}

impl FromStr for ResourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "locations" => Ok(ResourceKind::Locations),
            "users" => Ok(ResourceKind::Users),
            _ => Err(anyhow::anyhow!("Invalid resource kind: {}", s)),
        }
    }
}

/// Usage of one resource against its allowance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResourceCapacity {
    pub used: u32,
    /// Included allowance before purchased add-ons
    #[schema(value_type = i64)]
    pub included: Limit,
    pub purchased: u32,
    #[schema(value_type = i64)]
    pub total: Limit,
    #[schema(value_type = i64)]
    pub remaining: Limit,
    pub utilization: f64,
    pub is_unlimited: bool,
    pub is_over_limit: bool,
    pub is_near_limit: bool,
    #[schema(value_type = f64)]
    pub cost_per_month: Decimal,
}

impl ResourceCapacity {
    fn evaluate(base: Limit, purchased: u32, used: u32, per_seat_fee: Decimal) -> Self {
        let total = base.plus(purchased);
        let utilization = total.utilization(used);
        Self {
            used,
            included: base,
            purchased,
            total,
            remaining: total.headroom(used),
            utilization,
            is_unlimited: total.is_unlimited(),
            is_over_limit: total.is_exceeded_by(used),
            is_near_limit: utilization > NEAR_LIMIT_UTILIZATION,
            cost_per_month: Decimal::from(purchased).saturating_mul(per_seat_fee),
        }
    }

    fn unlimited(used: u32) -> Self {
        Self::evaluate(Limit::Unlimited, 0, used, Decimal::ZERO)
    }

    /// Whether `count` more units still fit under the total.
    pub fn can_add(&self, count: u32) -> bool {
        match self.total {
            Limit::Unlimited => true,
            Limit::Limited(total) => self.used.saturating_add(count) <= total,
        }
    }
}

/// Capacity across all tracked resources of an organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrganizationCapacity {
    pub locations: ResourceCapacity,
    pub users: ResourceCapacity,
    pub is_over_limit: bool,
    pub is_near_limit: bool,
    #[schema(value_type = f64)]
    pub total_add_on_cost: Decimal,
}

impl OrganizationCapacity {
    fn from_resources(locations: ResourceCapacity, users: ResourceCapacity) -> Self {
        Self {
            is_over_limit: locations.is_over_limit || users.is_over_limit,
            is_near_limit: locations.is_near_limit || users.is_near_limit,
            total_add_on_cost: locations
                .cost_per_month
                .saturating_add(users.cost_per_month),
            locations,
            users,
        }
    }

    pub fn resource(&self, kind: ResourceKind) -> &ResourceCapacity {
        match kind {
            ResourceKind::Locations => &self.locations,
            ResourceKind::Users => &self.users,
        }
    }

    /// Check that `count` more units of `kind` fit before creating them
    pub fn ensure_can_add(&self, kind: ResourceKind, count: u32) -> Result<(), AppError> {
        let resource = self.resource(kind);
        if resource.can_add(count) {
            return Ok(());
        }
        Err(AppError::UsageLimitExceeded {
            resource: kind.to_string(),
            used: i64::from(resource.used),
            limit: resource.total.as_sentinel(),
        })
    }

    pub fn can_add_location(&self) -> bool {
        self.locations.can_add(1)
    }

    pub fn can_add_user(&self) -> bool {
        self.users.can_add(1)
    }
}

/// Evaluate an organization's usage against its plan and billing overrides.
///
/// Without a plan both resources are unlimited and free.
pub fn compute_capacity(
    billing: Option<&OrganizationBilling>,
    plan: Option<&SubscriptionPlan>,
    usage: UsageSnapshot,
) -> OrganizationCapacity {
    let Some(plan) = plan else {
        return OrganizationCapacity::from_resources(
            ResourceCapacity::unlimited(usage.location_count),
            ResourceCapacity::unlimited(usage.user_count),
        );
    };

    let locations = ResourceCapacity::evaluate(
        first_defined([billing.and_then(|b| b.included_locations), Some(plan.max_locations)])
            .unwrap_or(Limit::Unlimited),
        billing.map_or(0, |b| b.additional_locations_purchased),
        usage.location_count,
        billing.map_or(Decimal::ZERO, |b| b.per_location_fee),
    );
    let users = ResourceCapacity::evaluate(
        first_defined([billing.and_then(|b| b.included_users), Some(plan.max_users)])
            .unwrap_or(Limit::Unlimited),
        billing.map_or(0, |b| b.additional_users_purchased),
        usage.user_count,
        billing.map_or(Decimal::ZERO, |b| b.per_user_fee),
    );

    let capacity = OrganizationCapacity::from_resources(locations, users);
    if capacity.is_over_limit {
        warn!(
            plan = %plan.name,
            locations_used = capacity.locations.used,
            locations_total = %capacity.locations.total,
            users_used = capacity.users.used,
            users_total = %capacity.users.total,
            "Organization is over its plan limits"
        );
    }
    capacity
}
