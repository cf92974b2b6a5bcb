//! Billing overview service
//!
//! Loads an organization's records through a [`BillingDataSource`] and runs the
//! calculators over them. This is the only async layer in the crate.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use salonflow_core::error::AppError;
use salonflow_core::hooks::BillingDataSource;
use salonflow_core::models::{
    BillingCycle, Organization, OrganizationBilling, SubscriptionPlan, UsageSnapshot,
};

use crate::capacity::{compute_capacity, OrganizationCapacity};
use crate::precedence::first_defined;
use crate::pricing::{compute_billing, BillingCalculation};
use crate::proration::{compute_proration, BillingPeriod, ProrationPreview};
use crate::trial::{compute_promo_status, compute_trial_status, PromoStatus, TrialStatus};

/// Everything the billing screen shows for one organization
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BillingOverview {
    pub organization: Organization,
    pub plan: Option<SubscriptionPlan>,
    pub usage: UsageSnapshot,
    pub evaluated_at: DateTime<Utc>,
    pub billing: BillingCalculation,
    pub capacity: OrganizationCapacity,
    pub trial: TrialStatus,
    pub promo: PromoStatus,
}

/// Current and proposed pricing for a plan or cycle change
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlanChangePreview {
    pub organization_id: Uuid,
    pub current_plan: Option<SubscriptionPlan>,
    pub target_plan: SubscriptionPlan,
    pub current: BillingCalculation,
    pub proposed: BillingCalculation,
    pub proration: ProrationPreview,
}

/// Records loaded for one organization
struct TenantRecords {
    organization: Organization,
    billing: Option<OrganizationBilling>,
    plan: Option<SubscriptionPlan>,
    usage: UsageSnapshot,
}

pub struct BillingOverviewService {
    source: Arc<dyn BillingDataSource>,
}

impl BillingOverviewService {
    pub fn new(source: Arc<dyn BillingDataSource>) -> Self {
        Self { source }
    }

    async fn load(&self, organization_id: Uuid) -> Result<TenantRecords, AppError> {
        let organization = self
            .source
            .organization(organization_id)
            .await?
            .ok_or_else(|| AppError::OrganizationNotFound(organization_id.to_string()))?;
        let billing = self.source.billing(organization_id).await?;
        let usage = self.source.usage(organization_id).await?;

        let plan_id = first_defined([
            billing.as_ref().and_then(|b| b.plan_id),
            organization.plan_id,
        ]);
        let plan = match plan_id {
            Some(plan_id) => {
                let plan = self.source.plan(plan_id).await?;
                if plan.is_none() {
                    debug!(%organization_id, %plan_id, "Referenced plan not in catalog");
                }
                plan
            }
            None => None,
        };

        Ok(TenantRecords {
            organization,
            billing,
            plan,
            usage,
        })
    }

    /// Price, capacity and countdowns for an organization at `now`
    #[instrument(skip(self))]
    pub async fn overview(
        &self,
        organization_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<BillingOverview, AppError> {
        let records = self.load(organization_id).await?;
        let billing = records.billing.as_ref();
        let plan = records.plan.as_ref();

        let calculation = compute_billing(
            billing,
            plan,
            records.usage.location_count,
            records.usage.user_count,
            now,
        );
        let capacity = compute_capacity(billing, plan, records.usage);
        let trial = compute_trial_status(Some(&records.organization), billing, &calculation, now);
        let promo = compute_promo_status(billing, now);

        debug!(
            %organization_id,
            cycle_amount = %calculation.cycle_amount,
            is_over_limit = capacity.is_over_limit,
            is_in_trial = trial.is_in_trial,
            "Computed billing overview"
        );

        Ok(BillingOverview {
            organization: records.organization,
            plan: records.plan,
            usage: records.usage,
            evaluated_at: now,
            billing: calculation,
            capacity,
            trial,
            promo,
        })
    }

    /// Price a switch to `target_plan_id` (and optionally another cycle), with
    /// proration over `period`.
    ///
    /// The proposed calculation keeps the organization's overrides except the
    /// price overrides, which belong to the current plan.
    #[instrument(skip(self))]
    pub async fn preview_plan_change(
        &self,
        organization_id: Uuid,
        target_plan_id: Uuid,
        cycle: Option<BillingCycle>,
        period: BillingPeriod,
        now: DateTime<Utc>,
    ) -> Result<PlanChangePreview, AppError> {
        let records = self.load(organization_id).await?;
        let target_plan = self
            .source
            .plan(target_plan_id)
            .await?
            .ok_or_else(|| AppError::PlanNotFound(target_plan_id.to_string()))?;

        let current = compute_billing(
            records.billing.as_ref(),
            records.plan.as_ref(),
            records.usage.location_count,
            records.usage.user_count,
            now,
        );

        let mut proposed_billing = records
            .billing
            .clone()
            .unwrap_or_else(|| OrganizationBilling::new(organization_id, target_plan_id));
        proposed_billing.plan_id = Some(target_plan_id);
        proposed_billing.custom_price = None;
        proposed_billing.base_price = None;
        if let Some(cycle) = cycle {
            proposed_billing.billing_cycle = cycle;
        }

        let proposed = compute_billing(
            Some(&proposed_billing),
            Some(&target_plan),
            records.usage.location_count,
            records.usage.user_count,
            now,
        );
        let proration = compute_proration(&current, &proposed, period, now);

        Ok(PlanChangePreview {
            organization_id,
            current_plan: records.plan,
            target_plan,
            current,
            proposed,
            proration,
        })
    }
}
