//! Billing and capacity calculators for SalonFlow tenants
//!
//! Pure functions that price a subscription, evaluate seat capacity and run
//! the trial and promo countdowns, all against an injected evaluation time.
//! [`BillingOverviewService`] wires them to a
//! [`BillingDataSource`](salonflow_core::BillingDataSource).

pub mod capacity;
pub mod clock;
pub mod overview;
pub mod precedence;
pub mod pricing;
pub mod proration;
pub mod trial;

pub use capacity::{compute_capacity, OrganizationCapacity, ResourceCapacity, ResourceKind};
pub use overview::{BillingOverview, BillingOverviewService, PlanChangePreview};
pub use precedence::first_defined;
pub use pricing::{compute_billing, BillingCalculation};
pub use proration::{compute_proration, BillingPeriod, ProrationPreview};
pub use trial::{compute_promo_status, compute_trial_status, PromoStatus, TrialStatus, UrgencyLevel};

use salonflow_core::models::{
    BillingCycle, DiscountType, Organization, OrganizationBilling, SubscriptionPlan,
    SubscriptionStatus, UpdateOrganizationBilling, UsageSnapshot,
};
use utoipa::OpenApi;

/// OpenAPI components for the billing records
#[derive(OpenApi)]
#[openapi(
    info(title = "SalonFlow Billing", description = "Billing, capacity and trial records"),
    components(schemas(
        BillingCycle,
        DiscountType,
        SubscriptionStatus,
        SubscriptionPlan,
        Organization,
        OrganizationBilling,
        UpdateOrganizationBilling,
        UsageSnapshot,
        BillingCalculation,
        ResourceKind,
        ResourceCapacity,
        OrganizationCapacity,
        UrgencyLevel,
        TrialStatus,
        PromoStatus,
        BillingPeriod,
        ProrationPreview,
        BillingOverview,
        PlanChangePreview,
    ))
)]
pub struct BillingApiDoc;
