//! Hooks for billing data access
//!
//! The calculators are pure; fetching plans, billing records and live usage
//! counts belongs to whatever backs the product (a hosted Postgres REST API in
//! production). This module defines that seam as a trait, plus an in-memory
//! implementation loaded from a JSON fixture for the CLI and tests.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Organization, OrganizationBilling, SubscriptionPlan, UsageSnapshot};

/// Source of the records the billing calculators read
#[async_trait]
pub trait BillingDataSource: Send + Sync {
    /// Fetch an organization
    async fn organization(&self, organization_id: Uuid) -> Result<Option<Organization>, AppError>;

    /// Fetch an organization's billing override record, if one was configured
    async fn billing(
        &self,
        organization_id: Uuid,
    ) -> Result<Option<OrganizationBilling>, AppError>;

    /// Fetch a catalog plan
    async fn plan(&self, plan_id: Uuid) -> Result<Option<SubscriptionPlan>, AppError>;

    /// Count active locations and users right now
    async fn usage(&self, organization_id: Uuid) -> Result<UsageSnapshot, AppError>;
}

/// One tenant's records in a fixture file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantFixture {
    pub organization: Organization,
    #[serde(default)]
    pub billing: Option<OrganizationBilling>,
    #[serde(default)]
    pub usage: UsageSnapshot,
}

/// JSON fixture: a plan catalog plus tenants
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillingFixture {
    #[serde(default)]
    pub plans: Vec<SubscriptionPlan>,
    #[serde(default)]
    pub tenants: Vec<TenantFixture>,
}

/// In-memory data source
#[derive(Debug, Clone, Default)]
pub struct InMemoryBillingSource {
    plans: HashMap<Uuid, SubscriptionPlan>,
    tenants: HashMap<Uuid, TenantFixture>,
}

impl InMemoryBillingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: BillingFixture) -> Self {
        let mut source = Self::new();
        for plan in fixture.plans {
            source = source.with_plan(plan);
        }
        for tenant in fixture.tenants {
            source = source.with_tenant(tenant);
        }
        source
    }

    pub fn from_json_str(json: &str) -> Result<Self, AppError> {
        let fixture: BillingFixture = serde_json::from_str(json)?;
        Ok(Self::from_fixture(fixture))
    }

    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        let source = Self::from_json_str(&raw)?;
        tracing::debug!(
            path = %path.display(),
            plans = source.plans.len(),
            tenants = source.tenants.len(),
            "Loaded billing fixture"
        );
        Ok(source)
    }

    pub fn with_plan(mut self, plan: SubscriptionPlan) -> Self {
        self.plans.insert(plan.id, plan);
        self
    }

    pub fn with_tenant(mut self, tenant: TenantFixture) -> Self {
        self.tenants.insert(tenant.organization.id, tenant);
        self
    }

    /// Organization ids in the fixture, sorted for stable output
    pub fn organization_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.tenants.keys().copied().collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl BillingDataSource for InMemoryBillingSource {
    async fn organization(&self, organization_id: Uuid) -> Result<Option<Organization>, AppError> {
        Ok(self
            .tenants
            .get(&organization_id)
            .map(|t| t.organization.clone()))
    }

    async fn billing(
        &self,
        organization_id: Uuid,
    ) -> Result<Option<OrganizationBilling>, AppError> {
        Ok(self
            .tenants
            .get(&organization_id)
            .and_then(|t| t.billing.clone()))
    }

    async fn plan(&self, plan_id: Uuid) -> Result<Option<SubscriptionPlan>, AppError> {
        Ok(self.plans.get(&plan_id).cloned())
    }

    async fn usage(&self, organization_id: Uuid) -> Result<UsageSnapshot, AppError> {
        self.tenants
            .get(&organization_id)
            .map(|t| t.usage)
            .ok_or_else(|| AppError::OrganizationNotFound(organization_id.to_string()))
    }
}
