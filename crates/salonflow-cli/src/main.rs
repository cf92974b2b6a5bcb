//! SalonFlow billing CLI: price, capacity and trial reports from a fixture file.
//!
//! Settings come from the environment (see `BillingConfig`); flags override them.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::OpenApi;
use uuid::Uuid;

use salonflow_billing::{
    BillingApiDoc, BillingOverview, BillingOverviewService, BillingPeriod, PlanChangePreview,
};
use salonflow_cli::{
    describe_error, format_money, format_percent, format_usage, init_tracing, truncate_string,
};
use salonflow_core::models::BillingCycle;
use salonflow_core::{AppError, BillingConfig, InMemoryBillingSource, OutputFormat};

#[derive(Parser)]
#[command(name = "salonflow-billing", about = "SalonFlow billing calculator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price, capacity and trial status for tenants in a fixture
    Overview {
        /// Fixture JSON file (defaults to BILLING_FIXTURE_PATH)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Only this organization
        #[arg(long, value_name = "UUID")]
        org: Option<Uuid>,
        /// Output format: table or json
        #[arg(long)]
        format: Option<OutputFormat>,
        /// Evaluation time (RFC 3339)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Preview a plan change with proration over the current period
    Prorate {
        /// Target plan UUID
        #[arg(long, value_name = "UUID")]
        to_plan: Uuid,
        /// New billing cycle: monthly, quarterly, semi_annual or annual
        #[arg(long)]
        cycle: Option<BillingCycle>,
        /// Current period start (RFC 3339)
        #[arg(long)]
        period_start: DateTime<Utc>,
        /// Current period end (RFC 3339)
        #[arg(long)]
        period_end: DateTime<Utc>,
        /// Organization UUID; optional when the fixture holds one tenant
        #[arg(long, value_name = "UUID")]
        org: Option<Uuid>,
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        format: Option<OutputFormat>,
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Print the OpenAPI components for the billing records
    Schema,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

fn load_source(
    input: Option<PathBuf>,
    config: &BillingConfig,
) -> anyhow::Result<InMemoryBillingSource> {
    let path = input
        .or_else(|| config.fixture_path.clone())
        .ok_or_else(|| {
            AppError::Configuration(
                "No input file. Pass --input or set BILLING_FIXTURE_PATH".to_string(),
            )
        })?;
    InMemoryBillingSource::from_path(&path)
        .with_context(|| format!("Failed to load fixture {}", path.display()))
}

fn select_organizations(
    source: &InMemoryBillingSource,
    org: Option<Uuid>,
) -> anyhow::Result<Vec<Uuid>> {
    let ids = source.organization_ids();
    match org {
        Some(id) if ids.contains(&id) => Ok(vec![id]),
        Some(id) => bail!("Organization {} is not in the fixture", id),
        None if ids.is_empty() => bail!("Fixture contains no tenants"),
        None => Ok(ids),
    }
}

fn print_overview_table(overview: &BillingOverview, currency: &str) {
    let billing = &overview.billing;
    let capacity = &overview.capacity;
    let money = |amount| format_money(amount, currency);

    println!("\n=== {} ===\n", truncate_string(&overview.organization.name, 48));
    println!("Organization: {}", overview.organization.id);
    println!(
        "Plan:         {}",
        overview
            .plan
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("(none)")
    );
    println!("Evaluated at: {}", overview.evaluated_at.to_rfc3339());

    println!("\n--- Pricing ({}) ---", billing.billing_cycle);
    println!("Monthly:        {:>18}", money(billing.monthly_amount));
    println!("Effective:      {:>18}", money(billing.effective_monthly_amount));
    println!("Per cycle:      {:>18}", money(billing.cycle_amount));
    println!("Annual:         {:>18}", money(billing.annual_amount));
    if billing.savings_amount > Decimal::ZERO {
        println!(
            "Cycle savings:  {:>18} ({}%)",
            money(billing.savings_amount),
            billing.savings_percentage
        );
    }
    if billing.is_in_promo {
        println!("Promo savings:  {:>18}", money(billing.promo_savings));
    }
    if billing.discount_savings > Decimal::ZERO {
        println!("Discount:       {:>18}", money(billing.discount_savings));
    }
    if billing.seat_fees() > Decimal::ZERO {
        println!("Seat fees:      {:>18}", money(billing.seat_fees()));
    }
    println!("Setup fee due:  {:>18}", money(billing.setup_fee_due));
    println!("First invoice:  {:>18}", money(billing.first_invoice_amount));

    println!("\n--- Capacity ---");
    for (label, resource) in [("Locations", &capacity.locations), ("Users", &capacity.users)] {
        let flag = if resource.is_over_limit {
            "  OVER LIMIT"
        } else if resource.is_near_limit {
            "  near limit"
        } else {
            ""
        };
        println!(
            "{:<10} {:>16} {:>6}{}",
            label,
            format_usage(resource.used, resource.total),
            format_percent(resource.utilization),
            flag
        );
    }
    println!("Add-on cost:    {:>18}", money(capacity.total_add_on_cost));

    let trial = &overview.trial;
    if trial.is_in_trial {
        println!("\n--- Trial ---");
        println!(
            "Ends {} ({} days, {} hours left, {})",
            trial
                .trial_ends_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
            trial.days_remaining.unwrap_or(0),
            trial.hours_remaining.unwrap_or(0),
            trial.urgency_level
        );
    }
    let promo = &overview.promo;
    if promo.is_active {
        println!("\n--- Promo ---");
        println!(
            "Ends {} ({} days left, {})",
            promo
                .promo_ends_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
            promo.days_remaining.unwrap_or(0),
            promo.urgency_level
        );
    }
}

fn print_preview_table(preview: &PlanChangePreview, currency: &str) {
    let money = |amount| format_money(amount, currency);
    let proration = &preview.proration;

    println!("\n=== Plan change for {} ===\n", preview.organization_id);
    println!(
        "From: {} ({})",
        preview
            .current_plan
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("(none)"),
        preview.current.billing_cycle
    );
    println!(
        "To:   {} ({})",
        preview.target_plan.name, preview.proposed.billing_cycle
    );
    println!(
        "Period: {} .. {}",
        proration.period.start.to_rfc3339(),
        proration.period.end.to_rfc3339()
    );
    println!("\nCurrent cycle:   {:>18}", money(preview.current.cycle_amount));
    println!("Proposed cycle:  {:>18}", money(preview.proposed.cycle_amount));
    println!(
        "Remaining:       {:>18}",
        format_percent(proration.remaining_fraction.to_f64().unwrap_or(0.0))
    );
    println!("Unused credit:   {:>18}", money(proration.unused_credit));
    println!("Prorated charge: {:>18}", money(proration.prorated_charge));
    println!("Net due:         {:>18}", money(proration.net_amount));
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", describe_error(&err));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = BillingConfig::from_env()
        .map_err(|e| AppError::Configuration(format!("{:#}", e)))?;

    match cli.command {
        Commands::Overview {
            input,
            org,
            format,
            at,
        } => {
            let source = load_source(input, &config)?;
            let org_ids = select_organizations(&source, org)?;
            let now = at.unwrap_or_else(|| config.now());
            let service = BillingOverviewService::new(Arc::new(source));

            let mut overviews = Vec::with_capacity(org_ids.len());
            for org_id in org_ids {
                let overview = service
                    .overview(org_id, now)
                    .await
                    .with_context(|| format!("Failed to compute overview for {}", org_id))?;
                overviews.push(overview);
            }

            match format.unwrap_or(config.output_format) {
                OutputFormat::Json => print_json(&overviews)?,
                OutputFormat::Table => {
                    for overview in &overviews {
                        print_overview_table(overview, &config.currency);
                    }
                }
            }
        }
        Commands::Prorate {
            to_plan,
            cycle,
            period_start,
            period_end,
            org,
            input,
            format,
            at,
        } => {
            let source = load_source(input, &config)?;
            let org_id = match select_organizations(&source, org)?.as_slice() {
                [only] => *only,
                _ => bail!("Fixture holds several tenants; pass --org"),
            };
            let period = BillingPeriod::new(period_start, period_end)?;
            let now = at.unwrap_or_else(|| config.now());
            let service = BillingOverviewService::new(Arc::new(source));

            let preview = service
                .preview_plan_change(org_id, to_plan, cycle, period, now)
                .await
                .with_context(|| format!("Failed to preview plan change for {}", org_id))?;

            match format.unwrap_or(config.output_format) {
                OutputFormat::Json => print_json(&preview)?,
                OutputFormat::Table => print_preview_table(&preview, &config.currency),
            }
        }
        Commands::Schema => {
            let doc = BillingApiDoc::openapi();
            let out = doc.to_pretty_json().context("Serialize OpenAPI document")?;
            println!("{}", out);
        }
    }

    Ok(())
}
