use rust_decimal::{Decimal, RoundingStrategy};
use salonflow_core::models::Limit;
use salonflow_core::{AppError, ErrorMetadata};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Money rounded to cents with its currency code, e.g. `1,234.50 USD`.
pub fn format_money(amount: Decimal, currency: &str) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let fixed = format!("{:.2}", rounded.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{}{}.{} {}", sign, grouped, cents, currency)
}

/// `used / total` for a seat resource.
pub fn format_usage(used: u32, total: Limit) -> String {
    match total {
        Limit::Unlimited => format!("{} / unlimited", used),
        Limit::Limited(n) => format!("{} / {}", used, n),
    }
}

pub fn format_percent(ratio: f64) -> String {
    format!("{:.0}%", ratio * 100.0)
}

/// Render a command failure for stderr.
///
/// Billing errors report their code and client message, plus the full chain
/// when it says more and a hint when one exists. Other errors print their chain.
pub fn describe_error(err: &anyhow::Error) -> String {
    let full = format!("{:#}", err);
    let Some(app) = err.chain().find_map(|e| e.downcast_ref::<AppError>()) else {
        return format!("error: {}", full);
    };

    let message = app.client_message();
    let mut out = format!("error [{}]: {}", app.error_code(), message);
    if full != message {
        out.push_str(&format!("\n  detail: {}", full));
    }
    if let Some(action) = app.suggested_action() {
        out.push_str(&format!("\n  hint: {}", action));
    }
    out
}

/// Initialize tracing for CLI binaries.
///
/// Logs go to stderr so JSON output on stdout stays parseable. `LOG_FORMAT=json`
/// switches to structured log lines.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_string_short() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("", 5), "");
    }

    #[test]
    fn truncate_string_long() {
        assert_eq!(truncate_string("Glow Beauty Collective", 10), "Glow Be...");
        assert_eq!(truncate_string("Café Coupe", 6), "Caf...");
    }

    #[test]
    fn format_money_groups_thousands() {
        assert_eq!(format_money(Decimal::from(960), "USD"), "960.00 USD");
        assert_eq!(format_money(Decimal::new(123450, 2), "EUR"), "1,234.50 EUR");
        assert_eq!(format_money(Decimal::new(1000000005, 3), "USD"), "1,000,000.01 USD");
    }

    #[test]
    fn format_money_negative_and_zero() {
        assert_eq!(format_money(Decimal::new(-2050, 2), "USD"), "-20.50 USD");
        assert_eq!(format_money(Decimal::ZERO, "USD"), "0.00 USD");
        assert_eq!(format_money(Decimal::new(-1, 3), "USD"), "0.00 USD");
    }

    #[test]
    fn describe_error_reports_code_and_hint() {
        let err = anyhow::Error::new(AppError::Configuration(
            "No input file. Pass --input or set BILLING_FIXTURE_PATH".to_string(),
        ));
        assert_eq!(
            describe_error(&err),
            "error [CONFIGURATION_ERROR]: Billing is misconfigured\n  \
             detail: Configuration error: No input file. Pass --input or set BILLING_FIXTURE_PATH\n  \
             hint: Check environment configuration"
        );
    }

    #[test]
    fn describe_error_finds_billing_error_under_context() {
        let err = anyhow::Error::new(AppError::PlanNotFound("Plan 42 not found".to_string()))
            .context("Failed to preview plan change");
        let out = describe_error(&err);

        assert!(out.starts_with("error [PLAN_NOT_FOUND]: Plan 42 not found\n"));
        assert!(out.contains("detail: Failed to preview plan change: Plan not found: Plan 42"));
        assert!(out.ends_with("hint: Verify the plan ID exists"));
    }

    #[test]
    fn describe_error_plain_chain() {
        let err = anyhow::anyhow!("Fixture contains no tenants");
        assert_eq!(describe_error(&err), "error: Fixture contains no tenants");
    }

    #[test]
    fn format_usage_and_percent() {
        assert_eq!(format_usage(3, Limit::Limited(5)), "3 / 5");
        assert_eq!(format_usage(3, Limit::Unlimited), "3 / unlimited");
        assert_eq!(format_percent(0.8), "80%");
    }
}
