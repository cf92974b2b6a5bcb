//! Configuration module
//!
//! Billing configuration read from the environment (and `.env` via dotenvy).
//! The calculators take the evaluation time explicitly; this is the one place
//! that decides whether "now" is the system clock or a pinned override.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::constants::DEFAULT_CURRENCY;

/// How CLI output is rendered
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow::anyhow!("Invalid output format: {}", s)),
        }
    }
}

/// Billing configuration
#[derive(Clone, Debug)]
pub struct BillingConfig {
    pub environment: String,
    pub currency: String,
    pub output_format: OutputFormat,
    /// Pinned evaluation time; `None` means the system clock.
    pub evaluation_time: Option<DateTime<Utc>>,
    pub fixture_path: Option<PathBuf>,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            output_format: OutputFormat::default(),
            evaluation_time: None,
            fixture_path: None,
        }
    }
}

impl BillingConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let evaluation_time = match lookup("BILLING_EVALUATION_TIME").filter(|s| !s.is_empty()) {
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(raw.trim())
                    .map_err(|e| {
                        anyhow::anyhow!("BILLING_EVALUATION_TIME must be RFC 3339: {}", e)
                    })?
                    .with_timezone(&Utc),
            ),
            None => None,
        };

        let output_format = match lookup("BILLING_OUTPUT_FORMAT").filter(|s| !s.is_empty()) {
            Some(raw) => raw.parse()?,
            None => OutputFormat::default(),
        };

        let config = BillingConfig {
            environment,
            currency: lookup("BILLING_CURRENCY")
                .filter(|s| !s.is_empty())
                .map(|s| s.trim().to_uppercase())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            output_format,
            evaluation_time,
            fixture_path: lookup("BILLING_FIXTURE_PATH")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(anyhow::anyhow!(
                "BILLING_CURRENCY must be a three-letter ISO code, got '{}'",
                self.currency
            ));
        }

        if self.is_production() && self.evaluation_time.is_some() {
            return Err(anyhow::anyhow!(
                "BILLING_EVALUATION_TIME cannot be set in production"
            ));
        }

        Ok(())
    }

    /// Evaluation time: the pinned override, or the system clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.evaluation_time.unwrap_or_else(Utc::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = BillingConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.environment, "development");
        assert_eq!(config.currency, "USD");
        assert_eq!(config.output_format, OutputFormat::Table);
        assert!(config.evaluation_time.is_none());
        assert!(config.fixture_path.is_none());
    }

    #[test]
    fn test_evaluation_time_override_pins_now() {
        let config = BillingConfig::from_lookup(lookup_from(&[(
            "BILLING_EVALUATION_TIME",
            "2026-03-01T12:00:00Z",
        )]))
        .unwrap();
        let pinned = DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(config.now(), pinned);
    }

    #[test]
    fn test_invalid_evaluation_time_rejected() {
        let result =
            BillingConfig::from_lookup(lookup_from(&[("BILLING_EVALUATION_TIME", "yesterday")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_currency_is_normalized_and_validated() {
        let config =
            BillingConfig::from_lookup(lookup_from(&[("BILLING_CURRENCY", "eur")])).unwrap();
        assert_eq!(config.currency, "EUR");

        assert!(BillingConfig::from_lookup(lookup_from(&[("BILLING_CURRENCY", "EURO")])).is_err());
    }

    #[test]
    fn test_pinned_clock_rejected_in_production() {
        let result = BillingConfig::from_lookup(lookup_from(&[
            ("APP_ENV", "prod"),
            ("BILLING_EVALUATION_TIME", "2026-03-01T12:00:00Z"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
