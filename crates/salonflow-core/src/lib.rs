//! SalonFlow Core Library
//!
//! This crate provides the billing domain models, error types, configuration and
//! data-source hooks shared by the billing calculators and the CLI.

pub mod config;
pub mod constants;
pub mod error;
pub mod hooks;
pub mod models;

// Re-export commonly used types
pub use config::{BillingConfig, OutputFormat};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use hooks::{BillingDataSource, BillingFixture, InMemoryBillingSource, TenantFixture};
