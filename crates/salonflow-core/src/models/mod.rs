//! Data models for billing
//!
//! Plans, per-organization billing overrides, organizations and usage
//! snapshots, plus the `Limit` type every seat limit is normalized into.

mod billing;
mod limit;
mod organization;
mod plan;
mod usage;

pub use billing::*;
pub use limit::*;
pub use organization::*;
pub use plan::*;
pub use usage::*;
