use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Live resource counts for an organization, recomputed on every read
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UsageSnapshot {
    #[serde(default)]
    pub location_count: u32,
    #[serde(default)]
    pub user_count: u32,
}

impl UsageSnapshot {
    pub fn new(location_count: u32, user_count: u32) -> Self {
        Self {
            location_count,
            user_count,
        }
    }
}
