use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::limit::Limit;

/// Catalog subscription tier with its list price and default seat limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionPlan {
    pub id: Uuid,
    pub name: String,
    #[schema(value_type = f64, example = 49.0)]
    pub price_monthly: Decimal,
    #[schema(value_type = Option<f64>)]
    #[serde(default)]
    pub price_annually: Option<Decimal>,
    /// `-1` or absent = unlimited
    #[schema(value_type = i64, example = 5)]
    #[serde(default)]
    pub max_users: Limit,
    /// `-1` or absent = unlimited
    #[schema(value_type = i64, example = 1)]
    #[serde(default)]
    pub max_locations: Limit,
    #[schema(value_type = Object)]
    #[serde(default)]
    pub features: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_or_null_limits_are_unlimited() {
        let plan: SubscriptionPlan = serde_json::from_value(serde_json::json!({
            "id": "0b8f0c52-6f0e-4a43-9d0a-4c3f3c2b1a09",
            "name": "Legacy",
            "price_monthly": 30,
            "max_users": null
        }))
        .unwrap();

        assert_eq!(plan.max_users, Limit::Unlimited);
        assert_eq!(plan.max_locations, Limit::Unlimited);
        assert_eq!(plan.features, serde_json::Value::Null);
    }

    #[test]
    fn test_limits_write_back_as_sentinel() {
        let plan: SubscriptionPlan = serde_json::from_value(serde_json::json!({
            "id": "0b8f0c52-6f0e-4a43-9d0a-4c3f3c2b1a09",
            "name": "Studio",
            "price_monthly": 49,
            "max_users": 5
        }))
        .unwrap();

        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["max_users"], 5);
        assert_eq!(json["max_locations"], -1);
    }
}
