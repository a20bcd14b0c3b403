use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::models::cost::MetricValue;
use crate::core::query::{CostQuery, Granularity, GroupBy};

pub const TARGET_GET_COST_AND_USAGE: &str = "AWSInsightsIndexService.GetCostAndUsage";

pub const METRIC_BLENDED_COST: &str = "BlendedCost";
pub const METRIC_UNBLENDED_COST: &str = "UnblendedCost";
pub const METRIC_USAGE_QUANTITY: &str = "UsageQuantity";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DateInterval {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetCostAndUsageRequest {
    pub time_period: DateInterval,
    pub granularity: Granularity,
    pub metrics: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<GroupBy>,
}

impl GetCostAndUsageRequest {
    pub fn from_query(query: &CostQuery) -> Self {
        Self {
            time_period: DateInterval {
                start: query.start(),
                end: query.end(),
            },
            granularity: query.granularity,
            metrics: vec![
                METRIC_BLENDED_COST.to_string(),
                METRIC_UNBLENDED_COST.to_string(),
                METRIC_USAGE_QUANTITY.to_string(),
            ],
            group_by: query.group_by.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetCostAndUsageResponse {
    #[serde(default)]
    pub results_by_time: Vec<ResultByTime>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultByTime {
    pub time_period: DateInterval,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub estimated: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Group {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub metrics: HashMap<String, MetricValue>,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(rename = "__type")]
    pub error_type: Option<String>,
    #[serde(alias = "Message")]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Error code without the `namespace#` prefix.
    pub fn code(&self) -> String {
        self.error_type
            .as_deref()
            .map(|t| t.rsplit('#').next().unwrap_or(t).to_string())
            .unwrap_or_else(|| "UnknownError".to_string())
    }
}
