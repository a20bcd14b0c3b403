use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A metric exactly as Cost Explorer reports it: a decimal string plus unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    #[serde(rename = "Amount")]
    pub amount: String,
    #[serde(rename = "Unit")]
    pub unit: String,
}

impl MetricValue {
    pub fn new(amount: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            unit: unit.into(),
        }
    }
}

/// One group's metrics within one time bucket of one region's response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRecord {
    pub region: String,
    pub estimated: bool,
    #[serde(rename = "time_start")]
    pub period_start: String,
    #[serde(rename = "time_end")]
    pub period_end: String,
    /// Usually a single key; one per `GroupBy` entry otherwise.
    #[serde(rename = "group")]
    pub group_keys: Vec<String>,
    pub blended_cost: MetricValue,
    pub unblended_cost: MetricValue,
    pub usage_quantity: MetricValue,
}

impl CostRecord {
    /// The label records are consolidated under: the first group key.
    pub fn group_label(&self) -> &str {
        self.group_keys.first().map(String::as_str).unwrap_or("")
    }
}

/// Running totals for every record sharing a group label.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedGroup {
    pub group_label: String,
    pub unblended_cost: Decimal,
    pub unblended_unit: String,
    pub usage_quantity: Decimal,
    pub usage_unit: String,
}
