pub mod api;
pub mod client;
pub mod sigv4;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::models::cost::{CostRecord, MetricValue};
use crate::core::query::CostQuery;
use api::{GetCostAndUsageRequest, GetCostAndUsageResponse, Group};

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("invalid Cost Explorer endpoint '{0}': must be an https:// URL")]
    InvalidEndpoint(String),
    #[error("HTTP request to Cost Explorer failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to encode or decode Cost Explorer JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Cost Explorer returned HTTP {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    #[error("group {group:?} is missing the {metric} metric")]
    MissingMetric { metric: &'static str, group: String },
    #[error("cost query failed for region {region}")]
    Region {
        region: String,
        #[source]
        source: Box<BillingError>,
    },
}

/// Anything that can answer a `GetCostAndUsage` request for a region.
#[async_trait]
pub trait CostSource {
    async fn get_cost_and_usage(
        &self,
        region: &str,
        request: &GetCostAndUsageRequest,
    ) -> Result<GetCostAndUsageResponse, BillingError>;
}

/// Query every region in order and flatten the responses into records.
///
/// Regions are queried one at a time. The first failing region aborts the
/// whole pass and nothing gathered so far is returned.
pub async fn get_costs<S>(source: &S, query: &CostQuery) -> Result<Vec<CostRecord>, BillingError>
where
    S: CostSource + ?Sized + Sync,
{
    let request = GetCostAndUsageRequest::from_query(query);
    let mut costs = Vec::new();

    for region in &query.regions {
        tracing::debug!(region = %region, "querying cost and usage");
        let result = source
            .get_cost_and_usage(region, &request)
            .await
            .and_then(|response| normalize_response(region, response));
        match result {
            Ok(records) => {
                tracing::debug!(region = %region, records = records.len(), "region done");
                costs.extend(records);
            }
            Err(e) => {
                tracing::error!(region = %region, error = %e, "cost query failed, aborting");
                return Err(BillingError::Region {
                    region: region.clone(),
                    source: Box::new(e),
                });
            }
        }
    }

    Ok(costs)
}

/// One record per group per time bucket, in response order.
pub fn normalize_response(
    region: &str,
    response: GetCostAndUsageResponse,
) -> Result<Vec<CostRecord>, BillingError> {
    if response.next_page_token.is_some() {
        tracing::debug!(region, "response has a NextPageToken; later pages are not fetched");
    }

    let mut records = Vec::new();
    for bucket in response.results_by_time {
        for mut group in bucket.groups {
            let blended_cost = take_metric(&mut group, api::METRIC_BLENDED_COST)?;
            let unblended_cost = take_metric(&mut group, api::METRIC_UNBLENDED_COST)?;
            let usage_quantity = take_metric(&mut group, api::METRIC_USAGE_QUANTITY)?;
            records.push(CostRecord {
                region: region.to_string(),
                estimated: bucket.estimated,
                period_start: bucket.time_period.start.clone(),
                period_end: bucket.time_period.end.clone(),
                group_keys: group.keys,
                blended_cost,
                unblended_cost,
                usage_quantity,
            });
        }
    }
    Ok(records)
}

fn take_metric(group: &mut Group, metric: &'static str) -> Result<MetricValue, BillingError> {
    group
        .metrics
        .remove(metric)
        .ok_or_else(|| BillingError::MissingMetric {
            metric,
            group: group.keys.join(","),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::query::{Granularity, GroupBy};
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned responses per region and records the call order.
    struct FakeSource {
        responses: HashMap<String, String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn new(responses: &[(&str, String)]) -> Self {
            Self {
                responses: responses
                    .iter()
                    .map(|(r, body)| (r.to_string(), body.clone()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CostSource for FakeSource {
        async fn get_cost_and_usage(
            &self,
            region: &str,
            request: &GetCostAndUsageRequest,
        ) -> Result<GetCostAndUsageResponse, BillingError> {
            assert_eq!(request.metrics.len(), 3);
            self.calls.lock().unwrap().push(region.to_string());
            match self.responses.get(region) {
                Some(body) => Ok(serde_json::from_str(body)?),
                None => Err(BillingError::Api {
                    status: 400,
                    code: "AccessDeniedException".to_string(),
                    message: format!("no access in {}", region),
                }),
            }
        }
    }

    fn group_json(key: &str, cost: &str) -> String {
        format!(
            r#"{{"Keys": ["{key}"], "Metrics": {{
                "BlendedCost": {{"Amount": "{cost}", "Unit": "USD"}},
                "UnblendedCost": {{"Amount": "{cost}", "Unit": "USD"}},
                "UsageQuantity": {{"Amount": "1", "Unit": "N/A"}}
            }}}}"#
        )
    }

    fn bucket_json(start: &str, end: &str, groups: &[(&str, &str)]) -> String {
        let groups: Vec<String> = groups.iter().map(|(k, c)| group_json(k, c)).collect();
        format!(
            r#"{{"TimePeriod": {{"Start": "{start}", "End": "{end}"}}, "Groups": [{}], "Estimated": false}}"#,
            groups.join(",")
        )
    }

    fn response_json(buckets: &[String]) -> String {
        format!(r#"{{"ResultsByTime": [{}]}}"#, buckets.join(","))
    }

    fn query(regions: &[&str]) -> CostQuery {
        CostQuery {
            regions: regions.iter().map(|r| r.to_string()).collect(),
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2023, 3, 1).unwrap(),
            granularity: Granularity::Monthly,
            group_by: vec![GroupBy::dimension("SERVICE")],
        }
    }

    #[tokio::test]
    async fn one_record_per_region_bucket_group_in_order() {
        let east = response_json(&[
            bucket_json("2023-01-01", "2023-02-01", &[("EC2", "1.0"), ("S3", "2.0")]),
            bucket_json("2023-02-01", "2023-03-01", &[("EC2", "3.0")]),
        ]);
        let west = response_json(&[bucket_json("2023-01-01", "2023-02-01", &[("RDS", "4.0")])]);
        let source = FakeSource::new(&[("us-east-1", east), ("us-west-2", west)]);

        let records = get_costs(&source, &query(&["us-east-1", "us-west-2"]))
            .await
            .unwrap();

        let summary: Vec<(&str, &str, &str)> = records
            .iter()
            .map(|r| (r.region.as_str(), r.period_start.as_str(), r.group_label()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("us-east-1", "2023-01-01", "EC2"),
                ("us-east-1", "2023-01-01", "S3"),
                ("us-east-1", "2023-02-01", "EC2"),
                ("us-west-2", "2023-01-01", "RDS"),
            ]
        );
        assert_eq!(records[2].unblended_cost, MetricValue::new("3.0", "USD"));
        assert_eq!(records[2].period_end, "2023-03-01");
        assert_eq!(*source.calls.lock().unwrap(), vec!["us-east-1", "us-west-2"]);
    }

    #[tokio::test]
    async fn failing_region_aborts_the_pass() {
        let east = response_json(&[bucket_json("2023-01-01", "2023-02-01", &[("EC2", "1.0")])]);
        let west = response_json(&[bucket_json("2023-01-01", "2023-02-01", &[("RDS", "4.0")])]);
        let source = FakeSource::new(&[("us-east-1", east), ("us-west-2", west)]);

        let err = get_costs(&source, &query(&["us-east-1", "eu-west-1", "us-west-2"]))
            .await
            .unwrap_err();

        match err {
            BillingError::Region { region, source: cause } => {
                assert_eq!(region, "eu-west-1");
                assert!(matches!(*cause, BillingError::Api { status: 400, .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // us-west-2 is never queried once eu-west-1 fails.
        assert_eq!(*source.calls.lock().unwrap(), vec!["us-east-1", "eu-west-1"]);
    }

    #[tokio::test]
    async fn empty_response_yields_no_records() {
        let source = FakeSource::new(&[("us-east-1", r#"{"ResultsByTime": []}"#.to_string())]);
        let records = get_costs(&source, &query(&["us-east-1"])).await.unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn normalize_copies_bucket_fields() {
        let body = r#"{"ResultsByTime": [{
            "TimePeriod": {"Start": "2023-01-01", "End": "2023-01-02"},
            "Estimated": true,
            "Groups": [{"Keys": ["Amazon DynamoDB", "team$core"], "Metrics": {
                "BlendedCost": {"Amount": "0.5", "Unit": "USD"},
                "UnblendedCost": {"Amount": "0.4", "Unit": "USD"},
                "UsageQuantity": {"Amount": "12", "Unit": "N/A"}
            }}]
        }]}"#;
        let response: GetCostAndUsageResponse = serde_json::from_str(body).unwrap();
        let records = normalize_response("eu-west-1", response).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert!(record.estimated);
        assert_eq!(record.region, "eu-west-1");
        assert_eq!(record.group_keys, vec!["Amazon DynamoDB", "team$core"]);
        assert_eq!(record.group_label(), "Amazon DynamoDB");
        assert_eq!(record.blended_cost, MetricValue::new("0.5", "USD"));
        assert_eq!(record.usage_quantity, MetricValue::new("12", "N/A"));
    }

    #[test]
    fn normalize_rejects_missing_metric() {
        let body = r#"{"ResultsByTime": [{
            "TimePeriod": {"Start": "2023-01-01", "End": "2023-01-02"},
            "Groups": [{"Keys": ["EC2"], "Metrics": {
                "BlendedCost": {"Amount": "0.5", "Unit": "USD"}
            }}]
        }]}"#;
        let response: GetCostAndUsageResponse = serde_json::from_str(body).unwrap();
        let err = normalize_response("us-east-1", response).unwrap_err();
        assert!(matches!(
            err,
            BillingError::MissingMetric { metric: "UnblendedCost", .. }
        ));
    }
}
