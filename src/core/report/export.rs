use serde::Serialize;
use serde_json::{Map, Value};

use super::flatten::flatten;
use super::ReportError;
use crate::core::models::cost::CostRecord;

/// Pretty JSON with sorted keys and four-space indentation.
pub fn render_json(costs: &[CostRecord]) -> Result<String, ReportError> {
    let value = sort_keys(serde_json::to_value(costs)?);
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    String::from_utf8(buf).map_err(|e| ReportError::Write(e.to_string()))
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Flatten every record and write them as CSV; the header comes from the
/// first record's keys, in field order.
pub fn render_csv(costs: &[CostRecord]) -> Result<String, ReportError> {
    if costs.is_empty() {
        return Err(ReportError::EmptyCsv);
    }

    let mut rows = Vec::with_capacity(costs.len());
    for cost in costs {
        match serde_json::to_value(cost)? {
            Value::Object(map) => rows.push(flatten(&map)),
            _ => return Err(ReportError::Write("record did not serialize to an object".into())),
        }
    }
    let header: Vec<String> = rows[0].keys().cloned().collect();

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b',')
        .from_writer(Vec::new());
    writer.write_record(&header)?;
    for row in &rows {
        writer.write_record(header.iter().map(|key| cell(row.get(key))))?;
    }
    writer.flush().map_err(|e| ReportError::Write(e.to_string()))?;

    let data = writer
        .into_inner()
        .map_err(|e| ReportError::Write(format!("Failed to get CSV data: {}", e)))?;
    String::from_utf8(data).map_err(|e| ReportError::Write(format!("Invalid UTF-8 in CSV: {}", e)))
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(true)) => "True".to_string(),
        Some(Value::Bool(false)) => "False".to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::cost::MetricValue;

    fn record(region: &str, group: &str, cost: &str) -> CostRecord {
        CostRecord {
            region: region.to_string(),
            estimated: true,
            period_start: "2023-01-01".to_string(),
            period_end: "2023-02-01".to_string(),
            group_keys: vec![group.to_string()],
            blended_cost: MetricValue::new(cost, "USD"),
            unblended_cost: MetricValue::new(cost, "USD"),
            usage_quantity: MetricValue::new("3", "N/A"),
        }
    }

    #[test]
    fn json_of_empty_list() {
        assert_eq!(render_json(&[]).unwrap(), "[]");
    }

    #[test]
    fn json_uses_sorted_keys_and_four_space_indent() {
        let out = render_json(&[record("us-east-1", "EC2", "1.5")]).unwrap();
        let expected = r#"[
    {
        "blended_cost": {
            "Amount": "1.5",
            "Unit": "USD"
        },
        "estimated": true,
        "group": [
            "EC2"
        ],
        "region": "us-east-1",
        "time_end": "2023-02-01",
        "time_start": "2023-01-01",
        "unblended_cost": {
            "Amount": "1.5",
            "Unit": "USD"
        },
        "usage_quantity": {
            "Amount": "3",
            "Unit": "N/A"
        }
    }
]"#;
        assert_eq!(out, expected);
    }

    #[test]
    fn json_round_trips_records() {
        let costs = vec![record("us-east-1", "EC2", "1"), record("eu-west-1", "S3", "2")];
        let parsed: Vec<CostRecord> = serde_json::from_str(&render_json(&costs).unwrap()).unwrap();
        assert_eq!(parsed, costs);
    }

    #[test]
    fn csv_of_empty_list_is_an_error() {
        assert!(matches!(render_csv(&[]), Err(ReportError::EmptyCsv)));
    }

    #[test]
    fn csv_has_header_and_one_row_per_record() {
        let out = render_csv(&[
            record("us-east-1", "EC2", "1.5"),
            record("us-west-2", "Amazon Simple Storage Service", "0.25"),
        ])
        .unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "region,estimated,time_start,time_end,group,blended_cost_Amount,blended_cost_Unit,\
             unblended_cost_Amount,unblended_cost_Unit,usage_quantity_Amount,usage_quantity_Unit"
        );
        assert_eq!(
            lines[1],
            "us-east-1,True,2023-01-01,2023-02-01,EC2,1.5,USD,1.5,USD,3,N/A"
        );
        assert!(lines[2].contains("Amazon Simple Storage Service"));
    }

    #[test]
    fn csv_columns_follow_record_fields_not_json_order() {
        let out = render_csv(&[record("eu-west-1", "EC2", "2")]).unwrap();
        let header: Vec<&str> = out.lines().next().unwrap().split(',').collect();
        assert_eq!(&header[..5], ["region", "estimated", "time_start", "time_end", "group"]);

        let json = render_json(&[record("eu-west-1", "EC2", "2")]).unwrap();
        assert!(json.find("\"blended_cost\"").unwrap() < json.find("\"region\"").unwrap());
    }

    #[test]
    fn csv_writes_python_style_booleans() {
        let mut actual = record("us-east-1", "EC2", "1");
        actual.estimated = false;
        let out = render_csv(&[record("us-east-1", "EC2", "1"), actual]).unwrap();
        let estimated: Vec<&str> = out
            .lines()
            .skip(1)
            .map(|l| l.split(',').nth(1).unwrap())
            .collect();
        assert_eq!(estimated, vec!["True", "False"]);
    }

    #[test]
    fn csv_quotes_fields_with_commas() {
        let out = render_csv(&[record("us-east-1", "Tax, VAT", "1")]).unwrap();
        assert!(out.lines().nth(1).unwrap().contains("\"Tax, VAT\""));
    }
}
