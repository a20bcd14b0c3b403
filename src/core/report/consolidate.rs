use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use rust_decimal::Decimal;

use super::ReportError;
use crate::core::models::cost::{AggregatedGroup, CostRecord};

/// Sum unblended cost and usage per group label, in first-seen order.
///
/// Units are not reconciled: the first record's units stick and a later
/// mismatch is only logged.
pub fn consolidate_by_group(costs: &[CostRecord]) -> Result<Vec<AggregatedGroup>, ReportError> {
    let regions = region_count(costs);
    if regions > 1 {
        tracing::warn!(
            regions,
            "summing records from several regions; Cost Explorer totals are account-wide, \
             so each region repeats them"
        );
    }

    let mut groups: Vec<AggregatedGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for cost in costs {
        let label = cost.group_label();
        let unblended = parse_amount(label, &cost.unblended_cost.amount)?;
        let usage = parse_amount(label, &cost.usage_quantity.amount)?;

        match index.get(label) {
            Some(&i) => {
                let group = &mut groups[i];
                if group.unblended_unit != cost.unblended_cost.unit
                    || group.usage_unit != cost.usage_quantity.unit
                {
                    tracing::warn!(
                        group = label,
                        expected = %group.unblended_unit,
                        found = %cost.unblended_cost.unit,
                        "unit mismatch within group; summing anyway"
                    );
                }
                group.unblended_cost += unblended;
                group.usage_quantity += usage;
            }
            None => {
                index.insert(label.to_string(), groups.len());
                groups.push(AggregatedGroup {
                    group_label: label.to_string(),
                    unblended_cost: unblended,
                    unblended_unit: cost.unblended_cost.unit.clone(),
                    usage_quantity: usage,
                    usage_unit: cost.usage_quantity.unit.clone(),
                });
            }
        }
    }

    Ok(groups)
}

/// Number of distinct regions among the records.
pub fn region_count(costs: &[CostRecord]) -> usize {
    costs
        .iter()
        .map(|c| c.region.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// Parse a provider amount, which may use scientific notation.
fn parse_amount(group: &str, amount: &str) -> Result<Decimal, ReportError> {
    let amount = amount.trim();
    Decimal::from_str(amount)
        .or_else(|_| Decimal::from_scientific(amount))
        .map_err(|_| ReportError::InvalidAmount {
            group: group.to_string(),
            amount: amount.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::cost::MetricValue;

    fn record(group: &str, cost: &str, usage: &str) -> CostRecord {
        CostRecord {
            region: "us-east-1".to_string(),
            estimated: false,
            period_start: "2023-01-01".to_string(),
            period_end: "2023-02-01".to_string(),
            group_keys: vec![group.to_string()],
            blended_cost: MetricValue::new(cost, "USD"),
            unblended_cost: MetricValue::new(cost, "USD"),
            usage_quantity: MetricValue::new(usage, "Hrs"),
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn sums_per_group_in_first_seen_order() {
        let costs = vec![
            record("EC2", "1.0", "10"),
            record("S3", "2.0", "1"),
            record("EC2", "3.0", "5"),
        ];
        let groups = consolidate_by_group(&costs).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].group_label, "EC2");
        assert_eq!(groups[0].unblended_cost, dec("4.0"));
        assert_eq!(groups[0].usage_quantity, dec("15"));
        assert_eq!(groups[1].group_label, "S3");
        assert_eq!(groups[1].unblended_cost, dec("2.0"));
    }

    #[test]
    fn sums_do_not_depend_on_record_order() {
        let forward = vec![
            record("EC2", "1.1", "1"),
            record("S3", "2.2", "1"),
            record("EC2", "3.3", "1"),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = consolidate_by_group(&forward).unwrap();
        let b = consolidate_by_group(&reversed).unwrap();
        assert_eq!(a[0].group_label, "EC2");
        assert_eq!(b[0].group_label, "EC2");
        assert_eq!(a[0].unblended_cost, b[0].unblended_cost);
        assert_eq!(a[1].unblended_cost, b[1].unblended_cost);
    }

    #[test]
    fn decimal_sums_are_exact() {
        let costs = vec![record("EC2", "0.1", "0"), record("EC2", "0.2", "0")];
        let groups = consolidate_by_group(&costs).unwrap();
        assert_eq!(groups[0].unblended_cost, dec("0.3"));
    }

    #[test]
    fn units_come_from_first_record() {
        let mut second = record("EC2", "1", "1");
        second.unblended_cost.unit = "EUR".to_string();
        let groups = consolidate_by_group(&[record("EC2", "1", "1"), second]).unwrap();
        assert_eq!(groups[0].unblended_unit, "USD");
        assert_eq!(groups[0].usage_unit, "Hrs");
        assert_eq!(groups[0].unblended_cost, dec("2"));
    }

    #[test]
    fn scientific_amounts_are_accepted() {
        let groups = consolidate_by_group(&[record("Tax", "1.5E-7", "0")]).unwrap();
        assert_eq!(groups[0].unblended_cost, dec("0.00000015"));
    }

    #[test]
    fn invalid_amount_is_an_error() {
        let err = consolidate_by_group(&[record("EC2", "lots", "1")]).unwrap_err();
        assert!(matches!(err, ReportError::InvalidAmount { ref group, .. } if group == "EC2"));
    }

    #[test]
    fn empty_input_gives_no_groups() {
        assert!(consolidate_by_group(&[]).unwrap().is_empty());
    }

    #[test]
    fn region_count_sees_repeated_global_totals() {
        let mut west = record("EC2", "4", "1");
        west.region = "us-west-2".to_string();
        let costs = vec![record("EC2", "4", "1"), west, record("S3", "1", "1")];
        assert_eq!(region_count(&costs), 2);
        assert_eq!(region_count(&costs[..1]), 1);
        assert_eq!(region_count(&[]), 0);

        // Same global total fetched once per region is still summed.
        let groups = consolidate_by_group(&costs).unwrap();
        assert_eq!(groups[0].unblended_cost, dec("8"));
    }
}
