use std::collections::BTreeMap;

use colored::{control, Colorize};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::core::catalog;
use crate::core::models::cost::AggregatedGroup;

const COST_COLUMN_WIDTH: usize = 61;
const LABEL_WIDTH: usize = 54;
const AMOUNT_WIDTH: usize = 14;

/// Render consolidated groups as the plain-text summary table.
///
/// Layout:
/// ```text
///
/// Summary of costs: 2023-01-01 - 2023-01-31
///
/// Group                                                          Cost
/// -----                                                          ----
/// Amazon Simple Storage Service<padded to 54>\t          3.20 USD
/// ```
///
/// With `abbreviations` set, labels are shortened: the given table first,
/// then the built-in one, then the uppercase-letter scheme.
pub fn render_summary(
    groups: &[AggregatedGroup],
    start: &str,
    end: &str,
    abbreviations: Option<&BTreeMap<String, String>>,
    use_color: bool,
) -> String {
    control::set_override(use_color);

    let mut lines: Vec<String> = Vec::new();

    lines.push(String::new());
    lines.push(
        format!("Summary of costs: {} - {}", start, end)
            .bold()
            .to_string(),
    );
    lines.push(String::new());
    lines.push(
        format!("{} {:>width$}", "Group", "Cost", width = COST_COLUMN_WIDTH)
            .bold()
            .to_string(),
    );
    lines.push(format!(
        "{} {:>width$}",
        "-----",
        "----",
        width = COST_COLUMN_WIDTH
    ));

    for group in groups {
        let label = match abbreviations {
            Some(custom) => abbreviate(&group.group_label, custom),
            None => group.group_label.clone(),
        };
        lines.push(format!(
            "{:<label_width$}\t{:>amount_width$} {}",
            label,
            format_cost(group.unblended_cost),
            group.unblended_unit,
            label_width = LABEL_WIDTH,
            amount_width = AMOUNT_WIDTH,
        ));
    }

    lines.join("\n")
}

/// Two decimal places, halves rounded away from zero.
pub fn format_cost(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}

fn abbreviate(label: &str, custom: &BTreeMap<String, String>) -> String {
    if let Some(short) = custom.get(label) {
        return short.clone();
    }
    if let Some(short) = catalog::builtin_abbreviation(label) {
        return short.to_string();
    }
    catalog::simple_abbreviation(label).unwrap_or_else(|| label.to_string())
}
