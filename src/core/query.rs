use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::catalog;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug, PartialEq)]
pub enum QueryError {
    #[error("missing time range: pass --timerange <YYYY-MM-DD>,<YYYY-MM-DD>")]
    MissingTimeRange,
    #[error("proper timerange format for <start,end> times is <YYYY-MM-DD>,<YYYY-MM-DD>, got '{0}'")]
    InvalidTimeRange(String),
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("start date {start} must be before end date {end}")]
    EmptyRange { start: NaiveDate, end: NaiveDate },
    #[error("invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("invalid time interval: {0} (must be MONTHLY or DAILY)")]
    InvalidGranularity(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Granularity {
    #[default]
    Monthly,
    Daily,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "MONTHLY",
            Self::Daily => "DAILY",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MONTHLY" => Ok(Self::Monthly),
            "DAILY" => Ok(Self::Daily),
            _ => Err(QueryError::InvalidGranularity(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupKind {
    Dimension,
    Tag,
}

/// One `GroupBy` entry, serialized the way Cost Explorer expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupBy {
    #[serde(rename = "Type")]
    pub kind: GroupKind,
    #[serde(rename = "Key")]
    pub key: String,
}

impl GroupBy {
    pub fn dimension(key: impl Into<String>) -> Self {
        Self {
            kind: GroupKind::Dimension,
            key: key.into(),
        }
    }

    pub fn tag(key: impl Into<String>) -> Self {
        Self {
            kind: GroupKind::Tag,
            key: key.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CostQuery {
    pub regions: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub granularity: Granularity,
    pub group_by: Vec<GroupBy>,
}

impl CostQuery {
    /// Validate raw command-line values and assemble a query.
    ///
    /// An empty `regions` list means every region in the built-in catalog.
    pub fn build(
        regions: Vec<String>,
        time_range: Option<&str>,
        dimensions: &str,
        tags: &str,
        granularity: &str,
    ) -> Result<Self, QueryError> {
        let time_range = time_range.ok_or(QueryError::MissingTimeRange)?;
        let (start_date, end_date) = parse_time_range(time_range)?;
        let granularity: Granularity = granularity.parse()?;
        let group_by = parse_group_by(dimensions, tags)?;

        let regions = if regions.is_empty() {
            catalog::AWS_REGIONS.iter().map(|r| r.to_string()).collect()
        } else {
            regions
        };
        for region in &regions {
            if !catalog::is_known_region(region) {
                tracing::warn!(region = %region, "region is not in the built-in catalog");
            }
        }

        Ok(Self {
            regions,
            start_date,
            end_date,
            granularity,
            group_by,
        })
    }

    pub fn start(&self) -> String {
        self.start_date.format(DATE_FORMAT).to_string()
    }

    pub fn end(&self) -> String {
        self.end_date.format(DATE_FORMAT).to_string()
    }
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `<start>,<end>` into two dates; the start must precede the end.
pub fn parse_time_range(raw: &str) -> Result<(NaiveDate, NaiveDate), QueryError> {
    let parts: Vec<&str> = raw.split(',').collect();
    if parts.len() != 2 {
        return Err(QueryError::InvalidTimeRange(raw.to_string()));
    }
    let start = parse_date(parts[0])?;
    let end = parse_date(parts[1])?;
    if start >= end {
        return Err(QueryError::EmptyRange { start, end });
    }
    Ok((start, end))
}

fn parse_date(raw: &str) -> Result<NaiveDate, QueryError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| QueryError::InvalidDate(raw.to_string()))
}

/// Dimensions first, then tags; SERVICE when neither is given.
pub fn parse_group_by(dimensions: &str, tags: &str) -> Result<Vec<GroupBy>, QueryError> {
    let mut group_by = Vec::new();
    for dimension in split_list(dimensions) {
        if !catalog::is_valid_dimension(&dimension) {
            return Err(QueryError::InvalidDimension(dimension));
        }
        group_by.push(GroupBy::dimension(dimension));
    }
    group_by.extend(split_list(tags).into_iter().map(GroupBy::tag));

    if group_by.is_empty() {
        group_by.push(GroupBy::dimension("SERVICE"));
    }
    Ok(group_by)
}
