pub mod consolidate;
pub mod export;
pub mod flatten;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("no cost data to write as CSV")]
    EmptyCsv,
    #[error("group '{group}' has a non-numeric amount: '{amount}'")]
    InvalidAmount { group: String, amount: String },
    #[error("Failed to serialize costs: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to render output: {0}")]
    Write(String),
}
