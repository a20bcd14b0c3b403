use std::io::IsTerminal;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

#[derive(Error, Debug, PartialEq)]
pub enum OutputError {
    #[error("cannot specify both -j and -c")]
    ConflictingFormats,
    #[error("unknown output format '{0}' (must be text, json or csv)")]
    UnknownFormat(String),
}

#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub use_color: bool,
    pub abbreviate: bool,
}

/// Pick the output format from the flags, falling back to the configured
/// default. Asking for both JSON and CSV is an error.
pub fn resolve_format(json: bool, csv: bool, default_format: &str) -> Result<OutputFormat, OutputError> {
    match (json, csv) {
        (true, true) => Err(OutputError::ConflictingFormats),
        (true, false) => Ok(OutputFormat::Json),
        (false, true) => Ok(OutputFormat::Csv),
        (false, false) => match default_format {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(OutputError::UnknownFormat(other.to_string())),
        },
    }
}

/// `color_setting` is the config's auto|always|never.
pub fn detect_color(color_flag: bool, color_setting: &str) -> bool {
    if !color_flag {
        return false;
    }
    match color_setting {
        "always" => true,
        "never" => false,
        _ => std::env::var("NO_COLOR").is_err() && std::io::stdout().is_terminal(),
    }
}
