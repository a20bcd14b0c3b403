use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::billing::client::{DEFAULT_ENDPOINT, DEFAULT_SIGNING_REGION};
use crate::core::query::Granularity;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_format")]
    pub default_format: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_granularity")]
    pub granularity: String,
    /// Regions to query when none are passed; empty means the built-in list.
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub abbreviate: bool,
}

fn default_format() -> String {
    "text".to_string()
}
fn default_color() -> String {
    "auto".to_string()
}
fn default_granularity() -> String {
    Granularity::default().as_str().to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_format: default_format(),
            color: default_color(),
            granularity: default_granularity(),
            regions: Vec::new(),
            abbreviate: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_signing_region")]
    pub signing_region: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}
fn default_signing_region() -> String {
    DEFAULT_SIGNING_REGION.to_string()
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            signing_region: default_signing_region(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub api: ApiSettings,
    /// Extra service abbreviations, merged over the built-in table.
    #[serde(default)]
    pub abbreviations: BTreeMap<String, String>,
}

impl AppConfig {
    /// Get the config file path, respecting XDG_CONFIG_HOME
    pub fn config_path() -> PathBuf {
        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("~"))
                    .join(".config")
            });
        config_dir.join("costreport").join("config.toml")
    }

    /// Load config from the default path, falling back to defaults if not found
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let config: AppConfig = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Serialize and write this config to the config file path.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Validate the config
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if !["text", "json", "csv"].contains(&self.settings.default_format.as_str()) {
            issues.push(format!(
                "Invalid default_format: '{}' (must be 'text', 'json' or 'csv')",
                self.settings.default_format
            ));
        }
        if !["auto", "always", "never"].contains(&self.settings.color.as_str()) {
            issues.push(format!(
                "Invalid color: '{}' (must be 'auto', 'always', or 'never')",
                self.settings.color
            ));
        }
        if self.settings.granularity.parse::<Granularity>().is_err() {
            issues.push(format!(
                "Invalid granularity: '{}' (must be MONTHLY or DAILY)",
                self.settings.granularity
            ));
        }
        for region in &self.settings.regions {
            if !crate::core::catalog::is_known_region(region) {
                issues.push(format!("Unknown region: '{}'", region));
            }
        }
        if crate::core::billing::client::validate_endpoint(&self.api.endpoint).is_err() {
            issues.push(format!(
                "Invalid api.endpoint: '{}' (must start with https://)",
                self.api.endpoint
            ));
        }
        if self.api.signing_region.trim().is_empty() {
            issues.push("api.signing_region must not be empty".to_string());
        }
        for (name, short) in &self.abbreviations {
            if short.trim().is_empty() {
                issues.push(format!("Empty abbreviation for '{}'", name));
            }
        }
        issues
    }
}
