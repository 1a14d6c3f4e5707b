//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::schema::{HostConfig, MonitoringConfig};
use crate::config::validation::{validate_monitoring, ValidationError};

/// Section holding monitoring settings in a host document.
pub const MONITORING_SECTION: &str = "monitoring";

/// Accepted spellings of the monitoring section, in lookup order.
const MONITORING_SECTION_ALIASES: [&str; 4] = ["monitoring", "Monitoring", "sentry", "Sentry"];

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Section [{section}] could not be bound: {source}")]
    Bind {
        section: String,
        source: toml::de::Error,
    },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read a TOML document into a raw table.
pub fn load_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load and validate a full host configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<HostConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: HostConfig = toml::from_str(&content)?;

    validate_monitoring(&config.monitoring).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Bind a named section of `raw` onto `T`. A missing section yields `T::default()`.
pub fn bind_section<T>(raw: &toml::Table, section: &str) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    match raw.get(section) {
        Some(value) => value.clone().try_into().map_err(|source| ConfigError::Bind {
            section: section.to_string(),
            source,
        }),
        None => Ok(T::default()),
    }
}

/// Bind the monitoring section, accepting its aliased spellings.
pub fn bind_monitoring(raw: &toml::Table) -> Result<MonitoringConfig, ConfigError> {
    let section = MONITORING_SECTION_ALIASES
        .iter()
        .find(|name| raw.contains_key(**name))
        .copied()
        .unwrap_or(MONITORING_SECTION);
    bind_section(raw, section)
}
