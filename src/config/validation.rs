//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (sample rates within [0, 1])
//! - Check the endpoint parses as a URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MonitoringConfig → Result<(), Vec<ValidationError>>
//! - A disabled config (empty endpoint) is always valid
//! - Only values the sink cannot be built from are errors; an empty
//!   environment or a port-less proxy pass through unchanged

use thiserror::Error;
use url::Url;

use crate::config::schema::MonitoringConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be within [0, 1], got {value}")]
    SampleRateOutOfRange { field: &'static str, value: f64 },

    #[error("endpoint is not a valid URL: {0}")]
    InvalidEndpoint(String),
}

/// Validate a monitoring configuration.
pub fn validate_monitoring(config: &MonitoringConfig) -> Result<(), Vec<ValidationError>> {
    if !config.is_enabled() {
        return Ok(());
    }

    let mut errors = Vec::new();

    check_rate(&mut errors, "traces_sample_rate", config.traces_sample_rate);
    check_rate(&mut errors, "sample_rate", f64::from(config.sample_rate));

    if let Err(e) = Url::parse(config.endpoint.trim()) {
        errors.push(ValidationError::InvalidEndpoint(e.to_string()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_rate(errors: &mut Vec<ValidationError>, field: &'static str, value: f64) {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        errors.push(ValidationError::SampleRateOutOfRange { field, value });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ProxyConfig;

    fn enabled() -> MonitoringConfig {
        MonitoringConfig {
            endpoint: "https://ingest.example/1".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_disabled_config_is_valid() {
        let config = MonitoringConfig {
            traces_sample_rate: 7.0,
            ..Default::default()
        };
        assert!(validate_monitoring(&config).is_ok());
    }

    #[test]
    fn test_valid_enabled_config() {
        assert!(validate_monitoring(&enabled()).is_ok());
    }

    #[test]
    fn test_reports_every_error() {
        let config = MonitoringConfig {
            endpoint: "not a url".into(),
            traces_sample_rate: 1.5,
            sample_rate: -0.1,
            ..Default::default()
        };
        let errors = validate_monitoring(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::SampleRateOutOfRange {
            field: "traces_sample_rate",
            value: 1.5,
        }));
        assert!(matches!(errors[2], ValidationError::InvalidEndpoint(_)));
    }

    #[test]
    fn test_nan_rate_rejected() {
        let config = MonitoringConfig {
            traces_sample_rate: f64::NAN,
            ..enabled()
        };
        assert_eq!(validate_monitoring(&config).unwrap_err().len(), 1);
    }

    #[test]
    fn test_proxy_port_is_optional() {
        for host in ["", "   ", "proxy.local"] {
            let config = MonitoringConfig {
                proxy: Some(ProxyConfig {
                    host: Some(host.into()),
                    port: None,
                    ..Default::default()
                }),
                ..enabled()
            };
            assert!(validate_monitoring(&config).is_ok(), "host {:?}", host);
        }
    }

    #[test]
    fn test_empty_environment_is_accepted() {
        let config = MonitoringConfig {
            environment: String::new(),
            ..enabled()
        };
        assert!(validate_monitoring(&config).is_ok());
    }
}
