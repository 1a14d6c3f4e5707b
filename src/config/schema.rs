//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML. Field names
//! are snake_case; PascalCase aliases are accepted so documents written for
//! hosts with a `[Sentry]`-style section bind without edits.

use serde::{Deserialize, Serialize};

/// Root configuration for a host embedding the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HostConfig {
    /// Local diagnostics settings.
    pub logging: LoggingConfig,

    /// Monitoring sink settings.
    #[serde(alias = "Monitoring", alias = "sentry", alias = "Sentry")]
    pub monitoring: MonitoringConfig,
}

/// Output format for local logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON structured logging (default for production).
    #[default]
    Json,
    /// Human-readable output for development.
    Pretty,
}

/// Local logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (e.g. "info", "logrelay=debug").
    pub level: String,

    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

/// Verbosity of the monitoring backend's own self-logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    #[serde(alias = "Debug")]
    Debug,
    #[serde(alias = "Info")]
    Info,
    #[serde(alias = "Warning")]
    Warning,
    #[default]
    #[serde(alias = "Error")]
    Error,
    #[serde(alias = "Fatal")]
    Fatal,
    /// Any value not listed above.
    #[serde(other)]
    Unrecognized,
}

/// Monitoring sink configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Ingest endpoint. Empty disables monitoring.
    #[serde(alias = "Endpoint", alias = "dsn", alias = "Dsn")]
    pub endpoint: String,

    #[serde(alias = "Environment")]
    pub environment: String,

    /// Explicit release id. Empty falls back to build metadata, then "unknown".
    #[serde(alias = "Release")]
    pub release: String,

    #[serde(alias = "TracesSampleRate")]
    pub traces_sample_rate: f64,

    #[serde(alias = "SampleRate")]
    pub sample_rate: f32,

    #[serde(alias = "Debug")]
    pub debug: bool,

    #[serde(alias = "DiagnosticLevel")]
    pub diagnostic_level: DiagnosticLevel,

    #[serde(alias = "AttachStacktrace")]
    pub attach_stacktrace: bool,

    #[serde(alias = "MaxBreadcrumbs")]
    pub max_breadcrumbs: usize,

    #[serde(alias = "AutoSessionTracking")]
    pub auto_session_tracking: bool,

    #[serde(alias = "SendDefaultPii")]
    pub send_default_pii: bool,

    #[serde(alias = "Proxy")]
    pub proxy: Option<ProxyConfig>,
}

impl MonitoringConfig {
    /// True when an endpoint is configured.
    pub fn is_enabled(&self) -> bool {
        !self.endpoint.trim().is_empty()
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            environment: "production".to_string(),
            release: String::new(),
            traces_sample_rate: 1.0,
            sample_rate: 1.0,
            debug: false,
            diagnostic_level: DiagnosticLevel::Error,
            attach_stacktrace: true,
            max_breadcrumbs: 100,
            auto_session_tracking: true,
            send_default_pii: false,
            proxy: None,
        }
    }
}

/// Proxy protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyKind {
    #[default]
    #[serde(alias = "Http", alias = "HTTP")]
    Http,
    #[serde(alias = "Socks4", alias = "SOCKS4")]
    Socks4,
    #[serde(alias = "Socks5", alias = "SOCKS5")]
    Socks5,
}

impl ProxyKind {
    pub fn scheme(&self) -> &'static str {
        match self {
            ProxyKind::Http => "http",
            ProxyKind::Socks4 => "socks4",
            ProxyKind::Socks5 => "socks5",
        }
    }
}

/// Outbound proxy for the monitoring transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Proxy host. Absent or empty means no proxy.
    #[serde(alias = "Host")]
    pub host: Option<String>,

    #[serde(alias = "Port")]
    pub port: Option<u16>,

    #[serde(alias = "Type", alias = "type")]
    pub kind: ProxyKind,

    #[serde(alias = "Username")]
    pub username: Option<String>,

    #[serde(alias = "Password")]
    pub password: Option<String>,
}
