//! Resolved options handed to a sink backend.
//!
//! # Responsibilities
//! - Apply the release-id fallback chain
//! - Map the configured diagnostic level onto the sink's severity scale
//! - Turn the optional proxy section into an explicit `ProxySetting`

use std::fmt;

use url::Url;

use crate::config::schema::{DiagnosticLevel, MonitoringConfig, ProxyConfig, ProxyKind};
use crate::dispatch::severity::CaptureSeverity;
use crate::sink::SinkError;

/// Release used when neither the config nor the build provides one.
pub const UNKNOWN_RELEASE: &str = "unknown";

/// Everything a backend needs to initialize.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkOptions {
    pub endpoint: String,
    pub debug: bool,
    pub environment: String,
    pub release: String,
    pub traces_sample_rate: f64,
    pub sample_rate: f32,
    pub diagnostic_level: CaptureSeverity,
    pub max_breadcrumbs: usize,
    pub attach_stacktrace: bool,
    pub send_default_pii: bool,
    pub auto_session_tracking: bool,
    pub proxy: ProxySetting,
}

impl SinkOptions {
    /// Resolve options from a bound config. `embedded_release` is the
    /// host's build-time version, if it has one.
    pub fn from_config(config: &MonitoringConfig, embedded_release: Option<&str>) -> Self {
        Self {
            endpoint: config.endpoint.trim().to_string(),
            debug: config.debug,
            environment: config.environment.clone(),
            release: resolve_release(&config.release, embedded_release),
            traces_sample_rate: config.traces_sample_rate,
            sample_rate: config.sample_rate,
            diagnostic_level: diagnostic_severity(config.diagnostic_level),
            max_breadcrumbs: config.max_breadcrumbs,
            attach_stacktrace: config.attach_stacktrace,
            send_default_pii: config.send_default_pii,
            auto_session_tracking: config.auto_session_tracking,
            proxy: ProxySetting::from_config(config.proxy.as_ref()),
        }
    }
}

/// Explicit value, then build metadata, then "unknown".
pub fn resolve_release(explicit: &str, embedded: Option<&str>) -> String {
    let explicit = explicit.trim();
    if !explicit.is_empty() {
        return explicit.to_string();
    }
    match embedded.map(str::trim) {
        Some(version) if !version.is_empty() => version.to_string(),
        _ => UNKNOWN_RELEASE.to_string(),
    }
}

pub fn diagnostic_severity(level: DiagnosticLevel) -> CaptureSeverity {
    match level {
        DiagnosticLevel::Debug => CaptureSeverity::Debug,
        DiagnosticLevel::Info => CaptureSeverity::Info,
        DiagnosticLevel::Warning => CaptureSeverity::Warning,
        DiagnosticLevel::Error => CaptureSeverity::Error,
        DiagnosticLevel::Fatal => CaptureSeverity::Fatal,
        DiagnosticLevel::Unrecognized => CaptureSeverity::Error,
    }
}

/// Proxy used by the sink transport.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProxySetting {
    #[default]
    None,
    Proxy(ProxyDescriptor),
}

impl ProxySetting {
    /// An empty or absent host disables the proxy regardless of other fields.
    pub fn from_config(config: Option<&ProxyConfig>) -> Self {
        let Some(config) = config else {
            return ProxySetting::None;
        };
        let host = match config.host.as_deref().map(str::trim) {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => return ProxySetting::None,
        };
        let credentials = match config.username.as_deref() {
            Some(username) if !username.is_empty() => Some(Credentials {
                username: username.to_string(),
                password: config.password.clone(),
            }),
            _ => None,
        };
        ProxySetting::Proxy(ProxyDescriptor {
            kind: config.kind,
            host,
            port: config.port,
            credentials,
        })
    }

    pub fn descriptor(&self) -> Option<&ProxyDescriptor> {
        match self {
            ProxySetting::None => None,
            ProxySetting::Proxy(descriptor) => Some(descriptor),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyDescriptor {
    pub kind: ProxyKind,
    pub host: String,
    pub port: Option<u16>,
    pub credentials: Option<Credentials>,
}

impl ProxyDescriptor {
    /// `scheme://[user[:password]@]host[:port]`
    pub fn to_url(&self) -> Result<Url, SinkError> {
        let invalid = |reason: String| SinkError::Init(format!("invalid proxy: {}", reason));

        let mut url = Url::parse(&format!("{}://{}", self.kind.scheme(), self.host))
            .map_err(|e| invalid(e.to_string()))?;
        url.set_port(self.port)
            .map_err(|_| invalid(format!("cannot set port on {}", self.host)))?;

        if let Some(credentials) = &self.credentials {
            url.set_username(&credentials.username)
                .map_err(|_| invalid("cannot attach username".to_string()))?;
            url.set_password(credentials.password.as_deref())
                .map_err(|_| invalid("cannot attach password".to_string()))?;
        }
        Ok(url)
    }
}

/// Proxy credentials. Passed through opaquely.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}
