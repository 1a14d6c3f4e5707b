//! Severity mapping.
//!
//! # Responsibilities
//! - Translate a domain `LogLevel` into a breadcrumb severity
//! - Translate a domain `LogLevel` into a capture severity
//! - Decide whether a level escalates to a capture
//!
//! # Design Decisions
//! - Pure functions, no I/O, total over the enum
//! - The escalation threshold is an ordinal comparison, so a level inserted
//!   between `Information` and `Warning` inherits the right behavior

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Domain log level. Variant order is significant.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    Debug = 0,
    Verbose = 1,
    Information = 2,
    Warning = 3,
    Fatal = 4,
}

impl LogLevel {
    /// All levels in ascending order.
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Debug,
        LogLevel::Verbose,
        LogLevel::Information,
        LogLevel::Warning,
        LogLevel::Fatal,
    ];

    /// Resolve a raw ordinal from a host. Unknown values fall back to `Information`.
    pub fn from_ordinal(value: u8) -> Self {
        match value {
            0 => LogLevel::Debug,
            1 => LogLevel::Verbose,
            2 => LogLevel::Information,
            3 => LogLevel::Warning,
            4 => LogLevel::Fatal,
            _ => LogLevel::Information,
        }
    }

    /// Lenient parse: anything unrecognized becomes `Information`.
    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or(LogLevel::Information)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Verbose => "verbose",
            LogLevel::Information => "information",
            LogLevel::Warning => "warning",
            LogLevel::Fatal => "fatal",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a level name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level: {0}")]
pub struct UnknownLevel(pub String);

impl FromStr for LogLevel {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "verbose" => Ok(LogLevel::Verbose),
            "information" | "info" => Ok(LogLevel::Information),
            "warning" | "warn" => Ok(LogLevel::Warning),
            "fatal" => Ok(LogLevel::Fatal),
            _ => Err(UnknownLevel(s.to_string())),
        }
    }
}

/// Severity attached to a breadcrumb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreadcrumbSeverity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

/// Severity attached to a capture, also used for the sink's own diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSeverity {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

pub fn breadcrumb_severity(level: LogLevel) -> BreadcrumbSeverity {
    match level {
        LogLevel::Debug => BreadcrumbSeverity::Debug,
        LogLevel::Verbose => BreadcrumbSeverity::Info,
        LogLevel::Information => BreadcrumbSeverity::Info,
        LogLevel::Warning => BreadcrumbSeverity::Warning,
        LogLevel::Fatal => BreadcrumbSeverity::Critical,
    }
}

pub fn capture_severity(level: LogLevel) -> CaptureSeverity {
    match level {
        LogLevel::Debug => CaptureSeverity::Debug,
        LogLevel::Verbose => CaptureSeverity::Debug,
        LogLevel::Information => CaptureSeverity::Info,
        LogLevel::Warning => CaptureSeverity::Warning,
        LogLevel::Fatal => CaptureSeverity::Fatal,
    }
}

/// Whether `level` escalates from breadcrumb-only to a capture.
pub fn should_capture(level: LogLevel) -> bool {
    level >= LogLevel::Warning
}
