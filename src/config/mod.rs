//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse into raw table, bind named sections)
//!     → validation.rs (semantic checks)
//!     → MonitoringConfig (immutable once the sink starts)
//!     → owned by MonitoringSinkLifecycle, cloned out on request
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the sink starts; changes require stop/start
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::{
    DiagnosticLevel, HostConfig, LogFormat, LoggingConfig, MonitoringConfig, ProxyConfig,
    ProxyKind,
};
pub use validation::ValidationError;
