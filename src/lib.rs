//! Structured log relay library.
//!
//! Fans host log events out to an internal event bus and, when configured,
//! to a monitoring sink (breadcrumbs plus error/warning captures).

pub mod config;
pub mod dispatch;
pub mod lifecycle;
pub mod observability;
pub mod sink;

pub use config::schema::{HostConfig, MonitoringConfig};
pub use dispatch::{BroadcastBus, EventBus, LogDispatcher, LogEvent, LogLevel};
pub use lifecycle::{MonitoringSinkLifecycle, Shutdown};
pub use sink::{MonitoringSink, SinkFactory, SinkHandle};
