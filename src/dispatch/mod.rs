//! Log dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! host code
//!     → dispatcher.rs (LogDispatcher::log / warning / fatal ...)
//!         → bus.rs (EventBus::post, always, first)
//!         → severity.rs (level → breadcrumb / capture severity)
//!         → sink (breadcrumb always, capture when escalated)
//! ```
//!
//! # Design Decisions
//! - The internal bus is the required channel; the sink is optional
//! - A single ordinal threshold decides escalation
//! - Nothing from the sink path reaches the caller

pub mod bus;
pub mod dispatcher;
pub mod event;
pub mod severity;

pub use bus::{BroadcastBus, EventBus};
pub use dispatcher::LogDispatcher;
pub use event::LogEvent;
pub use severity::{BreadcrumbSeverity, CaptureSeverity, LogLevel};
