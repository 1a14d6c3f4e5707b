//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (monitoring.rs):
//!     Bind config → Validate → Initialize sink → Publish handle
//!
//! Shutdown (shutdown.rs, monitoring.rs):
//!     Signal received → Stop producing → Unpublish sink → Dispose
//! ```
//!
//! # Design Decisions
//! - Monitoring never blocks startup: every failure leaves the sink inert
//! - Ordered shutdown: producers stop first, then the sink is disposed
//! - Stop is idempotent

pub mod monitoring;
pub mod shutdown;

pub use monitoring::{LifecycleState, MonitoringSinkLifecycle};
pub use shutdown::{Shutdown, ShutdownListener};
