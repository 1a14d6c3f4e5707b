//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! dispatcher and lifecycle produce:
//!     → logging.rs (local structured log lines for operators)
//!     → metrics.rs (event and sink-call counters)
//!
//! Consumers:
//!     → stdout/stderr (JSON or pretty)
//!     → whatever metrics recorder the host installs
//! ```

pub mod logging;
pub mod metrics;
