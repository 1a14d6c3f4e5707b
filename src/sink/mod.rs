//! Monitoring sink subsystem.
//!
//! # Data Flow
//! ```text
//! MonitoringSinkLifecycle::start
//!     → options.rs (MonitoringConfig → SinkOptions)
//!     → SinkFactory::init (memory / json / sentry backend)
//!     → SinkHandle::publish (atomic swap, readers see all or nothing)
//!
//! LogDispatcher::log
//!     → SinkHandle::current (Arc snapshot, no lock held)
//!     → guarded breadcrumb / capture (errors and panics absorbed)
//! ```
//!
//! # Design Decisions
//! - The sink is an injected handle, not a process-wide singleton
//! - Only the lifecycle publishes or clears the handle
//! - Every backend call returns `Result`; callers decide whether to swallow

use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispatch::severity::{BreadcrumbSeverity, CaptureSeverity};

pub mod json;
pub mod memory;
pub mod options;
#[cfg(feature = "sentry")]
pub mod sentry;

pub use options::{Credentials, ProxyDescriptor, ProxySetting, SinkOptions};

/// Errors raised by sink backends.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink initialization failed: {0}")]
    Init(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to dispose sink: {0}")]
    Dispose(String),

    #[error("sink panicked during {0}")]
    Panicked(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error-shaped payload carried by a capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedError {
    /// Error type name used by the remote system for grouping.
    pub kind: String,
    pub message: String,
}

/// A structured capture. Either error-shaped or a plain message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureEvent {
    pub severity: CaptureSeverity,
    pub message: Option<String>,
    pub error: Option<CapturedError>,
    pub tags: BTreeMap<String, String>,
}

impl CaptureEvent {
    /// Build an error-shaped capture tagged with `tag`.
    pub fn error(tag: &str, text: String, severity: CaptureSeverity) -> Self {
        let mut tags = BTreeMap::new();
        tags.insert("tag".to_string(), tag.to_string());
        Self {
            severity,
            message: None,
            error: Some(CapturedError {
                kind: "LogFatal".to_string(),
                message: text,
            }),
            tags,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Capability surface of an initialized monitoring backend.
pub trait MonitoringSink: Send + Sync {
    fn add_breadcrumb(
        &self,
        message: &str,
        category: &str,
        severity: BreadcrumbSeverity,
    ) -> Result<(), SinkError>;

    fn capture_message(&self, message: &str, severity: CaptureSeverity) -> Result<(), SinkError>;

    fn capture_event(&self, event: CaptureEvent) -> Result<(), SinkError>;

    /// Flush and release the backend. Called once by the lifecycle.
    fn dispose(&self) -> Result<(), SinkError>;
}

/// Builds a sink from resolved options.
pub trait SinkFactory: Send + Sync {
    fn init(&self, options: &SinkOptions) -> Result<Box<dyn MonitoringSink>, SinkError>;
}

impl<F> SinkFactory for F
where
    F: Fn(&SinkOptions) -> Result<Box<dyn MonitoringSink>, SinkError> + Send + Sync,
{
    fn init(&self, options: &SinkOptions) -> Result<Box<dyn MonitoringSink>, SinkError> {
        self(options)
    }
}

/// Shared slot holding the current sink, if any.
///
/// Clones share the slot. Readers take an `Arc` snapshot, so a concurrent
/// `take` never pulls the sink out from under an in-flight call.
#[derive(Clone)]
pub struct SinkHandle {
    slot: Arc<ArcSwapOption<Box<dyn MonitoringSink>>>,
}

impl SinkHandle {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(ArcSwapOption::empty()),
        }
    }

    pub fn current(&self) -> Option<Arc<Box<dyn MonitoringSink>>> {
        self.slot.load_full()
    }

    pub fn is_present(&self) -> bool {
        self.slot.load().is_some()
    }

    pub(crate) fn publish(&self, sink: Box<dyn MonitoringSink>) {
        self.slot.store(Some(Arc::new(sink)));
    }

    pub(crate) fn take(&self) -> Option<Arc<Box<dyn MonitoringSink>>> {
        self.slot.swap(None)
    }
}

impl Default for SinkHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SinkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkHandle")
            .field("present", &self.is_present())
            .finish()
    }
}

/// Run a backend call, turning a panic into `SinkError::Panicked`.
pub(crate) fn guarded<T, F>(op: &'static str, f: F) -> Result<T, SinkError>
where
    F: FnOnce() -> Result<T, SinkError>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(_) => Err(SinkError::Panicked(op)),
    }
}
