//! In-memory recording sink.
//!
//! Records every call it receives. Failures can be injected per operation,
//! either as a returned error or as a panic, to exercise the fail-soft paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::dispatch::severity::{BreadcrumbSeverity, CaptureSeverity};
use crate::sink::{CaptureEvent, MonitoringSink, SinkError, SinkFactory, SinkOptions};

/// Sink operation, used to target injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkOp {
    Breadcrumb,
    Message,
    Event,
    Dispose,
}

/// How an injected failure manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailMode {
    Error,
    Panic,
}

/// A call observed by the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Breadcrumb {
        message: String,
        category: String,
        severity: BreadcrumbSeverity,
    },
    Message {
        message: String,
        severity: CaptureSeverity,
    },
    Event(CaptureEvent),
    Dispose,
}

#[derive(Debug, Default)]
struct RecordingState {
    calls: Mutex<Vec<SinkCall>>,
    failures: Mutex<HashMap<SinkOp, FailMode>>,
}

/// Recording sink. Clones share the same log of calls.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    state: Arc<RecordingState>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `op` fail with `mode` from now on.
    pub fn fail_on(self, op: SinkOp, mode: FailMode) -> Self {
        self.state
            .failures
            .lock()
            .expect("recording sink mutex poisoned")
            .insert(op, mode);
        self
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.state
            .calls
            .lock()
            .expect("recording sink mutex poisoned")
            .clone()
    }

    pub fn breadcrumbs(&self) -> Vec<SinkCall> {
        self.filtered(|c| matches!(c, SinkCall::Breadcrumb { .. }))
    }

    pub fn messages(&self) -> Vec<SinkCall> {
        self.filtered(|c| matches!(c, SinkCall::Message { .. }))
    }

    pub fn events(&self) -> Vec<CaptureEvent> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SinkCall::Event(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    /// Number of message and event captures.
    pub fn capture_count(&self) -> usize {
        self.messages().len() + self.events().len()
    }

    pub fn dispose_count(&self) -> usize {
        self.filtered(|c| matches!(c, SinkCall::Dispose)).len()
    }

    fn filtered(&self, keep: impl Fn(&SinkCall) -> bool) -> Vec<SinkCall> {
        self.calls().into_iter().filter(|c| keep(c)).collect()
    }

    fn record(&self, op: SinkOp, call: SinkCall) -> Result<(), SinkError> {
        self.state
            .calls
            .lock()
            .expect("recording sink mutex poisoned")
            .push(call);

        let mode = self
            .state
            .failures
            .lock()
            .expect("recording sink mutex poisoned")
            .get(&op)
            .copied();

        match mode {
            None => Ok(()),
            Some(FailMode::Error) => Err(SinkError::Transport(format!("injected {:?} failure", op))),
            Some(FailMode::Panic) => panic!("injected {:?} panic", op),
        }
    }
}

impl MonitoringSink for RecordingSink {
    fn add_breadcrumb(
        &self,
        message: &str,
        category: &str,
        severity: BreadcrumbSeverity,
    ) -> Result<(), SinkError> {
        self.record(
            SinkOp::Breadcrumb,
            SinkCall::Breadcrumb {
                message: message.to_string(),
                category: category.to_string(),
                severity,
            },
        )
    }

    fn capture_message(&self, message: &str, severity: CaptureSeverity) -> Result<(), SinkError> {
        self.record(
            SinkOp::Message,
            SinkCall::Message {
                message: message.to_string(),
                severity,
            },
        )
    }

    fn capture_event(&self, event: CaptureEvent) -> Result<(), SinkError> {
        self.record(SinkOp::Event, SinkCall::Event(event))
    }

    fn dispose(&self) -> Result<(), SinkError> {
        self.record(SinkOp::Dispose, SinkCall::Dispose)
    }
}

#[derive(Debug, Default)]
struct FactoryState {
    init_calls: AtomicUsize,
    seen: Mutex<Vec<SinkOptions>>,
    init_failure: Mutex<Option<FailMode>>,
}

/// Factory handing out a shared `RecordingSink`.
#[derive(Debug, Clone, Default)]
pub struct RecordingFactory {
    sink: RecordingSink,
    state: Arc<FactoryState>,
}

impl RecordingFactory {
    pub fn new(sink: RecordingSink) -> Self {
        Self {
            sink,
            state: Arc::default(),
        }
    }

    /// Make every `init` fail with `mode`.
    pub fn failing(self, mode: FailMode) -> Self {
        *self
            .state
            .init_failure
            .lock()
            .expect("recording factory mutex poisoned") = Some(mode);
        self
    }

    pub fn sink(&self) -> &RecordingSink {
        &self.sink
    }

    pub fn init_calls(&self) -> usize {
        self.state.init_calls.load(Ordering::SeqCst)
    }

    /// Options passed to the most recent `init`.
    pub fn last_options(&self) -> Option<SinkOptions> {
        self.state
            .seen
            .lock()
            .expect("recording factory mutex poisoned")
            .last()
            .cloned()
    }
}

impl SinkFactory for RecordingFactory {
    fn init(&self, options: &SinkOptions) -> Result<Box<dyn MonitoringSink>, SinkError> {
        self.state.init_calls.fetch_add(1, Ordering::SeqCst);
        self.state
            .seen
            .lock()
            .expect("recording factory mutex poisoned")
            .push(options.clone());

        let failure = *self
            .state
            .init_failure
            .lock()
            .expect("recording factory mutex poisoned");

        match failure {
            None => Ok(Box::new(self.sink.clone())),
            Some(FailMode::Error) => Err(SinkError::Init("injected init failure".to_string())),
            Some(FailMode::Panic) => panic!("injected init panic"),
        }
    }
}
