//! Log dispatcher.
//!
//! # Responsibilities
//! - Single entry point for log production in the host
//! - Post every event to the internal bus, first and unconditionally
//! - Record a breadcrumb on the monitoring sink when one is present
//! - Escalate to a capture when the level crosses the threshold
//!
//! # Design Decisions
//! - Holds a `SinkHandle` snapshot per call; no lock spans a sink call
//! - Sink failures (errors and panics) stop at `try_breadcrumb`/`try_capture`
//! - `Fatal` captures are error-shaped; other captures are plain messages

use std::sync::Arc;

use crate::dispatch::bus::EventBus;
use crate::dispatch::event::LogEvent;
use crate::dispatch::severity::{breadcrumb_severity, capture_severity, should_capture, LogLevel};
use crate::observability::metrics;
use crate::sink::{guarded, CaptureEvent, MonitoringSink, SinkError, SinkHandle};

/// Whether a call captures by threshold or unconditionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escalation {
    Threshold,
    Always,
}

/// Fans log events out to the internal bus and the monitoring sink.
#[derive(Clone)]
pub struct LogDispatcher {
    bus: Arc<dyn EventBus>,
    sink: SinkHandle,
}

impl LogDispatcher {
    /// Create a dispatcher writing to `bus` and to whatever sink `sink` holds.
    pub fn new(bus: Arc<dyn EventBus>, sink: SinkHandle) -> Self {
        Self { bus, sink }
    }

    /// Generic entry point. Captures only when `level` is at or above `Warning`.
    pub fn log(&self, tag: &str, level: LogLevel, message: &str) {
        self.dispatch(LogEvent::new(tag, level, message), Escalation::Threshold);
    }

    /// Dispatch a pre-built event through the generic path.
    pub fn log_event(&self, event: LogEvent) {
        self.dispatch(event, Escalation::Threshold);
    }

    pub fn debug(&self, tag: &str, message: &str) {
        self.log(tag, LogLevel::Debug, message);
    }

    pub fn verbose(&self, tag: &str, message: &str) {
        self.log(tag, LogLevel::Verbose, message);
    }

    pub fn info(&self, tag: &str, message: &str) {
        self.log(tag, LogLevel::Information, message);
    }

    /// Always captures a `[tag] message` message, independent of the threshold.
    pub fn warning(&self, tag: &str, message: &str) {
        self.dispatch(LogEvent::new(tag, LogLevel::Warning, message), Escalation::Always);
    }

    /// Always captures an error-shaped event, independent of the threshold.
    pub fn fatal(&self, tag: &str, message: &str) {
        self.dispatch(LogEvent::new(tag, LogLevel::Fatal, message), Escalation::Always);
    }

    /// True when a monitoring sink is currently installed.
    pub fn has_sink(&self) -> bool {
        self.sink.is_present()
    }

    fn dispatch(&self, event: LogEvent, escalation: Escalation) {
        metrics::record_event(event.level);
        self.bus.post(event.clone());

        let Some(sink) = self.sink.current() else {
            return;
        };

        try_breadcrumb(&**sink, &event);

        let capture = match escalation {
            Escalation::Threshold => should_capture(event.level),
            Escalation::Always => true,
        };
        if capture {
            try_capture(&**sink, &event);
        }
    }
}

impl std::fmt::Debug for LogDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogDispatcher")
            .field("sink", &self.sink)
            .finish_non_exhaustive()
    }
}

fn try_breadcrumb(sink: &dyn MonitoringSink, event: &LogEvent) {
    let result = guarded("breadcrumb", || {
        sink.add_breadcrumb(&event.message, &event.tag, breadcrumb_severity(event.level))
    });
    absorb("breadcrumb", event, result);
}

fn try_capture(sink: &dyn MonitoringSink, event: &LogEvent) {
    let text = event.formatted();
    let severity = capture_severity(event.level);

    let (op, result) = if event.level == LogLevel::Fatal {
        let capture = CaptureEvent::error(&event.tag, text, severity);
        ("capture_event", guarded("capture_event", || sink.capture_event(capture)))
    } else {
        ("capture_message", guarded("capture_message", || sink.capture_message(&text, severity)))
    };
    absorb(op, event, result);
}

fn absorb(op: &'static str, event: &LogEvent, result: Result<(), SinkError>) {
    metrics::record_sink_call(op);
    if let Err(e) = result {
        metrics::record_sink_failure(op);
        tracing::warn!(
            op,
            tag = %event.tag,
            level = %event.level,
            error = %e,
            "Monitoring sink call failed"
        );
    }
}
