//! Metrics collection.
//!
//! # Metrics
//! - `logrelay_events_total` (counter): dispatched events by level
//! - `logrelay_sink_calls_total` (counter): sink calls by operation
//! - `logrelay_sink_failures_total` (counter): absorbed sink failures by operation
//! - `logrelay_sink_state` (gauge): 1=running, 0=stopped
//!
//! # Design Decisions
//! - Uses the `metrics` facade; the host installs an exporter if it wants one
//! - Without a recorder every call is a no-op

use crate::dispatch::severity::LogLevel;

pub fn record_event(level: LogLevel) {
    metrics::counter!("logrelay_events_total", "level" => level.as_str()).increment(1);
}

pub fn record_sink_call(op: &'static str) {
    metrics::counter!("logrelay_sink_calls_total", "op" => op).increment(1);
}

pub fn record_sink_failure(op: &'static str) {
    metrics::counter!("logrelay_sink_failures_total", "op" => op).increment(1);
}

pub fn set_sink_running(running: bool) {
    metrics::gauge!("logrelay_sink_state").set(if running { 1.0 } else { 0.0 });
}
