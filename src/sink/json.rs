//! JSON-lines sink.
//!
//! Writes one JSON object per sink call to any `Write`. Used by the host
//! binary when no vendor backend is compiled in, and handy for piping
//! breadcrumbs and captures into another collector.

use std::io::Write;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{json, Value};
use uuid::Uuid;

use crate::dispatch::severity::{BreadcrumbSeverity, CaptureSeverity};
use crate::sink::{CaptureEvent, MonitoringSink, SinkError, SinkFactory, SinkOptions};

pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<Option<W>>,
    environment: String,
    release: String,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W, options: &SinkOptions) -> Self {
        Self {
            writer: Mutex::new(Some(writer)),
            environment: options.environment.clone(),
            release: options.release.clone(),
        }
    }

    fn write_line(&self, mut line: Value) -> Result<(), SinkError> {
        line["timestamp_ms"] = json!(now_millis());
        line["environment"] = json!(self.environment);
        line["release"] = json!(self.release);

        let mut guard = self
            .writer
            .lock()
            .map_err(|_| SinkError::Transport("writer mutex poisoned".to_string()))?;
        let writer = guard
            .as_mut()
            .ok_or_else(|| SinkError::Transport("sink already disposed".to_string()))?;

        serde_json::to_writer(&mut *writer, &line)
            .map_err(|e| SinkError::Transport(e.to_string()))?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

impl<W: Write + Send> MonitoringSink for JsonLinesSink<W> {
    fn add_breadcrumb(
        &self,
        message: &str,
        category: &str,
        severity: BreadcrumbSeverity,
    ) -> Result<(), SinkError> {
        self.write_line(json!({
            "type": "breadcrumb",
            "message": message,
            "category": category,
            "level": severity,
        }))
    }

    fn capture_message(&self, message: &str, severity: CaptureSeverity) -> Result<(), SinkError> {
        self.write_line(json!({
            "type": "message",
            "event_id": Uuid::new_v4(),
            "message": message,
            "level": severity,
        }))
    }

    fn capture_event(&self, event: CaptureEvent) -> Result<(), SinkError> {
        self.write_line(json!({
            "type": "event",
            "event_id": Uuid::new_v4(),
            "level": event.severity,
            "message": event.message,
            "error": event.error,
            "tags": event.tags,
        }))
    }

    fn dispose(&self) -> Result<(), SinkError> {
        let mut guard = self
            .writer
            .lock()
            .map_err(|_| SinkError::Dispose("writer mutex poisoned".to_string()))?;
        if let Some(mut writer) = guard.take() {
            writer.flush().map_err(|e| SinkError::Dispose(e.to_string()))?;
        }
        Ok(())
    }
}

/// Factory creating a fresh writer per initialization.
pub struct JsonLinesFactory<M> {
    make_writer: M,
}

impl<M> JsonLinesFactory<M> {
    pub fn new(make_writer: M) -> Self {
        Self { make_writer }
    }
}

impl JsonLinesFactory<fn() -> std::io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(std::io::stderr)
    }
}

impl<M, W> SinkFactory for JsonLinesFactory<M>
where
    M: Fn() -> W + Send + Sync,
    W: Write + Send + 'static,
{
    fn init(&self, options: &SinkOptions) -> Result<Box<dyn MonitoringSink>, SinkError> {
        if options.endpoint.is_empty() {
            return Err(SinkError::Init("endpoint is empty".to_string()));
        }
        Ok(Box::new(JsonLinesSink::new((self.make_writer)(), options)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitoringConfig;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn lines(&self) -> Vec<Value> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect()
        }
    }

    fn options() -> SinkOptions {
        let config = MonitoringConfig {
            endpoint: "https://ingest.example/1".into(),
            release: "1.0.0".into(),
            ..Default::default()
        };
        SinkOptions::from_config(&config, None)
    }

    #[test]
    fn test_writes_one_line_per_call() {
        let buf = SharedBuf::default();
        let sink = JsonLinesSink::new(buf.clone(), &options());

        sink.add_breadcrumb("timeout", "Net", BreadcrumbSeverity::Warning).unwrap();
        sink.capture_message("[Net] timeout", CaptureSeverity::Warning).unwrap();
        sink.capture_event(CaptureEvent::error("X", "[X] boom".into(), CaptureSeverity::Fatal))
            .unwrap();

        let lines = buf.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["type"], "breadcrumb");
        assert_eq!(lines[0]["category"], "Net");
        assert_eq!(lines[0]["level"], "warning");
        assert_eq!(lines[1]["message"], "[Net] timeout");
        assert!(lines[1]["event_id"].is_string());
        assert_eq!(lines[2]["error"]["message"], "[X] boom");
        assert_eq!(lines[2]["tags"]["tag"], "X");
        assert_eq!(lines[2]["release"], "1.0.0");
    }

    #[test]
    fn test_calls_after_dispose_fail() {
        let buf = SharedBuf::default();
        let sink = JsonLinesSink::new(buf.clone(), &options());
        sink.dispose().unwrap();
        assert!(sink.capture_message("late", CaptureSeverity::Info).is_err());
        assert!(sink.dispose().is_ok());
    }

    #[test]
    fn test_factory_rejects_empty_endpoint() {
        let factory = JsonLinesFactory::new(SharedBuf::default);
        let opts = SinkOptions::from_config(&MonitoringConfig::default(), None);
        assert!(factory.init(&opts).is_err());
        assert!(factory.init(&options()).is_ok());
    }
}
