//! Sentry backend.
//!
//! Maps `SinkOptions` onto `sentry::ClientOptions` and routes every call
//! through a private `Hub`, so the process-wide Sentry hub is never touched.
//!
//! The Sentry SDK has no diagnostic-level knob; `debug` switches its
//! self-logging on and `diagnostic_level` is only reported locally.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use sentry::protocol::{Event, Exception, Level};
use sentry::{Breadcrumb, Client, ClientOptions, Hub, Scope};

use crate::dispatch::severity::{BreadcrumbSeverity, CaptureSeverity};
use crate::sink::{CaptureEvent, MonitoringSink, SinkError, SinkFactory, SinkOptions};

/// Default time allowed for flushing queued events on dispose.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

pub struct SentrySink {
    hub: Hub,
    client: Arc<Client>,
    close_timeout: Duration,
}

impl MonitoringSink for SentrySink {
    fn add_breadcrumb(
        &self,
        message: &str,
        category: &str,
        severity: BreadcrumbSeverity,
    ) -> Result<(), SinkError> {
        self.hub.add_breadcrumb(Breadcrumb {
            message: Some(message.to_string()),
            category: Some(category.to_string()),
            level: breadcrumb_level(severity),
            ..Default::default()
        });
        Ok(())
    }

    fn capture_message(&self, message: &str, severity: CaptureSeverity) -> Result<(), SinkError> {
        self.hub.capture_message(message, capture_level(severity));
        Ok(())
    }

    fn capture_event(&self, capture: CaptureEvent) -> Result<(), SinkError> {
        let exception = capture
            .error
            .map(|error| {
                vec![Exception {
                    ty: error.kind,
                    value: Some(error.message),
                    ..Default::default()
                }]
            })
            .unwrap_or_default();

        let event = Event {
            level: capture_level(capture.severity),
            message: capture.message,
            exception: exception.into(),
            tags: capture.tags,
            ..Default::default()
        };
        self.hub.capture_event(event);
        Ok(())
    }

    fn dispose(&self) -> Result<(), SinkError> {
        if self.client.close(Some(self.close_timeout)) {
            Ok(())
        } else {
            Err(SinkError::Dispose(format!(
                "events still queued after {:?}",
                self.close_timeout
            )))
        }
    }
}

/// Builds `SentrySink`s.
#[derive(Debug, Clone)]
pub struct SentryFactory {
    close_timeout: Duration,
}

impl SentryFactory {
    pub fn new(close_timeout: Duration) -> Self {
        Self { close_timeout }
    }
}

impl Default for SentryFactory {
    fn default() -> Self {
        Self::new(DEFAULT_CLOSE_TIMEOUT)
    }
}

impl SinkFactory for SentryFactory {
    fn init(&self, options: &SinkOptions) -> Result<Box<dyn MonitoringSink>, SinkError> {
        let client_options = client_options(options)?;
        let client = Arc::new(Client::from(sentry::apply_defaults(client_options)));
        if !client.is_enabled() {
            return Err(SinkError::Init("sentry client is disabled".to_string()));
        }

        tracing::debug!(
            diagnostic_level = ?options.diagnostic_level,
            debug = options.debug,
            "Sentry client created"
        );

        let hub = Hub::new(Some(client.clone()), Arc::new(Scope::default()));
        Ok(Box::new(SentrySink {
            hub,
            client,
            close_timeout: self.close_timeout,
        }))
    }
}

pub fn client_options(options: &SinkOptions) -> Result<ClientOptions, SinkError> {
    let dsn = options
        .endpoint
        .parse::<sentry::types::Dsn>()
        .map_err(|e| SinkError::Init(format!("invalid DSN: {}", e)))?;

    let proxy: Option<Cow<'static, str>> = match options.proxy.descriptor() {
        Some(descriptor) => Some(Cow::Owned(descriptor.to_url()?.to_string())),
        None => None,
    };

    Ok(ClientOptions {
        dsn: Some(dsn),
        debug: options.debug,
        environment: Some(Cow::Owned(options.environment.clone())),
        release: Some(Cow::Owned(options.release.clone())),
        sample_rate: options.sample_rate,
        traces_sample_rate: options.traces_sample_rate as f32,
        max_breadcrumbs: options.max_breadcrumbs,
        attach_stacktrace: options.attach_stacktrace,
        send_default_pii: options.send_default_pii,
        auto_session_tracking: options.auto_session_tracking,
        http_proxy: proxy.clone(),
        https_proxy: proxy,
        ..Default::default()
    })
}

fn breadcrumb_level(severity: BreadcrumbSeverity) -> Level {
    match severity {
        BreadcrumbSeverity::Debug => Level::Debug,
        BreadcrumbSeverity::Info => Level::Info,
        BreadcrumbSeverity::Warning => Level::Warning,
        BreadcrumbSeverity::Error => Level::Error,
        BreadcrumbSeverity::Critical => Level::Fatal,
    }
}

fn capture_level(severity: CaptureSeverity) -> Level {
    match severity {
        CaptureSeverity::Debug => Level::Debug,
        CaptureSeverity::Info => Level::Info,
        CaptureSeverity::Warning => Level::Warning,
        CaptureSeverity::Error => Level::Error,
        CaptureSeverity::Fatal => Level::Fatal,
    }
}
