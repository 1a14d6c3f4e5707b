//! Monitoring sink lifecycle.
//!
//! # States
//! ```text
//! Stopped → Starting → Running   (sink initialized and published)
//! Stopped → Starting → Stopped   (disabled, invalid or failed init)
//! Running → Stopped              (stop: unpublish, then dispose)
//! ```
//!
//! # Design Decisions
//! - Sole writer of the `SinkHandle`; dispatchers only read it
//! - Start/stop are serialized by an async mutex; state is mirrored in an
//!   atomic so readers never wait
//! - Backend init and dispose run on the blocking pool
//! - Every failure is logged and absorbed; monitoring is always optional

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::Mutex;

use crate::config::loader::{bind_monitoring, ConfigError};
use crate::config::schema::MonitoringConfig;
use crate::config::validation::validate_monitoring;
use crate::dispatch::{EventBus, LogDispatcher};
use crate::observability::metrics;
use crate::sink::{guarded, MonitoringSink, SinkError, SinkFactory, SinkHandle, SinkOptions};

/// Release id embedded at build time via `LOGRELAY_RELEASE`, if any.
pub const BUILD_RELEASE: Option<&str> = option_env!("LOGRELAY_RELEASE");

/// Lifecycle state.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Stopped = 0,
    Starting = 1,
    Running = 2,
}

impl From<u8> for LifecycleState {
    fn from(val: u8) -> Self {
        match val {
            1 => LifecycleState::Starting,
            2 => LifecycleState::Running,
            _ => LifecycleState::Stopped,
        }
    }
}

/// Owns the optional monitoring sink for the lifetime of the host.
///
/// Call [`stop`](Self::stop) before dropping. Dropping a running lifecycle
/// disposes the sink synchronously, which may block for the backend's flush
/// timeout; on a multi-threaded Tokio runtime that wait is moved off the
/// worker with `block_in_place`.
pub struct MonitoringSinkLifecycle {
    factory: Arc<dyn SinkFactory>,
    handle: SinkHandle,
    config: ArcSwap<MonitoringConfig>,
    state: AtomicU8,
    transition: Mutex<()>,
    release_fallback: Option<String>,
}

impl MonitoringSinkLifecycle {
    pub fn new(factory: Arc<dyn SinkFactory>) -> Self {
        Self {
            factory,
            handle: SinkHandle::new(),
            config: ArcSwap::from_pointee(MonitoringConfig::default()),
            state: AtomicU8::new(LifecycleState::Stopped as u8),
            transition: Mutex::new(()),
            release_fallback: BUILD_RELEASE.map(String::from),
        }
    }

    /// Override the build-embedded release used when the config has none.
    pub fn with_release_fallback(mut self, release: Option<String>) -> Self {
        self.release_fallback = release;
        self
    }

    /// Reader side of the sink slot, for dispatchers.
    pub fn handle(&self) -> SinkHandle {
        self.handle.clone()
    }

    /// Build a dispatcher wired to this lifecycle's sink.
    pub fn dispatcher(&self, bus: Arc<dyn EventBus>) -> LogDispatcher {
        LogDispatcher::new(bus, self.handle())
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from(self.state.load(Ordering::Acquire))
    }

    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    /// The bound configuration. The endpoint reads empty after a failed start.
    pub fn config(&self) -> MonitoringConfig {
        self.config.load().as_ref().clone()
    }

    /// Bind the monitoring section of `raw` and start the sink.
    pub async fn start(&self, raw: &toml::Table) {
        self.start_from(bind_monitoring(raw)).await;
    }

    /// Start the sink from an already-bound configuration.
    pub async fn start_with(&self, config: MonitoringConfig) {
        self.start_from(Ok(config)).await;
    }

    async fn start_from(&self, bound: Result<MonitoringConfig, ConfigError>) {
        let _guard = self.transition.lock().await;

        if self.is_running() {
            tracing::warn!("Monitoring sink is already running; stop it before starting again");
            return;
        }

        let config = match bound {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to bind monitoring configuration");
                self.fail(MonitoringConfig::default());
                return;
            }
        };

        if !config.is_enabled() {
            tracing::warn!("Monitoring is disabled because endpoint is not set");
            self.config.store(Arc::new(config));
            return;
        }

        self.set_state(LifecycleState::Starting);

        if let Err(errors) = validate_monitoring(&config) {
            for e in &errors {
                tracing::error!(error = %e, "Invalid monitoring configuration");
            }
            tracing::error!(count = errors.len(), "Failed to initialize monitoring sink");
            self.fail(config);
            return;
        }

        let options = SinkOptions::from_config(&config, self.release_fallback.as_deref());
        let environment = options.environment.clone();
        let release = options.release.clone();
        let proxied = options.proxy.descriptor().is_some();

        match self.init_sink(options).await {
            Ok(sink) => {
                self.handle.publish(sink);
                self.config.store(Arc::new(config));
                self.set_state(LifecycleState::Running);
                metrics::set_sink_running(true);
                tracing::info!(
                    environment = %environment,
                    release = %release,
                    proxied,
                    "Monitoring sink was successfully configured"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize monitoring sink");
                self.fail(config);
            }
        }
    }

    async fn init_sink(&self, options: SinkOptions) -> Result<Box<dyn MonitoringSink>, SinkError> {
        let factory = self.factory.clone();
        tokio::task::spawn_blocking(move || guarded("init", || factory.init(&options)))
            .await
            .map_err(|e| SinkError::Init(e.to_string()))?
    }

    /// Stop the sink if running. Idempotent.
    pub async fn stop(&self) {
        let _guard = self.transition.lock().await;

        if !self.is_running() {
            tracing::debug!("Monitoring sink is not running; nothing to stop");
            return;
        }

        let sink = self.handle.take();
        self.set_state(LifecycleState::Stopped);
        metrics::set_sink_running(false);

        let Some(sink) = sink else {
            return;
        };

        let result = tokio::task::spawn_blocking(move || guarded("dispose", || sink.dispose()))
            .await
            .map_err(|e| SinkError::Dispose(e.to_string()))
            .and_then(|r| r);

        match result {
            Ok(()) => tracing::info!("Monitoring sink has been stopped"),
            Err(e) => tracing::error!(error = %e, "Error occurred while stopping monitoring sink"),
        }
    }

    fn fail(&self, mut config: MonitoringConfig) {
        config.endpoint.clear();
        self.config.store(Arc::new(config));
        self.set_state(LifecycleState::Stopped);
    }

    fn set_state(&self, state: LifecycleState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

impl Drop for MonitoringSinkLifecycle {
    fn drop(&mut self) {
        if let Some(sink) = self.handle.take() {
            tracing::warn!("Monitoring sink dropped while running; disposing");
            let dispose = || guarded("dispose", || sink.dispose());
            let result = match Handle::try_current() {
                Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                    tokio::task::block_in_place(dispose)
                }
                _ => dispose(),
            };
            if let Err(e) = result {
                tracing::error!(error = %e, "Error occurred while stopping monitoring sink");
            }
        }
    }
}

impl std::fmt::Debug for MonitoringSinkLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitoringSinkLifecycle")
            .field("state", &self.state())
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{DiagnosticLevel, ProxyConfig};
    use crate::dispatch::severity::CaptureSeverity;
    use crate::sink::memory::{FailMode, RecordingFactory, RecordingSink, SinkOp};

    fn enabled() -> MonitoringConfig {
        MonitoringConfig {
            endpoint: "https://ingest.example/1".into(),
            ..Default::default()
        }
    }

    fn lifecycle(factory: &RecordingFactory) -> MonitoringSinkLifecycle {
        MonitoringSinkLifecycle::new(Arc::new(factory.clone())).with_release_fallback(None)
    }

    #[tokio::test]
    async fn test_empty_endpoint_skips_init() {
        let factory = RecordingFactory::default();
        let lifecycle = lifecycle(&factory);

        lifecycle
            .start_with(MonitoringConfig {
                endpoint: "  ".into(),
                ..Default::default()
            })
            .await;

        assert_eq!(factory.init_calls(), 0);
        assert_eq!(lifecycle.state(), LifecycleState::Stopped);
        assert!(!lifecycle.handle().is_present());
        assert!(!lifecycle.config().is_enabled());
    }

    #[tokio::test]
    async fn test_successful_start_publishes_sink() {
        let factory = RecordingFactory::default();
        let lifecycle = lifecycle(&factory);

        lifecycle
            .start_with(MonitoringConfig {
                diagnostic_level: DiagnosticLevel::Warning,
                ..enabled()
            })
            .await;

        assert!(lifecycle.is_running());
        assert!(lifecycle.handle().is_present());
        assert_eq!(lifecycle.config().endpoint, "https://ingest.example/1");
        let options = factory.last_options().unwrap();
        assert_eq!(options.diagnostic_level, CaptureSeverity::Warning);
        assert_eq!(options.release, "unknown");
    }

    #[tokio::test]
    async fn test_init_error_forces_endpoint_empty() {
        let factory = RecordingFactory::default().failing(FailMode::Error);
        let lifecycle = lifecycle(&factory);

        lifecycle.start_with(enabled()).await;

        assert_eq!(factory.init_calls(), 1);
        assert_eq!(lifecycle.state(), LifecycleState::Stopped);
        assert!(!lifecycle.handle().is_present());
        assert_eq!(lifecycle.config().endpoint, "");
    }

    #[tokio::test]
    async fn test_init_panic_forces_endpoint_empty() {
        let factory = RecordingFactory::default().failing(FailMode::Panic);
        let lifecycle = lifecycle(&factory);

        lifecycle.start_with(enabled()).await;

        assert_eq!(lifecycle.state(), LifecycleState::Stopped);
        assert_eq!(lifecycle.config().endpoint, "");
    }

    #[tokio::test]
    async fn test_invalid_config_never_reaches_factory() {
        let factory = RecordingFactory::default();
        let lifecycle = lifecycle(&factory);

        lifecycle
            .start_with(MonitoringConfig {
                sample_rate: 4.0,
                ..enabled()
            })
            .await;

        assert_eq!(factory.init_calls(), 0);
        assert_eq!(lifecycle.config().endpoint, "");
        assert_eq!(lifecycle.config().sample_rate, 4.0);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let factory = RecordingFactory::default();
        let lifecycle = lifecycle(&factory);

        lifecycle.start_with(enabled()).await;
        lifecycle.stop().await;
        lifecycle.stop().await;

        assert_eq!(lifecycle.state(), LifecycleState::Stopped);
        assert_eq!(factory.sink().dispose_count(), 1);
        assert!(!lifecycle.handle().is_present());
    }

    #[tokio::test]
    async fn test_stop_before_start_is_noop() {
        let factory = RecordingFactory::default();
        let lifecycle = lifecycle(&factory);
        lifecycle.stop().await;
        assert_eq!(factory.sink().dispose_count(), 0);
    }

    #[tokio::test]
    async fn test_dispose_failure_is_absorbed() {
        let sink = RecordingSink::new().fail_on(SinkOp::Dispose, FailMode::Panic);
        let factory = RecordingFactory::new(sink);
        let lifecycle = lifecycle(&factory);

        lifecycle.start_with(enabled()).await;
        lifecycle.stop().await;

        assert_eq!(lifecycle.state(), LifecycleState::Stopped);
        assert_eq!(factory.sink().dispose_count(), 1);
    }

    #[tokio::test]
    async fn test_second_start_while_running_is_ignored() {
        let factory = RecordingFactory::default();
        let lifecycle = lifecycle(&factory);

        lifecycle.start_with(enabled()).await;
        lifecycle
            .start_with(MonitoringConfig {
                environment: "staging".into(),
                ..enabled()
            })
            .await;

        assert_eq!(factory.init_calls(), 1);
        assert_eq!(lifecycle.config().environment, "production");
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let factory = RecordingFactory::default();
        let lifecycle = lifecycle(&factory);

        lifecycle.start_with(enabled()).await;
        lifecycle.stop().await;
        lifecycle.start_with(enabled()).await;

        assert!(lifecycle.is_running());
        assert_eq!(factory.init_calls(), 2);
    }

    #[tokio::test]
    async fn test_start_binds_raw_table() {
        let factory = RecordingFactory::default();
        let lifecycle = lifecycle(&factory).with_release_fallback(Some("9.9.9".into()));
        let raw: toml::Table = toml::from_str(
            r#"
            [monitoring]
            endpoint = "https://ingest.example/1"
            environment = "staging"

            [monitoring.proxy]
            host = "proxy.local"
            port = 3128
            username = "bob"
            password = "secret"
            "#,
        )
        .unwrap();

        lifecycle.start(&raw).await;

        assert!(lifecycle.is_running());
        let options = factory.last_options().unwrap();
        assert_eq!(options.environment, "staging");
        assert_eq!(options.release, "9.9.9");
        let proxy = options.proxy.descriptor().unwrap();
        assert_eq!(proxy.credentials.as_ref().unwrap().username, "bob");
        assert_eq!(lifecycle.config().proxy, Some(ProxyConfig {
            host: Some("proxy.local".into()),
            port: Some(3128),
            username: Some("bob".into()),
            password: Some("secret".into()),
            ..Default::default()
        }));
    }

    #[tokio::test]
    async fn test_host_only_proxy_reaches_init_without_port() {
        let factory = RecordingFactory::default();
        let lifecycle = lifecycle(&factory);

        lifecycle
            .start_with(MonitoringConfig {
                proxy: Some(ProxyConfig {
                    host: Some("proxy.local".into()),
                    port: None,
                    ..Default::default()
                }),
                ..enabled()
            })
            .await;

        assert!(lifecycle.is_running());
        assert_eq!(factory.init_calls(), 1);
        let options = factory.last_options().unwrap();
        let proxy = options.proxy.descriptor().unwrap();
        assert_eq!(proxy.host, "proxy.local");
        assert_eq!(proxy.port, None);
        assert!(proxy.credentials.is_none());
        assert_eq!(lifecycle.config().endpoint, "https://ingest.example/1");
    }

    #[tokio::test]
    async fn test_whitespace_proxy_host_means_no_proxy() {
        let factory = RecordingFactory::default();
        let lifecycle = lifecycle(&factory);

        lifecycle
            .start_with(MonitoringConfig {
                proxy: Some(ProxyConfig {
                    host: Some("   ".into()),
                    port: None,
                    username: Some("bob".into()),
                    ..Default::default()
                }),
                ..enabled()
            })
            .await;

        assert!(lifecycle.is_running());
        assert!(factory.last_options().unwrap().proxy.descriptor().is_none());
    }

    #[tokio::test]
    async fn test_empty_environment_passes_through() {
        let factory = RecordingFactory::default();
        let lifecycle = lifecycle(&factory);

        lifecycle
            .start_with(MonitoringConfig {
                environment: String::new(),
                ..enabled()
            })
            .await;

        assert!(lifecycle.is_running());
        assert_eq!(factory.last_options().unwrap().environment, "");
    }

    #[tokio::test]
    async fn test_start_with_unbindable_table() {
        let factory = RecordingFactory::default();
        let lifecycle = lifecycle(&factory);
        let raw: toml::Table = toml::from_str(
            r#"
            [monitoring]
            endpoint = 42
            "#,
        )
        .unwrap();

        lifecycle.start(&raw).await;

        assert_eq!(factory.init_calls(), 0);
        assert_eq!(lifecycle.state(), LifecycleState::Stopped);
        assert_eq!(lifecycle.config(), MonitoringConfig::default());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_drop_on_worker_thread_disposes_running_sink() {
        let factory = RecordingFactory::default();
        let lifecycle = lifecycle(&factory);
        lifecycle.start_with(enabled()).await;

        drop(lifecycle);

        assert_eq!(factory.sink().dispose_count(), 1);
    }

    #[test]
    fn test_drop_outside_runtime_disposes_running_sink() {
        let factory = RecordingFactory::default();
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let lifecycle = lifecycle(&factory);
        runtime.block_on(lifecycle.start_with(enabled()));

        drop(lifecycle);

        assert_eq!(factory.sink().dispose_count(), 1);
    }

    #[tokio::test]
    async fn test_drop_disposes_running_sink() {
        let factory = RecordingFactory::default();
        {
            let lifecycle = lifecycle(&factory);
            lifecycle.start_with(enabled()).await;
        }
        assert_eq!(factory.sink().dispose_count(), 1);
    }
}
