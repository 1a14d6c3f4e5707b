//! Shared utilities for integration tests.

use std::sync::{Arc, Mutex};

use logrelay::config::MonitoringConfig;
use logrelay::sink::memory::{RecordingFactory, RecordingSink};
use logrelay::{EventBus, LogDispatcher, LogEvent, MonitoringSinkLifecycle};

/// Bus that keeps every posted event.
#[derive(Default)]
pub struct CollectingBus {
    events: Mutex<Vec<LogEvent>>,
}

impl CollectingBus {
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventBus for CollectingBus {
    fn post(&self, event: LogEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// A lifecycle, its dispatcher, the bus it posts to and the factory behind it.
pub struct Harness {
    pub lifecycle: MonitoringSinkLifecycle,
    pub dispatcher: LogDispatcher,
    pub bus: Arc<CollectingBus>,
    pub factory: RecordingFactory,
}

impl Harness {
    pub fn new(factory: RecordingFactory) -> Self {
        let lifecycle =
            MonitoringSinkLifecycle::new(Arc::new(factory.clone())).with_release_fallback(None);
        let bus = Arc::new(CollectingBus::default());
        let dispatcher = lifecycle.dispatcher(bus.clone());
        Self {
            lifecycle,
            dispatcher,
            bus,
            factory,
        }
    }

    pub fn sink(&self) -> &RecordingSink {
        self.factory.sink()
    }
}

/// Config with a usable endpoint and every other field at its default.
pub fn enabled_config() -> MonitoringConfig {
    MonitoringConfig {
        endpoint: "https://ingest.example/1".into(),
        ..Default::default()
    }
}
