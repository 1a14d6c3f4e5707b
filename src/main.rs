//! logrelay host binary.
//!
//! # Architecture Overview
//!
//! ```text
//!     stdin lines            ┌──────────────────────────────────────────────┐
//!     "LEVEL TAG message"    │                 LOGRELAY                      │
//!     ───────────────────────┼─▶ LogDispatcher ──────▶ BroadcastBus ────────┼──▶ bus subscriber
//!                            │        │                                     │    (local log line)
//!                            │        ▼                                     │
//!                            │   SinkHandle ◀──── MonitoringSinkLifecycle   │
//!                            │        │            (start / stop)           │
//!                            │        ▼                                     │
//!                            │   breadcrumb + capture ──────────────────────┼──▶ sentry / JSON lines
//!                            └──────────────────────────────────────────────┘
//! ```
//!
//! Reads events from stdin until EOF or a shutdown signal, then stops the
//! monitoring sink.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};

use logrelay::config::loader::{bind_section, load_table};
use logrelay::config::{LogFormat, LoggingConfig};
use logrelay::dispatch::bus::relay;
use logrelay::lifecycle::monitoring::BUILD_RELEASE;
use logrelay::observability::logging::init_logging;
use logrelay::sink::SinkFactory;
use logrelay::{BroadcastBus, LogDispatcher, LogEvent, LogLevel, MonitoringSinkLifecycle, Shutdown};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Json,
    Pretty,
}

impl From<FormatArg> for LogFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => LogFormat::Json,
            FormatArg::Pretty => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "logrelay", version, about = "Relay log events to an event bus and a monitoring sink")]
struct Args {
    /// TOML file with [logging] and [monitoring] sections.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Local log output format (overrides the config file).
    #[arg(long, value_enum)]
    log_format: Option<FormatArg>,

    /// Local log filter, e.g. "info" or "logrelay=debug".
    #[arg(long)]
    log_level: Option<String>,

    /// Events buffered per bus subscriber.
    #[arg(long, default_value_t = 1024)]
    bus_capacity: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let raw = match &args.config {
        Some(path) => load_table(path)?,
        None => toml::Table::new(),
    };

    let mut logging: LoggingConfig = bind_section(&raw, "logging")?;
    if let Some(format) = args.log_format {
        logging.format = format.into();
    }
    if let Some(level) = args.log_level {
        logging.level = level;
    }
    init_logging(&logging)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "logrelay starting");

    let lifecycle =
        MonitoringSinkLifecycle::new(sink_factory()).with_release_fallback(Some(release_fallback()));
    lifecycle.start(&raw).await;

    let bus = BroadcastBus::new(args.bus_capacity);
    let dispatcher = lifecycle.dispatcher(Arc::new(bus.clone()));
    let shutdown = Arc::new(Shutdown::new());

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signal_shutdown.trigger_on_signal().await;
    });

    let subscriber = tokio::spawn(relay(bus.subscribe(), shutdown.subscribe(), |event| {
        tracing::info!(
            tag = %event.tag,
            level = %event.level,
            message = %event.message,
            "Bus event"
        )
    }));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input_shutdown = shutdown.subscribe();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => dispatch_line(&dispatcher, &line),
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read stdin");
                    break;
                }
            },
            _ = input_shutdown.wait() => break,
        }
    }

    shutdown.trigger();
    match subscriber.await {
        Ok(delivered) => tracing::debug!(delivered, "Bus subscriber finished"),
        Err(e) => tracing::error!(error = %e, "Bus subscriber failed"),
    }
    lifecycle.stop().await;

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(feature = "sentry")]
fn sink_factory() -> Arc<dyn SinkFactory> {
    Arc::new(logrelay::sink::sentry::SentryFactory::default())
}

#[cfg(not(feature = "sentry"))]
fn sink_factory() -> Arc<dyn SinkFactory> {
    Arc::new(logrelay::sink::json::JsonLinesFactory::stderr())
}

/// Build-embedded release id, else the package version.
fn release_fallback() -> String {
    BUILD_RELEASE
        .map(String::from)
        .unwrap_or_else(|| format!("logrelay@{}", env!("CARGO_PKG_VERSION")))
}

fn dispatch_line(dispatcher: &LogDispatcher, line: &str) {
    let Some(event) = parse_line(line) else {
        return;
    };
    match event.level {
        LogLevel::Warning => dispatcher.warning(&event.tag, &event.message),
        LogLevel::Fatal => dispatcher.fatal(&event.tag, &event.message),
        _ => dispatcher.log_event(event),
    }
}

/// Parse `LEVEL TAG message...`. Unknown levels become `Information`.
fn parse_line(line: &str) -> Option<LogEvent> {
    let mut parts = line.trim().splitn(3, char::is_whitespace);
    let level = parts.next().filter(|s| !s.is_empty())?;
    let tag = parts.next().filter(|s| !s.is_empty())?;
    let message = parts.next().unwrap_or("").trim();

    let level = level.parse::<LogLevel>().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Treating unknown level as information");
        LogLevel::Information
    });
    Some(LogEvent::new(tag, level, message))
}
