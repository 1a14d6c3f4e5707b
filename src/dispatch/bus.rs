//! Internal event bus.
//!
//! # Responsibilities
//! - Accept log events from the dispatcher (fire-and-forget)
//! - Fan events out to the host's own subscribers
//!
//! # Design Decisions
//! - `EventBus` is the seam; hosts can plug their own bus
//! - `BroadcastBus` uses a Tokio broadcast channel; slow subscribers lag
//!   and lose the oldest events instead of blocking producers
//! - `relay` drains everything already buffered before honoring shutdown

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use crate::dispatch::event::LogEvent;
use crate::lifecycle::shutdown::ShutdownListener;

/// Destination for every log event. Must never block or fail the caller.
pub trait EventBus: Send + Sync {
    fn post(&self, event: LogEvent);
}

/// Broadcast-channel backed bus.
#[derive(Debug, Clone)]
pub struct BroadcastBus {
    tx: broadcast::Sender<LogEvent>,
}

impl BroadcastBus {
    /// Create a bus retaining up to `capacity` undelivered events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus for BroadcastBus {
    fn post(&self, event: LogEvent) {
        // No subscribers is fine; the event is simply dropped.
        let _ = self.tx.send(event);
    }
}

/// Hand every event from `events` to `deliver` until shutdown is triggered or
/// the bus is closed. Events posted before the trigger are always delivered.
///
/// Returns the number of events delivered.
pub async fn relay<F>(
    mut events: broadcast::Receiver<LogEvent>,
    mut shutdown: ShutdownListener,
    mut deliver: F,
) -> usize
where
    F: FnMut(LogEvent),
{
    let mut delivered = 0;
    loop {
        tokio::select! {
            biased;
            received = events.recv() => match received {
                Ok(event) => {
                    deliver(event);
                    delivered += 1;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Bus subscriber lagged");
                }
                Err(RecvError::Closed) => return delivered,
            },
            _ = shutdown.wait() => break,
        }
    }

    loop {
        match events.try_recv() {
            Ok(event) => {
                deliver(event);
                delivered += 1;
            }
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Bus subscriber lagged");
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
    delivered
}
