//! Broadcast bus for runtime events

use crate::event::RuntimeEvent;
use tokio::sync::broadcast;
use tracing::debug;

/// Default number of buffered events before slow subscribers lag.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Cloneable handle to a shared broadcast channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RuntimeEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Send an event to all current subscribers.
    ///
    /// Never blocks. With no subscribers the event is dropped.
    pub fn emit(&self, event: RuntimeEvent) {
        let event_type = event.event_type();
        match self.tx.send(event) {
            Ok(receivers) => {
                debug!(event_type = event_type, receivers = receivers, "Emitted event");
            }
            Err(_) => {
                debug!(event_type = event_type, "No subscribers for event");
            }
        }
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<RuntimeEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
