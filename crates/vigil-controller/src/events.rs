//! Event sink implementations

use parking_lot::Mutex;
use tokio::sync::broadcast;
use vigil_types::{EventSink, StatusEvent};

/// Fans events out to any number of subscribers.
///
/// Publishing with no subscribers drops the event. Slow subscribers lag and
/// lose the oldest events once `capacity` is exceeded.
#[derive(Debug, Clone)]
pub struct BroadcastEventSink {
    tx: broadcast::Sender<StatusEvent>,
}

impl BroadcastEventSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl EventSink for BroadcastEventSink {
    fn publish(&self, event: StatusEvent) {
        let _ = self.tx.send(event);
    }
}

/// Records events in publish order
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<StatusEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StatusEvent> {
        self.events.lock().clone()
    }

    /// Reasons of the recorded events, in order
    pub fn reasons(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.reason.clone()).collect()
    }

    /// Remove and return everything recorded so far
    pub fn take(&self) -> Vec<StatusEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for MemoryEventSink {
    fn publish(&self, event: StatusEvent) {
        self.events.lock().push(event);
    }
}
