use crate::recorder::ControllerEvent;

use tokio::sync::broadcast;
use tracing::trace;

/// Receiver of controller events, injected at construction.
///
/// Called on the controller task; implementations must not block.
pub trait EventSink: Send + Sync + 'static {
    /// Deliver one event.
    fn emit(&self, event: ControllerEvent);
}

impl<F> EventSink for F
where
    F: Fn(ControllerEvent) + Send + Sync + 'static,
{
    fn emit(&self, event: ControllerEvent) {
        self(event)
    }
}

/// Fans events out to any number of async subscribers.
///
/// Slow subscribers lag and skip events rather than stalling the controller.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<ControllerEvent>,
}

impl BroadcastSink {
    /// Create a sink buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Start receiving events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.tx.subscribe()
    }
}

impl EventSink for BroadcastSink {
    fn emit(&self, event: ControllerEvent) {
        if self.tx.send(event).is_err() {
            trace!("No event subscribers");
        }
    }
}
