use crate::constants::DEFAULT_EVENT_CHANNEL_CAPACITY;
use crate::events::ResilienceEvent;
use tokio::sync::broadcast;
use tracing::trace;

/// Broadcast publisher for resilience events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<ResilienceEvent>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: ResilienceEvent) {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => trace!(event = name, receivers, "Event published"),
            Err(broadcast::error::SendError(_)) => {
                trace!(event = name, "Event dropped, no subscribers");
            }
        }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<ResilienceEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CHANNEL_CAPACITY)
    }
}
