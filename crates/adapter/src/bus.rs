//! In-process event bus.
//!
//! A broadcast channel behind the [`EventPublisher`] seam. Subscribers that
//! fall behind lose the oldest events; publishing never blocks the session.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::core::EventPublisher;
use crate::types::ClassifiedEvent;

/// An event together with the topic it was published on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Published {
    pub topic: &'static str,
    #[serde(flatten)]
    pub event: ClassifiedEvent,
}

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Published>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Published> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventPublisher for EventBus {
    fn publish(&self, topic: &'static str, event: ClassifiedEvent) {
        // No subscribers is not an error.
        let _ = self.tx.send(Published { topic, event });
    }
}
