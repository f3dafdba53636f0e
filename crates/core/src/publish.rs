//! Event publisher seam.

use crate::types::ClassifiedEvent;

/// Receives classified events for fan-out to subscribers.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, topic: &'static str, event: ClassifiedEvent);
}

/// Publisher that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPublisher;

impl EventPublisher for NullPublisher {
    fn publish(&self, _topic: &'static str, _event: ClassifiedEvent) {}
}
