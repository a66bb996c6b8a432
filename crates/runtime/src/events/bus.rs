//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::broadcast;

use waystone_core::ActorId;

use super::types::{RequestEvent, WarmupEvent};
use crate::session::{Notice, Notifier};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Pending action lifecycle
    Warmup,
    /// Request lifecycle
    Request,
    /// Notices addressed to individual actors
    Notice,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Warmup(WarmupEvent),
    Request(RequestEvent),
    Notice { actor: ActorId, notice: Notice },
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Warmup(_) => Topic::Warmup,
            Event::Request(_) => Topic::Request,
            Event::Notice { .. } => Topic::Notice,
        }
    }
}

/// Topic-based event bus
///
/// One broadcast channel per topic, created up front. Cloning shares the
/// channels.
#[derive(Clone)]
pub struct EventBus {
    warmup: broadcast::Sender<Event>,
    request: broadcast::Sender<Event>,
    notice: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            warmup: broadcast::channel(capacity).0,
            request: broadcast::channel(capacity).0,
            notice: broadcast::channel(capacity).0,
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Warmup => &self.warmup,
            Topic::Request => &self.request,
            Topic::Notice => &self.notice,
        }
    }

    /// Publish an event to its corresponding topic
    ///
    /// Best-effort: an event with no subscribers is dropped.
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// [`Notifier`] that republishes notices on [`Topic::Notice`].
#[derive(Clone)]
pub struct BusNotifier {
    bus: EventBus,
}

impl BusNotifier {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }
}

impl Notifier for BusNotifier {
    fn notify(&self, actor: ActorId, notice: Notice) {
        self.bus.publish(Event::Notice { actor, notice });
    }
}
