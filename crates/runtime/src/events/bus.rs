//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::{CombatEvent, RaidEvent, SetupEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Shop, roster and economy changes
    Setup,
    /// Combat snapshots and outcomes
    Combat,
    /// Round results and raid close
    Raid,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Setup(SetupEvent),
    Combat(CombatEvent),
    Raid(RaidEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Setup(_) => Topic::Setup,
            Event::Combat(_) => Topic::Combat,
            Event::Raid(_) => Topic::Raid,
        }
    }
}

impl From<SetupEvent> for Event {
    fn from(event: SetupEvent) -> Self {
        Event::Setup(event)
    }
}

impl From<CombatEvent> for Event {
    fn from(event: CombatEvent) -> Self {
        Event::Combat(event)
    }
}

impl From<RaidEvent> for Event {
    fn from(event: RaidEvent) -> Self {
        Event::Raid(event)
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Publishing never blocks: slow subscribers lag
/// and miss the oldest events.
#[derive(Clone)]
pub struct EventBus {
    setup: broadcast::Sender<Event>,
    combat: broadcast::Sender<Event>,
    raid: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            setup: broadcast::channel(capacity).0,
            combat: broadcast::channel(capacity).0,
            raid: broadcast::channel(capacity).0,
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Setup => &self.setup,
            Topic::Combat => &self.combat,
            Topic::Raid => &self.raid,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: impl Into<Event>) {
        let event = event.into();
        let topic = event.topic();

        if self.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    ///
    /// Returns receivers for each requested topic.
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> std::collections::HashMap<Topic, broadcast::Receiver<Event>> {
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
