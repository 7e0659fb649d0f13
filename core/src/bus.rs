//! Publish/subscribe fan-out of events to presentation observers.

use std::{collections::BTreeMap, fmt};

use crate::Event;

/// Handle returned by [`EventBus::subscribe`] and accepted by [`EventBus::unsubscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&Event)>;

/// Delivers every published event to each subscriber in subscription order.
#[derive(Default)]
pub struct EventBus {
    subscribers: BTreeMap<SubscriptionId, Handler>,
    next_id: u64,
}

impl EventBus {
    /// Creates a bus without subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler and returns the handle that removes it.
    pub fn subscribe(&mut self, handler: impl FnMut(&Event) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let _ = self.subscribers.insert(id, Box::new(handler));
        id
    }

    /// Removes a handler. Returns `false` when the handle was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(&id).is_some()
    }

    /// Removes every handler.
    pub fn clear(&mut self) {
        self.subscribers.clear();
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Reports whether no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Delivers each event to every handler.
    pub fn publish(&mut self, events: &[Event]) {
        for event in events {
            for handler in self.subscribers.values_mut() {
                handler(event);
            }
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}
