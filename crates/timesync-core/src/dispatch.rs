//! Subscriber list broadcasting the current event list.
//!
//! Every synchronizer owns one [`EventDispatcher`]. Publishing replaces the
//! current list and calls each subscriber in the order it subscribed.

use timesync_types::TimeEvent;

/// Handler invoked with the event list after every publish.
pub type Listener = Box<dyn FnMut(&[TimeEvent])>;

/// Handle returned by [`EventDispatcher::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// Holds the last published event list and its subscribers.
#[derive(Default)]
pub struct EventDispatcher {
    current: Vec<TimeEvent>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl EventDispatcher {
    /// Create a dispatcher with an empty current list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler.
    ///
    /// With `dispatch_now` the handler is called once with the current list
    /// before this returns.
    pub fn subscribe(&mut self, mut listener: Listener, dispatch_now: bool) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        if dispatch_now {
            listener(&self.current);
        }
        self.listeners.push((id, listener));
        id
    }

    /// Remove a handler. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Replace the current list and notify every subscriber.
    pub fn publish(&mut self, events: Vec<TimeEvent>) {
        self.current = events;
        for (_, listener) in &mut self.listeners {
            listener(&self.current);
        }
    }

    /// The last published list.
    pub fn current(&self) -> &[TimeEvent] {
        &self.current
    }
}

impl core::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("current", &self.current)
            .field("subscribers", &self.listeners.len())
            .finish()
    }
}
