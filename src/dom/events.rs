//! Event listeners and dispatch state.
//!
//! Listeners are registered per node, per event type, with a capture flag.
//! A handler's identity is its allocation: two closures with identical
//! bodies are distinct, and removal only succeeds with a clone of the
//! handler that was registered. This mirrors how listener identity works in
//! browsers, where removal requires the same function object.

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::arena::NodeId;

/// Propagation phase an event is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    Capturing,
    AtTarget,
    Bubbling,
}

/// An event traveling through the tree.
///
/// Shared with handlers by reference; the dispatcher updates the current
/// target and phase between handler invocations.
pub struct Event {
    event_type: String,
    target: NodeId,
    current_target: Cell<NodeId>,
    phase: Cell<EventPhase>,
    propagation_stopped: Cell<bool>,
}

impl Event {
    pub(crate) fn new(event_type: &str, target: NodeId) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            current_target: Cell::new(target),
            phase: Cell::new(EventPhase::AtTarget),
            propagation_stopped: Cell::new(false),
        }
    }

    /// The event type this event was dispatched as.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// The node the event was dispatched at.
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// The node whose listener is currently running.
    pub fn current_target(&self) -> NodeId {
        self.current_target.get()
    }

    /// The current propagation phase.
    pub fn phase(&self) -> EventPhase {
        self.phase.get()
    }

    /// Stop the event from propagating past the current node.
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub(crate) fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    pub(crate) fn begin_phase(&self, phase: EventPhase, current: NodeId) {
        self.phase.set(phase);
        self.current_target.set(current);
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("event_type", &self.event_type)
            .field("target", &self.target)
            .field("phase", &self.phase.get())
            .finish()
    }
}

/// A callable event handler with pointer identity.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&Event)>);

impl EventHandler {
    pub fn new(handler: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(handler))
    }

    pub(crate) fn call(&self, event: &Event) {
        (self.0)(event);
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", Rc::as_ptr(&self.0))
    }
}

impl<F: Fn(&Event) + 'static> From<F> for EventHandler {
    fn from(handler: F) -> Self {
        Self::new(handler)
    }
}

/// One registration: a handler plus the phase it listens in.
#[derive(Debug, Clone)]
struct Listener {
    capture: bool,
    handler: EventHandler,
}

/// Listener registrations for the whole document, keyed by node then event
/// type.
#[derive(Debug, Default)]
pub(crate) struct ListenerStore {
    listeners: HashMap<NodeId, HashMap<String, Vec<Listener>>>,
}

impl ListenerStore {
    /// Register a listener. Duplicate registrations of the same handler for
    /// the same type and phase are ignored, as in browsers.
    pub fn add(&mut self, node: NodeId, event_type: &str, handler: EventHandler, capture: bool) {
        let listeners = self
            .listeners
            .entry(node)
            .or_default()
            .entry(event_type.to_string())
            .or_default();
        if listeners
            .iter()
            .any(|l| l.capture == capture && l.handler == handler)
        {
            return;
        }
        listeners.push(Listener { capture, handler });
    }

    /// Remove a listener matching handler identity and capture flag.
    /// Returns whether anything was removed.
    pub fn remove(
        &mut self,
        node: NodeId,
        event_type: &str,
        handler: &EventHandler,
        capture: bool,
    ) -> bool {
        let Some(by_type) = self.listeners.get_mut(&node) else {
            return false;
        };
        let Some(listeners) = by_type.get_mut(event_type) else {
            return false;
        };

        let Some(position) = listeners
            .iter()
            .position(|l| l.capture == capture && &l.handler == handler)
        else {
            return false;
        };
        listeners.remove(position);

        // Drop empty buckets so the map doesn't accumulate tombstones.
        if listeners.is_empty() {
            by_type.remove(event_type);
        }
        if by_type.is_empty() {
            self.listeners.remove(&node);
        }
        true
    }

    /// Handlers registered on a node for one type and phase, in
    /// registration order.
    pub fn handlers(&self, node: NodeId, event_type: &str, capture: bool) -> Vec<EventHandler> {
        self.listeners
            .get(&node)
            .and_then(|by_type| by_type.get(event_type))
            .map(|listeners| {
                listeners
                    .iter()
                    .filter(|l| l.capture == capture)
                    .map(|l| l.handler.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> EventHandler {
        EventHandler::new(|_| {})
    }

    #[test]
    fn test_handler_identity_is_per_allocation() {
        let a = noop();
        let b = noop();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_add_and_remove() {
        let mut store = ListenerStore::default();
        let node = NodeId(1);
        let handler = noop();

        store.add(node, "click", handler.clone(), false);
        assert_eq!(store.handlers(node, "click", false).len(), 1);
        assert!(store.handlers(node, "click", true).is_empty());

        // Wrong capture flag does not remove.
        assert!(!store.remove(node, "click", &handler, true));
        assert_eq!(store.handlers(node, "click", false).len(), 1);

        assert!(store.remove(node, "click", &handler, false));
        assert!(store.handlers(node, "click", false).is_empty());
        assert!(!store.remove(node, "click", &handler, false));
    }

    #[test]
    fn test_duplicate_registration_ignored() {
        let mut store = ListenerStore::default();
        let node = NodeId(1);
        let handler = noop();

        store.add(node, "click", handler.clone(), false);
        store.add(node, "click", handler.clone(), false);
        assert_eq!(store.handlers(node, "click", false).len(), 1);

        // Same handler in the other phase is a separate registration.
        store.add(node, "click", handler.clone(), true);
        assert_eq!(store.handlers(node, "click", true).len(), 1);
    }

    #[test]
    fn test_different_closures_do_not_collide() {
        let mut store = ListenerStore::default();
        let node = NodeId(1);
        let a = noop();
        let b = noop();

        store.add(node, "click", a.clone(), false);
        assert!(!store.remove(node, "click", &b, false));
        assert!(store.remove(node, "click", &a, false));
    }

    #[test]
    fn test_registration_order_preserved() {
        let mut store = ListenerStore::default();
        let node = NodeId(2);
        let a = noop();
        let b = noop();

        store.add(node, "focus", a.clone(), false);
        store.add(node, "focus", b.clone(), false);

        let handlers = store.handlers(node, "focus", false);
        assert_eq!(handlers.len(), 2);
        assert_eq!(handlers[0], a);
        assert_eq!(handlers[1], b);
    }

    #[test]
    fn test_event_state() {
        let event = Event::new("click", NodeId(7));
        assert_eq!(event.event_type(), "click");
        assert_eq!(event.target(), NodeId(7));
        assert!(!event.propagation_stopped());

        event.begin_phase(EventPhase::Capturing, NodeId(3));
        assert_eq!(event.phase(), EventPhase::Capturing);
        assert_eq!(event.current_target(), NodeId(3));
        assert_eq!(event.target(), NodeId(7));

        event.stop_propagation();
        assert!(event.propagation_stopped());
    }
}
