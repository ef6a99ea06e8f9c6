//! Events
//!
//! Window and element event listeners with `once` semantics.

use std::rc::Rc;
use tpo_dom::NodeId;

/// Event types the optimizer listens for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Scroll,
    MouseMove,
    TouchStart,
    KeyDown,
    Click,
    MouseEnter,
    DomContentLoaded,
    Load,
}

/// Event listener target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTarget {
    Window,
    Node(NodeId),
}

/// Listener identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

struct Listener {
    id: u32,
    target: EventTarget,
    event: EventType,
    once: bool,
    callback: Rc<dyn Fn()>,
}

/// Registered event listeners
#[derive(Default)]
pub(crate) struct ListenerSet {
    listeners: Vec<Listener>,
    next_id: u32,
}

impl ListenerSet {
    /// Register a listener.
    pub fn add(
        &mut self,
        target: EventTarget,
        event: EventType,
        once: bool,
        callback: Rc<dyn Fn()>,
    ) -> ListenerId {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push(Listener {
            id,
            target,
            event,
            once,
            callback,
        });
        ListenerId(id)
    }

    /// Remove a listener. Unknown ids are ignored.
    pub fn remove(&mut self, id: ListenerId) {
        self.listeners.retain(|l| l.id != id.0);
    }

    /// Collect callbacks for an event, removing `once` listeners.
    pub fn collect(&mut self, target: EventTarget, event: EventType) -> Vec<Rc<dyn Fn()>> {
        let matched: Vec<Rc<dyn Fn()>> = self
            .listeners
            .iter()
            .filter(|l| l.target == target && l.event == event)
            .map(|l| l.callback.clone())
            .collect();
        self.listeners
            .retain(|l| !(l.once && l.target == target && l.event == event));
        matched
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}
