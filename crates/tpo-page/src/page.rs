//! Page - the host environment handle
//!
//! One `Page` per page load. Cloning the handle shares the underlying
//! state; callbacks capture their own clones to schedule follow-up
//! work. The loop never holds the interior borrow while a callback
//! runs, so callbacks may freely schedule, dispatch and inject.

use crate::events::{EventTarget, EventType, ListenerId, ListenerSet};
use crate::globals::Global;
use crate::observer::{ObserverId, ObserverSet};
use crate::timers::{IdleQueue, TimerId, TimerQueue};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tpo_dom::{Document, DomError, Element, NodeId, ReadyState, Viewport};

/// Host capabilities the trigger engine degrades over
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    /// Host exposes an idle-callback facility.
    pub request_idle_callback: bool,
    /// Host exposes intersection observation.
    pub intersection_observer: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            request_idle_callback: true,
            intersection_observer: true,
        }
    }
}

struct PageInner {
    document: Document,
    clock_ms: u64,
    viewport_width: f32,
    viewport_height: f32,
    scroll_y: f32,
    timers: TimerQueue,
    idle: IdleQueue,
    listeners: ListenerSet,
    observers: ObserverSet,
    globals: HashMap<String, Global>,
    caps: Capabilities,
}

/// A loaded page
#[derive(Clone)]
pub struct Page {
    inner: Rc<RefCell<PageInner>>,
}

enum DueKind {
    Timer,
    Idle,
}

impl Page {
    /// Create a page with a default 1280x800 viewport.
    pub fn new() -> Self {
        Self::with_capabilities(Capabilities::default())
    }

    /// Create a page with explicit host capabilities.
    pub fn with_capabilities(caps: Capabilities) -> Self {
        Self {
            inner: Rc::new(RefCell::new(PageInner {
                document: Document::new(),
                clock_ms: 0,
                viewport_width: 1280.0,
                viewport_height: 800.0,
                scroll_y: 0.0,
                timers: TimerQueue::default(),
                idle: IdleQueue::default(),
                listeners: ListenerSet::default(),
                observers: ObserverSet::default(),
                globals: HashMap::new(),
                caps,
            })),
        }
    }

    /// Host capabilities.
    pub fn capabilities(&self) -> Capabilities {
        self.inner.borrow().caps
    }

    /// Current virtual time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.inner.borrow().clock_ms
    }

    // ---- document -------------------------------------------------------

    /// Read the document.
    pub fn document<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        f(&self.inner.borrow().document)
    }

    /// Mutate the document.
    pub fn document_mut<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        f(&mut self.inner.borrow_mut().document)
    }

    /// Append an element to the body.
    pub fn append_to_body(&self, element: Element) -> NodeId {
        self.document_mut(|d| d.append_to_body(element))
    }

    /// Append an element to the head.
    pub fn append_to_head(&self, element: Element) -> NodeId {
        self.document_mut(|d| d.append_to_head(element))
    }

    /// Query attached elements by selector.
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, DomError> {
        self.document(|d| d.query_selector_all(selector))
    }

    /// Attribute value of a node.
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.document(|d| d.get(node).and_then(|e| e.attribute(name)).map(String::from))
    }

    /// Detach a node from the document.
    pub fn remove_node(&self, node: NodeId) -> Result<(), DomError> {
        self.document_mut(|d| d.remove(node))
    }

    /// `src` values of head scripts, in injection order.
    pub fn injected_scripts(&self) -> Vec<String> {
        self.document(|d| d.script_srcs())
    }

    /// Document ready state.
    pub fn ready_state(&self) -> ReadyState {
        self.document(|d| d.ready_state())
    }

    /// Set the document ready state.
    pub fn set_ready_state(&self, state: ReadyState) {
        self.document_mut(|d| d.set_ready_state(state));
    }

    /// Finish the page load: fire DOMContentLoaded if the document was
    /// still loading, then the window load event.
    pub fn finish_loading(&self) {
        if self.ready_state() == ReadyState::Loading {
            self.set_ready_state(ReadyState::Interactive);
            self.dispatch(EventTarget::Window, EventType::DomContentLoaded);
        }
        self.set_ready_state(ReadyState::Complete);
        self.dispatch(EventTarget::Window, EventType::Load);
    }

    // ---- timers and idle ------------------------------------------------

    /// Schedule a one-shot timer.
    pub fn set_timeout(&self, delay_ms: u64, callback: impl FnOnce() + 'static) -> TimerId {
        let mut inner = self.inner.borrow_mut();
        let now = inner.clock_ms;
        inner.timers.schedule(now, delay_ms, Box::new(callback))
    }

    /// Cancel a pending timer.
    pub fn clear_timeout(&self, id: TimerId) {
        self.inner.borrow_mut().timers.clear(id);
    }

    /// Queue an idle callback with a deadline budget. Fires on the next
    /// `run_idle()` or when `advance` passes the deadline.
    pub fn request_idle(&self, budget_ms: u64, callback: impl FnOnce() + 'static) {
        let mut inner = self.inner.borrow_mut();
        let now = inner.clock_ms;
        inner.idle.request(now, budget_ms, Box::new(callback));
    }

    /// Advance the virtual clock, firing due timers and expired idle
    /// deadlines in order. Callbacks scheduled along the way that fall
    /// within the window fire too.
    pub fn advance(&self, ms: u64) {
        let target = self.inner.borrow().clock_ms + ms;
        loop {
            let next = {
                let inner = self.inner.borrow();
                let timer = inner.timers.next_due();
                let idle = inner.idle.next_deadline();
                match (timer, idle) {
                    (None, None) => None,
                    (Some(t), None) => Some((t, DueKind::Timer)),
                    (None, Some(i)) => Some((i, DueKind::Idle)),
                    (Some(t), Some(i)) => {
                        if t <= i {
                            Some((t, DueKind::Timer))
                        } else {
                            Some((i, DueKind::Idle))
                        }
                    }
                }
            };
            let (due, kind) = match next {
                Some(n) if n.0 <= target => n,
                _ => break,
            };
            let callback = {
                let mut inner = self.inner.borrow_mut();
                inner.clock_ms = inner.clock_ms.max(due);
                match kind {
                    DueKind::Timer => inner.timers.pop_due(due),
                    DueKind::Idle => inner.idle.pop_due(due),
                }
            };
            if let Some(callback) = callback {
                callback();
            }
        }
        let mut inner = self.inner.borrow_mut();
        inner.clock_ms = inner.clock_ms.max(target);
    }

    /// The host went idle: drain pending idle callbacks.
    pub fn run_idle(&self) {
        let callbacks = self.inner.borrow_mut().idle.take_all();
        for callback in callbacks {
            callback();
        }
    }

    /// Check if any timers or idle callbacks are pending.
    pub fn has_pending_work(&self) -> bool {
        let inner = self.inner.borrow();
        inner.timers.has_pending() || inner.idle.has_pending()
    }

    // ---- events ---------------------------------------------------------

    /// Register an event listener.
    pub fn add_listener(
        &self,
        target: EventTarget,
        event: EventType,
        once: bool,
        callback: impl Fn() + 'static,
    ) -> ListenerId {
        self.inner
            .borrow_mut()
            .listeners
            .add(target, event, once, Rc::new(callback))
    }

    /// Remove an event listener. Unknown ids are ignored.
    pub fn remove_listener(&self, id: ListenerId) {
        self.inner.borrow_mut().listeners.remove(id);
    }

    /// Dispatch an event to a target's listeners.
    pub fn dispatch(&self, target: EventTarget, event: EventType) {
        tracing::debug!("dispatch {:?} to {:?}", event, target);
        let callbacks = self.inner.borrow_mut().listeners.collect(target, event);
        for callback in callbacks {
            callback();
        }
    }

    // ---- viewport and observers -----------------------------------------

    /// Scroll the viewport, firing scroll listeners and re-checking
    /// observers.
    pub fn scroll_to(&self, y: f32) {
        self.inner.borrow_mut().scroll_y = y;
        self.dispatch(EventTarget::Window, EventType::Scroll);
        self.check_observers(None);
    }

    /// Observe a set of target nodes with a root margin. The initial
    /// intersection state is delivered asynchronously (0 ms timer).
    pub fn observe(
        &self,
        targets: &[NodeId],
        margin: f32,
        callback: impl Fn(&[NodeId]) + 'static,
    ) -> ObserverId {
        let id = self
            .inner
            .borrow_mut()
            .observers
            .add(targets.to_vec(), margin, Rc::new(callback));
        let page = self.clone();
        self.set_timeout(0, move || page.check_observers(Some(id)));
        id
    }

    /// Disconnect an observer.
    pub fn disconnect(&self, id: ObserverId) {
        self.inner.borrow_mut().observers.disconnect(id);
    }

    fn check_observers(&self, only: Option<ObserverId>) {
        let pending = {
            let inner = self.inner.borrow();
            let viewport = Viewport::new(
                0.0,
                inner.scroll_y,
                inner.viewport_width,
                inner.viewport_height,
            );
            inner
                .observers
                .snapshot(only)
                .into_iter()
                .filter_map(|(id, targets, margin, callback)| {
                    let expanded = viewport.expand(margin);
                    let hits: Vec<NodeId> = targets
                        .iter()
                        .copied()
                        .filter(|&n| {
                            inner
                                .document
                                .get(n)
                                .map(|e| expanded.intersects(&e.bounds()))
                                .unwrap_or(false)
                        })
                        .collect();
                    if hits.is_empty() {
                        None
                    } else {
                        Some((id, hits, callback))
                    }
                })
                .collect::<Vec<_>>()
        };
        for (id, hits, callback) in pending {
            // An earlier callback may have disconnected this observer
            if self.inner.borrow().observers.is_active(id) {
                callback(&hits);
            }
        }
    }

    // ---- globals --------------------------------------------------------

    /// Create an empty queue global if the slot is absent.
    pub fn ensure_queue(&self, name: &str) {
        self.inner
            .borrow_mut()
            .globals
            .entry(name.to_string())
            .or_insert_with(|| Global::Queue(Vec::new()));
    }

    /// Push a value onto a queue global, creating it if absent. Pushes
    /// onto a plain-value slot are dropped.
    pub fn push_global(&self, name: &str, value: Value) {
        let mut inner = self.inner.borrow_mut();
        match inner
            .globals
            .entry(name.to_string())
            .or_insert_with(|| Global::Queue(Vec::new()))
        {
            Global::Queue(q) => q.push(value),
            Global::Value(_) => {
                tracing::debug!("dropping push to non-queue global {name}");
            }
        }
    }

    /// Set a plain-value global, overwriting any existing slot.
    pub fn set_global(&self, name: &str, value: Value) {
        self.inner
            .borrow_mut()
            .globals
            .insert(name.to_string(), Global::Value(value));
    }

    /// Read a global slot.
    pub fn global(&self, name: &str) -> Option<Global> {
        self.inner.borrow().globals.get(name).cloned()
    }

    /// Read a queue global's contents.
    pub fn global_queue(&self, name: &str) -> Option<Vec<Value>> {
        match self.inner.borrow().globals.get(name) {
            Some(Global::Queue(q)) => Some(q.clone()),
            _ => None,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}
