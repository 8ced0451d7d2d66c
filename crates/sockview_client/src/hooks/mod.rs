//! Hook lifecycle, context, and the server-event router.
//!
//! A hook is a small state machine bound to one DOM element: created when the
//! element mounts, poked on server-driven updates, and torn down when the
//! element leaves the page. Instances share nothing with each other; any
//! transient state (a debounce timer handle) is a private field.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use web_sys::Element;

mod chart;
mod container_width;
mod registry;
mod scroll;

pub use chart::ChartRenderer;
pub use container_width::ContainerWidth;
pub use registry::{HookRegistry, HookRegistryBuilder};
pub use scroll::ScrollHandler;

/// Per-element lifecycle contract for DOM hooks.
pub trait Hook {
    /// The bound element entered the page.
    fn mounted(&mut self, ctx: &HookContext);

    /// The server patched the bound element; re-read any element-derived
    /// state.
    fn updated(&mut self, _ctx: &HookContext) {}

    /// The bound element left the page; release listeners and timers.
    fn destroyed(&mut self, _ctx: &HookContext) {}
}

/// Outbound event sink handed to hooks; the socket supplies the real one,
/// tests supply recorders.
pub type PushFn = Rc<dyn Fn(&str, serde_json::Value)>;

/// Everything a hook instance gets to talk to the page and the server:
/// its bound element, an outbound event sink, and inbound event listener
/// registration.
#[derive(Clone)]
pub struct HookContext {
    el: Element,
    owner: u64,
    pusher: PushFn,
    events: EventRouter,
}

impl HookContext {
    pub fn new(el: Element, pusher: PushFn, events: EventRouter) -> Self {
        let owner = events.new_owner();
        Self {
            el,
            owner,
            pusher,
            events,
        }
    }

    /// The DOM element this hook instance is bound to.
    pub fn el(&self) -> &Element {
        &self.el
    }

    /// Send a named event with a JSON payload to the server.
    pub fn push_event(&self, event: &str, payload: serde_json::Value) {
        (self.pusher)(event, payload);
    }

    /// Listen for a named server-pushed event. Listeners registered through
    /// this context are removed together when the hook is destroyed.
    pub fn handle_event(&self, event: &str, f: impl Fn(&serde_json::Value) + 'static) {
        self.events.on(self.owner, event, f);
    }

    pub(crate) fn release_listeners(&self) {
        self.events.remove_owner(self.owner);
    }
}

type Listener = Rc<dyn Fn(&serde_json::Value)>;

#[derive(Default)]
struct RouterInner {
    next_owner: u64,
    listeners: HashMap<String, Vec<(u64, Listener)>>,
}

/// Routes named server-pushed events to hook listeners.
///
/// Listeners are tagged with the owning hook instance so the socket can tear
/// them down when the instance is destroyed. Within one instance, events are
/// delivered in the order the browser's event loop hands them to the socket;
/// no ordering is guaranteed across instances.
#[derive(Clone, Default)]
pub struct EventRouter {
    inner: Rc<RefCell<RouterInner>>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn new_owner(&self) -> u64 {
        let mut inner = self.inner.borrow_mut();
        inner.next_owner += 1;
        inner.next_owner
    }

    pub(crate) fn on(&self, owner: u64, event: &str, f: impl Fn(&serde_json::Value) + 'static) {
        self.inner
            .borrow_mut()
            .listeners
            .entry(event.to_string())
            .or_default()
            .push((owner, Rc::new(f)));
    }

    pub(crate) fn remove_owner(&self, owner: u64) {
        let mut inner = self.inner.borrow_mut();
        for listeners in inner.listeners.values_mut() {
            listeners.retain(|(o, _)| *o != owner);
        }
    }

    /// Deliver an event to every listener; returns how many were called.
    pub fn dispatch(&self, event: &str, payload: &serde_json::Value) -> usize {
        // Clone the listener list out so callbacks may register or remove
        // listeners without hitting the borrow.
        let listeners: Vec<Listener> = self
            .inner
            .borrow()
            .listeners
            .get(event)
            .map(|l| l.iter().map(|(_, f)| Rc::clone(f)).collect())
            .unwrap_or_default();

        for listener in &listeners {
            listener(payload);
        }
        listeners.len()
    }
}
