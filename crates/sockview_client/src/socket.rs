//! Connection bootstrap, frame routing, and hook mounting.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use serde_json::Value;
use wasm_bindgen::JsCast;

use sockview_common::{Frame, HOOK_DESTROYED_EVENT, HOOK_UPDATED_EVENT, HookTarget};

use crate::dom;
use crate::error::SocketError;
use crate::hooks::{EventRouter, Hook, HookContext, HookRegistry, PushFn};
use crate::progress::{GlobalProgressBar, ProgressIndicator, ProgressStyle};
use crate::transport::{Transport, TransportEvents, WebSocketTransport};

/// Default long-poll fallback timeout handed to the transport.
pub const DEFAULT_LONGPOLL_FALLBACK_MS: u32 = 2500;

/// Attribute naming the hook an element wants, looked up in the registry.
pub const HOOK_ATTR: &str = "data-hook";

/// Configuration for a [`Socket`].
pub struct SocketOptions {
    longpoll_fallback_ms: u32,
    params: serde_json::Map<String, Value>,
    hooks: HookRegistry,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            longpoll_fallback_ms: DEFAULT_LONGPOLL_FALLBACK_MS,
            params: serde_json::Map::new(),
            hooks: HookRegistry::default(),
        }
    }
}

impl SocketOptions {
    pub fn longpoll_fallback_ms(mut self, ms: u32) -> Self {
        self.longpoll_fallback_ms = ms;
        self
    }

    /// Add one connection parameter, sent as a query-string entry on connect.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn params(mut self, params: serde_json::Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    pub fn hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = hooks;
        self
    }
}

struct MountedHook {
    hook: RefCell<Box<dyn Hook>>,
    ctx: HookContext,
}

struct SocketInner {
    url: String,
    transport: Rc<dyn Transport>,
    longpoll_fallback_ms: u32,
    params: serde_json::Map<String, Value>,
    registry: HookRegistry,
    events: EventRouter,
    mounted: RefCell<HashMap<String, Rc<MountedHook>>>,
    connect_started: Cell<bool>,
    open: Cell<bool>,
    debug: Cell<bool>,
    latency_ms: Cell<Option<u32>>,
}

/// The one persistent logical connection to the server.
///
/// Cheap to clone (shared handle). Owns the hook instances mounted on the
/// page and routes inbound frames: reserved lifecycle events drive hook
/// `updated`/`destroyed`, everything else goes to listeners hooks registered
/// via [`HookContext::handle_event`].
///
/// Debug affordances are explicit methods on the handle; [`boot`] installs
/// the handle in a page-lifetime global reachable through [`Socket::global`]
/// so the browser console can get at them.
#[derive(Clone)]
pub struct Socket {
    inner: Rc<SocketInner>,
}

thread_local! {
    static GLOBAL_SOCKET: RefCell<Option<Socket>> = const { RefCell::new(None) };
}

impl Socket {
    pub fn new(url: impl Into<String>, transport: Rc<dyn Transport>, options: SocketOptions) -> Self {
        Self {
            inner: Rc::new(SocketInner {
                url: url.into(),
                transport,
                longpoll_fallback_ms: options.longpoll_fallback_ms,
                params: options.params,
                registry: options.hooks,
                events: EventRouter::new(),
                mounted: RefCell::new(HashMap::new()),
                connect_started: Cell::new(false),
                open: Cell::new(false),
                debug: Cell::new(false),
                latency_ms: Cell::new(None),
            }),
        }
    }

    /// Initiate connection establishment. Happens exactly once per page
    /// load; a second call fails with [`SocketError::AlreadyConnected`].
    pub fn connect(&self) -> Result<(), SocketError> {
        if self.inner.connect_started.replace(true) {
            return Err(SocketError::AlreadyConnected);
        }

        let url = append_params(websocket_url(&self.inner.url)?, &self.inner.params);
        let events = TransportEvents {
            on_open: Rc::new({
                let socket = self.clone();
                move || socket.handle_open()
            }),
            on_frame: Rc::new({
                let socket = self.clone();
                move |text: &str| socket.handle_frame(text)
            }),
            on_close: Rc::new({
                let socket = self.clone();
                move |code, reason| socket.handle_close(code, &reason)
            }),
        };
        self.inner
            .transport
            .connect(&url, self.inner.longpoll_fallback_ms, events)
    }

    /// Send a named event with a JSON payload to the server.
    pub fn push(&self, event: &str, payload: Value) -> Result<(), SocketError> {
        if !self.inner.open.get() {
            return Err(SocketError::NotConnected);
        }
        let frame = Frame::new(event, payload);
        if self.inner.debug.get() {
            log::debug!("send event={} payload={}", frame.event, frame.payload);
        }
        let text = frame.encode()?;
        self.inner.transport.send(&text)
    }

    pub fn is_open(&self) -> bool {
        self.inner.open.get()
    }

    /// Number of hook instances currently mounted.
    pub fn mounted_hooks(&self) -> usize {
        self.inner.mounted.borrow().len()
    }

    /// Scan the document for `[data-hook]` elements and mount a hook
    /// instance on each one not already mounted. Runs automatically when the
    /// connection opens; embedders may call it again after patching the DOM.
    pub fn mount_hooks(&self) {
        let document = match dom::document() {
            Ok(document) => document,
            Err(e) => {
                log::warn!("{e}");
                return;
            }
        };
        let nodes = match document.query_selector_all(&format!("[{HOOK_ATTR}]")) {
            Ok(nodes) => nodes,
            Err(e) => {
                log::warn!("hook scan failed: {}", dom::js_error_string(&e));
                return;
            }
        };
        for index in 0..nodes.length() {
            let Some(node) = nodes.item(index) else {
                continue;
            };
            let Ok(el) = node.dyn_into::<web_sys::Element>() else {
                continue;
            };
            self.mount_element(el);
        }
    }

    fn mount_element(&self, el: web_sys::Element) {
        let Some(name) = el.get_attribute(HOOK_ATTR) else {
            return;
        };
        let Some(id) = el.get_attribute("id") else {
            log::warn!("hook element for `{name}` has no id; skipping");
            return;
        };
        if self.inner.mounted.borrow().contains_key(&id) {
            return;
        }
        let Some(hook) = self.inner.registry.create(&name) else {
            log::warn!("no hook registered under `{name}`");
            return;
        };

        let pusher: PushFn = Rc::new({
            let socket = self.clone();
            move |event: &str, payload: Value| {
                if let Err(e) = socket.push(event, payload) {
                    log::warn!("failed to push {event}: {e}");
                }
            }
        });
        let ctx = HookContext::new(el, pusher, self.inner.events.clone());
        let entry = Rc::new(MountedHook {
            hook: RefCell::new(hook),
            ctx,
        });
        entry.hook.borrow_mut().mounted(&entry.ctx);
        self.inner.mounted.borrow_mut().insert(id, entry);
    }

    fn handle_open(&self) {
        self.inner.open.set(true);
        log::info!("socket connected");
        #[cfg(target_arch = "wasm32")]
        self.mount_hooks();
    }

    fn handle_frame(&self, text: &str) {
        let frame = match Frame::decode(text) {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("discarding malformed frame: {e}");
                return;
            }
        };
        if self.inner.debug.get() {
            log::debug!("recv event={} payload={}", frame.event, frame.payload);
        }
        match self.inner.latency_ms.get() {
            Some(ms) => {
                let socket = self.clone();
                Timeout::new(ms, move || socket.dispatch_frame(frame)).forget();
            }
            None => self.dispatch_frame(frame),
        }
    }

    fn dispatch_frame(&self, frame: Frame) {
        match frame.event.as_str() {
            HOOK_UPDATED_EVENT => {
                let Some(entry) = self.target_entry(&frame.payload) else {
                    return;
                };
                entry.hook.borrow_mut().updated(&entry.ctx);
            }
            HOOK_DESTROYED_EVENT => {
                let Some(target) = parse_target(&frame.payload) else {
                    return;
                };
                let entry = self.inner.mounted.borrow_mut().remove(&target.id);
                if let Some(entry) = entry {
                    entry.hook.borrow_mut().destroyed(&entry.ctx);
                    entry.ctx.release_listeners();
                }
            }
            _ => {
                let delivered = self.inner.events.dispatch(&frame.event, &frame.payload);
                if delivered == 0 && self.inner.debug.get() {
                    log::debug!("no listeners for event {}", frame.event);
                }
            }
        }
    }

    fn target_entry(&self, payload: &Value) -> Option<Rc<MountedHook>> {
        let target = parse_target(payload)?;
        self.inner.mounted.borrow().get(&target.id).cloned()
    }

    fn handle_close(&self, code: u16, reason: &str) {
        self.inner.open.set(false);
        log::info!("socket closed: code={code} reason={reason}");
        self.destroy_all();
    }

    fn destroy_all(&self) {
        let entries: Vec<Rc<MountedHook>> = self.inner.mounted.borrow_mut().drain().map(|(_, e)| e).collect();
        for entry in entries {
            entry.hook.borrow_mut().destroyed(&entry.ctx);
            entry.ctx.release_listeners();
        }
    }

    /// Log every inbound and outbound frame at debug level.
    pub fn enable_debug(&self) {
        self.inner.debug.set(true);
        log::info!("frame debug logging enabled");
    }

    pub fn disable_debug(&self) {
        self.inner.debug.set(false);
    }

    /// Delay inbound frame dispatch by `ms` to exercise slow-network paths.
    /// Stays enabled for the page's lifetime unless disabled.
    pub fn enable_latency_sim(&self, ms: u32) {
        self.inner.latency_ms.set(Some(ms));
        log::info!("simulating {ms}ms inbound latency");
    }

    pub fn disable_latency_sim(&self) {
        self.inner.latency_ms.set(None);
    }

    /// Install this handle as the page-wide socket, readable via
    /// [`Socket::global`].
    pub fn install_global(&self) {
        GLOBAL_SOCKET.with(|global| *global.borrow_mut() = Some(self.clone()));
    }

    /// The page-wide socket installed by [`boot`], if any.
    pub fn global() -> Option<Socket> {
        GLOBAL_SOCKET.with(|global| global.borrow().clone())
    }
}

fn parse_target(payload: &Value) -> Option<HookTarget> {
    match serde_json::from_value(payload.clone()) {
        Ok(target) => Some(target),
        Err(e) => {
            log::warn!("ignoring lifecycle event with malformed payload: {e}");
            None
        }
    }
}

/// Resolve a path like `/live` against the page location; absolute
/// `ws(s)://` URLs pass through untouched.
fn websocket_url(url: &str) -> Result<String, SocketError> {
    if url.starts_with("ws://") || url.starts_with("wss://") {
        return Ok(url.to_string());
    }
    let location = dom::window()?.location();
    let protocol = location.protocol().map_err(|e| SocketError::Dom {
        message: dom::js_error_string(&e),
    })?;
    let host = location.host().map_err(|e| SocketError::Dom {
        message: dom::js_error_string(&e),
    })?;
    let scheme = if protocol == "https:" { "wss" } else { "ws" };
    let path = if url.starts_with('/') {
        url.to_string()
    } else {
        format!("/{url}")
    };
    Ok(format!("{scheme}://{host}{path}"))
}

fn append_params(url: String, params: &serde_json::Map<String, Value>) -> String {
    if params.is_empty() {
        return url;
    }
    let query = params
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("{}={}", urlencoding::encode(key), urlencoding::encode(&value))
        })
        .collect::<Vec<_>>()
        .join("&");
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}

/// Wire the whole page: logging, CSRF token, standard hooks, progress
/// indicator, connect, and the global debug handle.
///
/// The equivalent of an application's hand-written bootstrap; call once from
/// the WASM entrypoint.
pub fn boot(url: &str) -> Result<Socket, SocketError> {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);

    let mut options = SocketOptions::default().hooks(HookRegistry::standard());
    if let Some(token) = dom::csrf_token() {
        options = options.param("_csrf_token", token);
    }

    let indicator = ProgressIndicator::attach(GlobalProgressBar::new(), ProgressStyle::default())?;
    indicator.forget();

    let socket = Socket::new(url, Rc::new(WebSocketTransport::new()), options);
    socket.connect()?;
    socket.install_global();
    Ok(socket)
}
