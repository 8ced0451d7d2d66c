//! The seam between the glue and the framework-owned socket layer.
//!
//! The real transport (including its long-poll fallback and reconnection
//! protocol) belongs to the framework; the glue only needs to hand frames in
//! and out. [`WebSocketTransport`] is the thin default used by [`boot`]
//! (crate::socket::boot); embedders with their own transport implement
//! [`Transport`].

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CloseEvent, MessageEvent, WebSocket};

use crate::dom;
use crate::error::SocketError;

/// Callbacks the connection layer hands to the transport. Rc, not Arc — WASM
/// is single-threaded and these never cross a thread boundary.
pub struct TransportEvents {
    pub on_open: Rc<dyn Fn()>,
    pub on_frame: Rc<dyn Fn(&str)>,
    pub on_close: Rc<dyn Fn(u16, String)>,
}

pub trait Transport {
    /// Open the connection and deliver lifecycle callbacks through `events`.
    ///
    /// `fallback_after_ms` is the configured long-poll fallback timeout;
    /// transports that support a fallback protocol engage it after that
    /// deadline.
    fn connect(
        &self,
        url: &str,
        fallback_after_ms: u32,
        events: TransportEvents,
    ) -> Result<(), SocketError>;

    /// Send one encoded frame.
    fn send(&self, text: &str) -> Result<(), SocketError>;
}

/// Default transport over a plain browser WebSocket.
///
/// Deliberately thin: no reconnection and no actual long-poll fallback (both
/// framework-owned); past the fallback deadline it only logs that the
/// connection is still pending.
pub struct WebSocketTransport {
    ws: Rc<RefCell<Option<WebSocket>>>,
}

impl WebSocketTransport {
    pub fn new() -> Self {
        Self {
            ws: Rc::new(RefCell::new(None)),
        }
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for WebSocketTransport {
    fn connect(
        &self,
        url: &str,
        fallback_after_ms: u32,
        events: TransportEvents,
    ) -> Result<(), SocketError> {
        let ws = WebSocket::new(url).map_err(|e| SocketError::Transport {
            message: dom::js_error_string(&e),
        })?;

        let on_open_cb = Rc::clone(&events.on_open);
        let on_open = Closure::wrap(Box::new(move |_: JsValue| {
            on_open_cb();
        }) as Box<dyn FnMut(JsValue)>);
        ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        on_open.forget();

        let on_frame_cb = Rc::clone(&events.on_frame);
        let on_message = Closure::wrap(Box::new(move |event: MessageEvent| {
            if let Ok(text) = event.data().dyn_into::<js_sys::JsString>() {
                let text: String = text.into();
                on_frame_cb(&text);
            }
        }) as Box<dyn FnMut(MessageEvent)>);
        ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        on_message.forget();

        let on_close_cb = Rc::clone(&events.on_close);
        let on_close = Closure::wrap(Box::new(move |event: CloseEvent| {
            on_close_cb(event.code(), event.reason());
        }) as Box<dyn FnMut(CloseEvent)>);
        ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));
        on_close.forget();

        let on_error = Closure::wrap(Box::new(move |e: JsValue| {
            log::warn!("websocket error: {}", dom::js_error_string(&e));
        }) as Box<dyn FnMut(JsValue)>);
        ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        on_error.forget();

        let ws_for_deadline = ws.clone();
        Timeout::new(fallback_after_ms, move || {
            if ws_for_deadline.ready_state() == WebSocket::CONNECTING {
                log::warn!(
                    "websocket still connecting after {fallback_after_ms}ms; \
                     a fallback-capable transport would switch to long polling"
                );
            }
        })
        .forget();

        *self.ws.borrow_mut() = Some(ws);
        Ok(())
    }

    fn send(&self, text: &str) -> Result<(), SocketError> {
        let ws = self.ws.borrow();
        let ws = ws.as_ref().ok_or(SocketError::NotConnected)?;
        if ws.ready_state() != WebSocket::OPEN {
            return Err(SocketError::NotConnected);
        }
        ws.send_with_str(text).map_err(|e| SocketError::Transport {
            message: dom::js_error_string(&e),
        })
    }
}
