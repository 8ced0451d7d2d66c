use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Window};

use crate::error::SocketError;

pub(crate) fn window() -> Result<Window, SocketError> {
    web_sys::window().ok_or(SocketError::Dom {
        message: "no window".into(),
    })
}

pub(crate) fn document() -> Result<Document, SocketError> {
    window()?.document().ok_or(SocketError::Dom {
        message: "no document".into(),
    })
}

/// Read the security token from the page's `csrf-token` meta tag.
///
/// Returns `None` silently when the tag is absent; what the server does with
/// a token-less join is its concern.
pub fn csrf_token() -> Option<String> {
    meta_content("csrf-token")
}

pub(crate) fn meta_content(name: &str) -> Option<String> {
    let document = document().ok()?;
    let meta = document
        .query_selector(&format!("meta[name='{name}']"))
        .ok()
        .flatten()?;
    meta.get_attribute("content")
}

/// Look up a function expected on the global scope, e.g. a charting library's
/// entrypoint loaded from a script tag.
pub(crate) fn global_function(name: &str) -> Option<js_sys::Function> {
    let window = web_sys::window()?;
    let value = js_sys::Reflect::get(window.as_ref(), &JsValue::from_str(name)).ok()?;
    value.dyn_into::<js_sys::Function>().ok()
}

/// Look up an object expected on the global scope, e.g. the progress-bar
/// widget.
pub(crate) fn global_object(name: &str) -> Option<js_sys::Object> {
    let window = web_sys::window()?;
    let value = js_sys::Reflect::get(window.as_ref(), &JsValue::from_str(name)).ok()?;
    if value.is_undefined() || value.is_null() {
        return None;
    }
    value.dyn_into::<js_sys::Object>().ok()
}

/// Render a JS error value for log output.
pub(crate) fn js_error_string(value: &JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{value:?}"))
}
