//! Page-loading progress indicator wiring.
//!
//! The widget itself is external; this module owns only the lifecycle
//! wiring: show (after a grace delay, so fast navigations never flash the
//! bar) on `sockview:page-loading-start`, hide immediately on
//! `sockview:page-loading-stop`.

use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsValue;

use sockview_common::{PAGE_LOADING_START_EVENT, PAGE_LOADING_STOP_EVENT};

use crate::debounce::Debounce;
use crate::dom;
use crate::error::SocketError;

/// Delay before a loading bar appears, so fast navigations never flicker.
pub const SHOW_GRACE_MS: u32 = 300;

/// Global-scope name of the default external progress widget.
pub const DEFAULT_WIDGET_GLOBAL: &str = "topbar";

/// Static progress-bar styling, applied once at attach.
#[derive(Clone, Debug)]
pub struct ProgressStyle {
    pub bar_color: String,
    pub shadow_color: String,
}

impl Default for ProgressStyle {
    fn default() -> Self {
        Self {
            bar_color: "#29d".to_string(),
            shadow_color: "rgba(0, 0, 0, .3)".to_string(),
        }
    }
}

/// The progress widget seam; the widget implementation is external.
pub trait ProgressBar {
    fn configure(&self, style: &ProgressStyle);
    fn show(&self);
    fn hide(&self);
}

/// Binds a progress widget expected as an object on the global scope.
///
/// A missing widget is a configuration error like a missing chart renderer:
/// logged, every call a no-op.
pub struct GlobalProgressBar {
    global: String,
}

impl GlobalProgressBar {
    pub fn new() -> Self {
        Self::with_global(DEFAULT_WIDGET_GLOBAL)
    }

    pub fn with_global(name: impl Into<String>) -> Self {
        Self {
            global: name.into(),
        }
    }

    fn call(&self, method: &str, args: &[JsValue]) {
        let Some(widget) = dom::global_object(&self.global) else {
            log::error!(
                "progress widget `{}` is not loaded; include it before booting",
                self.global
            );
            return;
        };
        let Ok(function) = js_sys::Reflect::get(&widget, &method.into())
            .and_then(|f| f.dyn_into::<js_sys::Function>().map_err(JsValue::from))
        else {
            log::warn!("progress widget `{}` has no `{method}` method", self.global);
            return;
        };
        let arguments = js_sys::Array::new();
        for arg in args {
            arguments.push(arg);
        }
        if let Err(e) = function.apply(&widget, &arguments) {
            log::warn!(
                "progress widget `{}.{method}` failed: {}",
                self.global,
                dom::js_error_string(&e)
            );
        }
    }
}

impl Default for GlobalProgressBar {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressBar for GlobalProgressBar {
    fn configure(&self, style: &ProgressStyle) {
        let bar_colors = js_sys::Object::new();
        let _ = js_sys::Reflect::set(&bar_colors, &"0".into(), &style.bar_color.as_str().into());
        let config = js_sys::Object::new();
        let _ = js_sys::Reflect::set(&config, &"barColors".into(), &bar_colors.into());
        let _ = js_sys::Reflect::set(
            &config,
            &"shadowColor".into(),
            &style.shadow_color.as_str().into(),
        );
        self.call("config", &[config.into()]);
    }

    fn show(&self) {
        self.call("show", &[]);
    }

    fn hide(&self) {
        self.call("hide", &[]);
    }
}

/// Window-event wiring for a [`ProgressBar`].
///
/// Dropping the handle detaches the listeners; [`forget`](Self::forget)
/// leaves them attached for the page's lifetime, which is what a bootstrap
/// wants.
pub struct ProgressIndicator {
    start: Closure<dyn FnMut()>,
    stop: Closure<dyn FnMut()>,
    grace: Debounce,
}

impl ProgressIndicator {
    pub fn attach(
        bar: impl ProgressBar + 'static,
        style: ProgressStyle,
    ) -> Result<Self, SocketError> {
        let window = dom::window()?;
        bar.configure(&style);
        let bar = Rc::new(bar);
        let grace = Debounce::new(SHOW_GRACE_MS);

        let start = Closure::wrap(Box::new({
            let bar = Rc::clone(&bar);
            let grace = grace.clone();
            move || {
                let bar = Rc::clone(&bar);
                grace.schedule(move || bar.show());
            }
        }) as Box<dyn FnMut()>);
        window
            .add_event_listener_with_callback(
                PAGE_LOADING_START_EVENT,
                start.as_ref().unchecked_ref(),
            )
            .map_err(|e| SocketError::Dom {
                message: dom::js_error_string(&e),
            })?;

        let stop = Closure::wrap(Box::new({
            let grace = grace.clone();
            move || {
                grace.cancel();
                bar.hide();
            }
        }) as Box<dyn FnMut()>);
        window
            .add_event_listener_with_callback(
                PAGE_LOADING_STOP_EVENT,
                stop.as_ref().unchecked_ref(),
            )
            .map_err(|e| SocketError::Dom {
                message: dom::js_error_string(&e),
            })?;

        Ok(Self { start, stop, grace })
    }

    /// Keep the listeners attached for the page's lifetime.
    pub fn forget(self) {
        std::mem::forget(self);
    }

    /// Remove the listeners and cancel any pending grace timer.
    pub fn detach(self) {
        drop(self);
    }
}

impl Drop for ProgressIndicator {
    fn drop(&mut self) {
        self.grace.cancel();
        if let Ok(window) = dom::window() {
            let _ = window.remove_event_listener_with_callback(
                PAGE_LOADING_START_EVENT,
                self.start.as_ref().unchecked_ref(),
            );
            let _ = window.remove_event_listener_with_callback(
                PAGE_LOADING_STOP_EVENT,
                self.stop.as_ref().unchecked_ref(),
            );
        }
    }
}
