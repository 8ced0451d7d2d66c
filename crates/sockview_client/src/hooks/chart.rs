use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{JsFuture, spawn_local};

use super::{Hook, HookContext};
use crate::debounce::Debounce;
use crate::dom;
use crate::error::HookError;

/// Global-scope name of the externally loaded rendering function.
pub const DEFAULT_RENDER_GLOBAL: &str = "vegaEmbed";

/// Attribute holding the JSON chart specification.
pub const SPEC_ATTR: &str = "data-spec";

const RESIZE_DEBOUNCE_MS: u32 = 250;

/// Renders a chart into the bound element via an externally loaded library.
///
/// The JSON spec is re-read from the element's `data-spec` attribute on
/// every render, so a server patch followed by an update trigger picks up
/// the new spec with no state carried here. Renders happen on mount, on
/// update, and after each settled resize burst.
///
/// Renders are asynchronous and not mutually excluded: a resize-triggered
/// render may race an update-triggered one, and the last call wins under the
/// rendering library's idempotent redraw contract.
pub struct ChartRenderer {
    cfg: Rc<ChartConfig>,
    resize: Option<ResizeListener>,
}

struct ChartConfig {
    render_global: String,
}

struct ResizeListener {
    closure: Closure<dyn FnMut()>,
    debounce: Debounce,
}

impl ChartRenderer {
    pub fn new() -> Self {
        Self::with_render_global(DEFAULT_RENDER_GLOBAL)
    }

    /// Use a different global-scope name for the rendering function.
    pub fn with_render_global(name: impl Into<String>) -> Self {
        Self {
            cfg: Rc::new(ChartConfig {
                render_global: name.into(),
            }),
            resize: None,
        }
    }
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Hook for ChartRenderer {
    fn mounted(&mut self, ctx: &HookContext) {
        render(&self.cfg, ctx);

        let debounce = Debounce::new(RESIZE_DEBOUNCE_MS);
        let cfg = Rc::clone(&self.cfg);
        let ctx = ctx.clone();
        let debounce_for_closure = debounce.clone();
        let closure = Closure::wrap(Box::new(move || {
            let cfg = Rc::clone(&cfg);
            let ctx = ctx.clone();
            debounce_for_closure.schedule(move || render(&cfg, &ctx));
        }) as Box<dyn FnMut()>);

        match dom::window() {
            Ok(window) => {
                if let Err(e) = window
                    .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())
                {
                    log::warn!(
                        "failed to attach resize listener: {}",
                        dom::js_error_string(&e)
                    );
                }
            }
            Err(e) => log::warn!("{e}"),
        }

        self.resize = Some(ResizeListener { closure, debounce });
    }

    fn updated(&mut self, ctx: &HookContext) {
        render(&self.cfg, ctx);
    }

    fn destroyed(&mut self, _ctx: &HookContext) {
        let Some(listener) = self.resize.take() else {
            return;
        };
        listener.debounce.cancel();
        if let Ok(window) = dom::window() {
            let _ = window.remove_event_listener_with_callback(
                "resize",
                listener.closure.as_ref().unchecked_ref(),
            );
        }
    }
}

/// Run one render attempt; failures are logged and leave the element
/// unchanged. Never panics into the caller.
fn render(cfg: &ChartConfig, ctx: &HookContext) {
    if let Err(e) = try_render(cfg, ctx) {
        log::error!("{e}");
    }
}

fn try_render(cfg: &ChartConfig, ctx: &HookContext) -> Result<(), HookError> {
    let raw = ctx
        .el()
        .get_attribute(SPEC_ATTR)
        .ok_or_else(|| HookError::SpecParse {
            reason: format!("element has no {SPEC_ATTR} attribute"),
        })?;

    // Validate before touching the JS side so a malformed spec is a clean
    // no-op with the element untouched.
    serde_json::from_str::<serde_json::Value>(&raw).map_err(|e| HookError::SpecParse {
        reason: e.to_string(),
    })?;

    let embed =
        dom::global_function(&cfg.render_global).ok_or_else(|| HookError::RenderUnavailable {
            global: cfg.render_global.clone(),
        })?;

    let spec = js_sys::JSON::parse(&raw).map_err(|e| HookError::SpecParse {
        reason: dom::js_error_string(&e),
    })?;
    let options = render_options().map_err(|e| HookError::RenderRejected {
        reason: dom::js_error_string(&e),
    })?;

    let el: &JsValue = ctx.el().as_ref();
    let returned = embed
        .call3(&JsValue::NULL, el, &spec, &options.into())
        .map_err(|e| HookError::RenderRejected {
            reason: dom::js_error_string(&e),
        })?;

    // The library returns a promise; a rejection is logged, never rethrown.
    if let Ok(promise) = returned.dyn_into::<js_sys::Promise>() {
        spawn_local(async move {
            if let Err(e) = JsFuture::from(promise).await {
                let err = HookError::RenderRejected {
                    reason: dom::js_error_string(&e),
                };
                log::error!("{err}");
            }
        });
    }

    Ok(())
}

/// Fixed render options: no interactive actions, vector output, width bound
/// to the container.
fn render_options() -> Result<js_sys::Object, JsValue> {
    let options = js_sys::Object::new();
    js_sys::Reflect::set(&options, &"actions".into(), &JsValue::FALSE)?;
    js_sys::Reflect::set(&options, &"renderer".into(), &"svg".into())?;
    js_sys::Reflect::set(&options, &"width".into(), &"container".into())?;
    Ok(options)
}
