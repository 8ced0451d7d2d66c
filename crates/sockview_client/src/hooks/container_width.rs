use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use sockview_common::{CONTAINER_WIDTH_EVENT, WidthReport};

use super::{Hook, HookContext};
use crate::debounce::Debounce;
use crate::dom;

const RESIZE_DEBOUNCE_MS: u32 = 250;

/// Reports the bound element's rendered pixel width to the server.
///
/// Measures on mount and again after each settled window-resize burst,
/// pushing [`CONTAINER_WIDTH_EVENT`] with `{width}`. Zero-width measurements
/// (element hidden or not laid out yet) are suppressed, not reported.
pub struct ContainerWidth {
    resize: Option<ResizeListener>,
}

struct ResizeListener {
    closure: Closure<dyn FnMut()>,
    debounce: Debounce,
}

impl ContainerWidth {
    pub fn new() -> Self {
        Self { resize: None }
    }
}

impl Default for ContainerWidth {
    fn default() -> Self {
        Self::new()
    }
}

impl Hook for ContainerWidth {
    fn mounted(&mut self, ctx: &HookContext) {
        report_width(ctx);

        let debounce = Debounce::new(RESIZE_DEBOUNCE_MS);
        let ctx = ctx.clone();
        let debounce_for_closure = debounce.clone();
        let closure = Closure::wrap(Box::new(move || {
            let ctx = ctx.clone();
            debounce_for_closure.schedule(move || report_width(&ctx));
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
        // Dropping the closure here releases the JS callback.
    }
}

fn report_width(ctx: &HookContext) {
    let width = ctx.el().client_width();
    if width <= 0 {
        return;
    }
    match serde_json::to_value(WidthReport { width }) {
        Ok(payload) => ctx.push_event(CONTAINER_WIDTH_EVENT, payload),
        Err(e) => log::warn!("failed to encode width report: {e}"),
    }
}
