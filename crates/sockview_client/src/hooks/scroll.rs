use sockview_common::{SCROLL_TO_TOP_EVENT, ScrollTarget};
use web_sys::{ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition};

use super::{Hook, HookContext};
use crate::dom;

/// Smooth-scrolls a server-named element into view.
///
/// Listens for [`SCROLL_TO_TOP_EVENT`] carrying the target element id. An id
/// that matches nothing on the page is a silent no-op; there is nothing the
/// client can do about a stale server-side reference.
pub struct ScrollHandler;

impl ScrollHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ScrollHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Hook for ScrollHandler {
    fn mounted(&mut self, ctx: &HookContext) {
        ctx.handle_event(SCROLL_TO_TOP_EVENT, |payload| {
            let target: ScrollTarget = match serde_json::from_value(payload.clone()) {
                Ok(target) => target,
                Err(e) => {
                    log::warn!("ignoring malformed {SCROLL_TO_TOP_EVENT} payload: {e}");
                    return;
                }
            };
            scroll_to(&target.id);
        });
    }
}

fn scroll_to(id: &str) {
    let Ok(document) = dom::document() else {
        return;
    };
    let Some(element) = document.get_element_by_id(id) else {
        return;
    };

    let options = ScrollIntoViewOptions::new();
    options.set_behavior(ScrollBehavior::Smooth);
    options.set_block(ScrollLogicalPosition::Start);
    element.scroll_into_view_with_scroll_into_view_options(&options);
}
