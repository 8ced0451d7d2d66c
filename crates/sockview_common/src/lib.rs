//! Wire types shared between sockview clients and the servers that drive
//! them.
//!
//! Everything on the wire is a [`Frame`]: a named event plus a JSON payload,
//! serialized as JSON text. Typed payloads for the events the client glue
//! understands live next to their event-name constants so client and server
//! agree on the strings.

use serde::{Deserialize, Serialize};

/// Inbound event instructing the client to scroll an element into view.
pub const SCROLL_TO_TOP_EVENT: &str = "scroll_to_top";

/// Outbound event reporting a container's measured pixel width.
pub const CONTAINER_WIDTH_EVENT: &str = "update_container_width";

/// Reserved inbound event: the server patched the element owning a hook and
/// the hook should re-run its update logic.
pub const HOOK_UPDATED_EVENT: &str = "sockview:updated";

/// Reserved inbound event: the element owning a hook left the page and the
/// hook should release its resources.
pub const HOOK_DESTROYED_EVENT: &str = "sockview:destroyed";

/// Browser window event fired when live navigation or a form submission
/// starts.
pub const PAGE_LOADING_START_EVENT: &str = "sockview:page-loading-start";

/// Browser window event fired when live navigation or a form submission
/// settles.
pub const PAGE_LOADING_STOP_EVENT: &str = "sockview:page-loading-stop";

/// A [`Frame`] is the one logical wire shape: every server push and every
/// client event is a named event with a JSON payload.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Frame {
    /// Event name, e.g. `"scroll_to_top"`.
    pub event: String,
    /// Event payload; `Value::Null` when the event carries no data.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Frame {
    pub fn new(event: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            payload,
        }
    }

    /// Serialize to the JSON text sent over the transport.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a frame received from the transport.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Payload of [`SCROLL_TO_TOP_EVENT`]: the id of the element to scroll to.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScrollTarget {
    pub id: String,
}

/// Payload of [`CONTAINER_WIDTH_EVENT`]: a container's rendered pixel width.
///
/// Zero-width measurements are suppressed client-side and never sent.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WidthReport {
    pub width: i32,
}

/// Payload of the reserved hook lifecycle events: the id of the element the
/// hook is bound to.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HookTarget {
    pub id: String,
}
