//! # Sockview Client
//!
//! Client-side glue for sockview, a server-rendered, socket-driven web UI
//! framework: one persistent connection, a registry of DOM-interaction
//! hooks, and a page-loading progress indicator.
//!
//! ## What this crate owns
//!
//! - **Connection bootstrap**: reads the CSRF token from the page, builds the
//!   connection with its params and hook registry, connects exactly once, and
//!   exposes the handle for console-driven debugging.
//! - **Hooks**: small per-element state machines with explicit
//!   `mounted`/`updated`/`destroyed` lifecycles — scroll-to-view, container
//!   width reporting, and chart rendering via an externally loaded library.
//! - **Progress indicator wiring**: shows a loading bar (after a short grace
//!   delay) on navigation start and hides it on stop.
//!
//! The socket transport and its reconnection protocol, server-side event
//! dispatch, the progress-bar widget, and the charting engine are external
//! collaborators reached through narrow seams ([`Transport`],
//! [`ProgressBar`], and global-scope lookups).
//!
//! ## Quick start
//!
//! ```rust,ignore
//! fn main() {
//!     // Reads the csrf-token meta tag, registers the standard hooks,
//!     // attaches the progress bar, connects, and installs the global
//!     // debug handle.
//!     let _socket = sockview_client::boot("/live").expect("boot failed");
//! }
//! ```
//!
//! From the browser console the installed handle supports:
//!
//! ```text
//! >> socket.enable_debug()
//! >> socket.enable_latency_sim(1000)  // enabled for the page's lifetime
//! >> socket.disable_latency_sim()
//! ```
//!
//! (exposed to JS by the embedding application; the methods live on
//! [`Socket`] and the page-wide handle is reachable via [`Socket::global`]).

mod debounce;
mod dom;

pub mod error;
pub mod hooks;
pub mod progress;
pub mod socket;
pub mod transport;

pub use dom::csrf_token;
pub use error::{HookError, SocketError};
pub use hooks::{
    ChartRenderer, ContainerWidth, EventRouter, Hook, HookContext, HookRegistry,
    HookRegistryBuilder, PushFn, ScrollHandler,
};
pub use progress::{GlobalProgressBar, ProgressBar, ProgressIndicator, ProgressStyle};
pub use socket::{Socket, SocketOptions, boot};
pub use transport::{Transport, TransportEvents, WebSocketTransport};

// Re-export the wire types and event names for convenience
pub use sockview_common::{
    CONTAINER_WIDTH_EVENT, Frame, HOOK_DESTROYED_EVENT, HOOK_UPDATED_EVENT, HookTarget,
    PAGE_LOADING_START_EVENT, PAGE_LOADING_STOP_EVENT, SCROLL_TO_TOP_EVENT, ScrollTarget,
    WidthReport,
};
