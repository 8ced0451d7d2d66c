use thiserror::Error;

/// Errors raised by the chart hook.
///
/// All of these are handled locally: logged to the developer console, render
/// skipped, nothing propagated to the user interface or to other hooks. There
/// is no retry policy — each failure is terminal for that attempt and is only
/// reattempted on the next natural trigger (mount, update, or settled
/// resize).
#[derive(Debug, Error)]
pub enum HookError {
    /// The chart spec attribute is missing or holds invalid JSON.
    #[error("failed to parse chart spec: {reason}")]
    SpecParse { reason: String },

    /// The external rendering function is not present on the global scope.
    ///
    /// This is a configuration precondition (the charting library must be
    /// loaded before any chart hook mounts), not something recoverable here.
    #[error("chart renderer `{global}` is not loaded; include the charting library before mounting")]
    RenderUnavailable { global: String },

    /// The asynchronous render call was rejected.
    #[error("chart render failed: {reason}")]
    RenderRejected { reason: String },
}

/// Errors raised by the connection layer.
#[derive(Debug, Error)]
pub enum SocketError {
    /// An event was pushed before the connection opened (or after it closed).
    #[error("socket is not connected")]
    NotConnected,

    /// `connect()` was called a second time; connection establishment happens
    /// exactly once per page load.
    #[error("socket connection was already initiated")]
    AlreadyConnected,

    /// The underlying transport reported a failure.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// A browser global (window, document) was unavailable.
    #[error("browser environment unavailable: {message}")]
    Dom { message: String },

    /// An outbound frame could not be serialized.
    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}
