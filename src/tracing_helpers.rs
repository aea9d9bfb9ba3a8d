//! Tracing span and event helpers for session operations.
//!
//! These helpers centralise span creation with dynamic level selection,
//! per-operation timing and payload dumps, keeping the instrumentation logic
//! out of the session and invoker methods.

use std::{path::Path, time::Instant};

use tracing::{Level, Span};

use crate::tracing_config::TracingConfig;

/// Create a tracing span at a dynamically selected level.
///
/// Each branch calls the corresponding `tracing::<level>_span!` macro, so
/// span metadata stays static per branch while the branch is chosen at run
/// time.
macro_rules! dynamic_span {
    ($level:expr, $name:expr $(, $($field:tt)*)?) => {
        match $level {
            Level::ERROR => tracing::error_span!($name $(, $($field)*)?),
            Level::WARN  => tracing::warn_span!($name $(, $($field)*)?),
            Level::INFO  => tracing::info_span!($name $(, $($field)*)?),
            Level::DEBUG => tracing::debug_span!($name $(, $($field)*)?),
            Level::TRACE => tracing::trace_span!($name $(, $($field)*)?),
        }
    };
}

/// Create a span for the `connect` operation.
///
/// `socket.path` is recorded once discovery succeeds.
#[allow(
    clippy::cognitive_complexity,
    reason = "complexity from dynamic_span! macro expansion"
)]
pub(crate) fn connect_span(config: &TracingConfig, client_id: &str) -> Span {
    dynamic_span!(
        config.connect_level,
        "session.connect",
        client_id = client_id,
        socket.path = tracing::field::Empty
    )
}

/// Record the socket path chosen by discovery on `span`.
pub(crate) fn record_socket_path(span: &Span, path: &Path) {
    span.record("socket.path", tracing::field::display(path.display()));
}

/// Create a span for a synchronous call.
///
/// The `nonce` and `result` fields are recorded during the call.
#[allow(
    clippy::cognitive_complexity,
    reason = "complexity from dynamic_span! macro expansion"
)]
pub(crate) fn call_span(config: &TracingConfig, cmd: &str) -> Span {
    dynamic_span!(
        config.call_level,
        "session.call",
        cmd = cmd,
        nonce = tracing::field::Empty,
        result = tracing::field::Empty
    )
}

/// Create a span for an asynchronous call.
#[allow(
    clippy::cognitive_complexity,
    reason = "complexity from dynamic_span! macro expansion"
)]
pub(crate) fn call_async_span(config: &TracingConfig, cmd: &str) -> Span {
    dynamic_span!(
        config.call_async_level,
        "session.call_async",
        cmd = cmd,
        nonce = tracing::field::Empty
    )
}

/// Create a span for the `disconnect` operation.
#[allow(
    clippy::cognitive_complexity,
    reason = "complexity from dynamic_span! macro expansion"
)]
pub(crate) fn disconnect_span(config: &TracingConfig) -> Span {
    dynamic_span!(config.disconnect_level, "session.disconnect")
}

/// Start a timer when `enabled`.
pub(crate) fn start_timer(enabled: bool) -> Option<Instant> { enabled.then(Instant::now) }

/// Record elapsed time if timing was enabled for this operation.
///
/// `start` is `None` when timing is disabled. When `Some`, an event carrying
/// `elapsed_us` is emitted at `DEBUG` level.
pub(crate) fn emit_timing_event(start: Option<Instant>) {
    if let Some(start) = start {
        let elapsed_us = start.elapsed().as_micros();
        tracing::debug!(elapsed_us = elapsed_us, "operation.timing");
    }
}

/// Render a payload for a debug dump: pretty JSON when it parses, lossy
/// UTF-8 otherwise.
pub(crate) fn render_payload(payload: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(payload)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| String::from_utf8_lossy(payload).into_owned())
}

/// Dump `payload` at `DEBUG` level when `enabled`.
pub(crate) fn log_payload(enabled: bool, label: &'static str, payload: &[u8]) {
    if enabled && tracing::enabled!(Level::DEBUG) {
        tracing::debug!(payload = %render_payload(payload), "{label}");
    }
}
