//! Metric helpers for `rpcframe`.
//!
//! This module defines metric names and simple helper functions
//! wrapping the [`metrics`](https://docs.rs/metrics) crate. Without the
//! `metrics` feature every helper is a no-op.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Name of the gauge tracking connected sessions.
pub const SESSIONS_ACTIVE: &str = "rpcframe_sessions_active";
/// Name of the counter tracking processed frames.
pub const FRAMES_PROCESSED: &str = "rpcframe_frames_processed_total";
/// Name of the counter tracking dropped or undecodable frames and failed
/// writes.
pub const ERRORS_TOTAL: &str = "rpcframe_errors_total";
/// Name of the counter tracking synchronous calls that timed out.
pub const COMMAND_TIMEOUTS: &str = "rpcframe_command_timeouts_total";

/// Direction of frame processing.
#[derive(Clone, Copy, Debug)]
pub enum Direction {
    /// Frames read from the peer.
    Inbound,
    /// Frames written to the peer.
    Outbound,
}

impl Direction {
    #[cfg_attr(not(feature = "metrics"), allow(dead_code))]
    fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Increment the connected sessions gauge.
pub fn inc_sessions() {
    #[cfg(feature = "metrics")]
    gauge!(SESSIONS_ACTIVE).increment(1.0);
}

/// Decrement the connected sessions gauge.
pub fn dec_sessions() {
    #[cfg(feature = "metrics")]
    gauge!(SESSIONS_ACTIVE).decrement(1.0);
}

/// Record a processed frame for the given direction.
pub fn inc_frames(direction: Direction) {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_PROCESSED, "direction" => direction.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = direction;
}

/// Record an error occurrence.
pub fn inc_errors() {
    #[cfg(feature = "metrics")]
    counter!(ERRORS_TOTAL).increment(1);
}

/// Record a synchronous call that timed out.
pub fn inc_command_timeouts() {
    #[cfg(feature = "metrics")]
    counter!(COMMAND_TIMEOUTS).increment(1);
}
