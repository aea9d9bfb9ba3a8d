//! Connection lifecycle states.

use std::fmt;

/// Where a [`Session`](crate::Session) is in its connection lifecycle.
///
/// ```text
/// Idle -> Connecting -> Handshaking -> Connected -> Closed
/// ```
///
/// Any state may move to `Closed`. A later `connect()` starts a new cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Never connected.
    #[default]
    Idle,
    /// Looking for a listening peer socket.
    Connecting,
    /// Socket open, waiting for `READY`.
    Handshaking,
    /// Ready for commands.
    Connected,
    /// The connection ended.
    Closed,
}

impl SessionState {
    /// Whether `connect()` may start from this state.
    #[must_use]
    pub fn can_connect(self) -> bool { matches!(self, Self::Idle | Self::Closed) }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Handshaking => "handshaking",
            Self::Connected => "connected",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}
