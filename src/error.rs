//! Error types surfaced by sessions and command calls.

use std::{io, path::PathBuf, time::Duration};

use crate::{envelope::RequestError, session::SessionState};

/// Errors returned by [`crate::Session`] operations.
///
/// Connection-time failures are returned from `connect`; failures on an
/// established connection are returned to the specific caller whose command
/// they belong to. Disconnections after the handshake are reported through
/// the disconnect handler instead.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The process runs in a sandbox that forbids local socket access.
    #[error("sandboxed environment: local IPC sockets are unavailable")]
    SandboxedEnvironment,
    /// Creating or connecting the socket failed for a reason other than a
    /// missing listener.
    #[error("failed to create socket: {0}")]
    SocketCreationFailed(#[source] io::Error),
    /// No candidate path accepted a connection.
    #[error("no IPC listener found ({} paths tried)", tried.len())]
    NoListenerFound {
        /// Every path that was tried, in order.
        tried: Vec<PathBuf>,
    },
    /// The peer closed the connection during the handshake.
    #[error("handshake rejected: {message} ({code})")]
    HandshakeRejected {
        /// Close code sent by the peer.
        code: i64,
        /// Close reason sent by the peer.
        message: String,
    },
    /// No `READY` event arrived in time.
    #[error("handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),
    /// No reply arrived in time.
    #[error("command timed out after {0:?}")]
    CommandTimeout(Duration),
    /// The peer answered with an `ERROR` event.
    #[error("command failed: {message} ({code})")]
    CommandFailed {
        /// Error code sent by the peer.
        code: i64,
        /// Error message sent by the peer.
        message: String,
    },
    /// A frame answering this call could not be validated.
    #[error("malformed reply: {0}")]
    MalformedReply(String),
    /// Writing to the socket failed.
    #[error("failed to write frame: {0}")]
    WriteFailed(#[source] io::Error),
    /// The request could not be serialised.
    #[error("failed to serialise request")]
    Serialize(#[from] serde_json::Error),
    /// The connection ended before the call completed.
    #[error("socket disconnected")]
    SocketDisconnected,
    /// The operation is not valid in the current session state.
    #[error("operation not allowed while {0}")]
    InvalidState(SessionState),
    /// The request was rejected before being sent.
    #[error(transparent)]
    InvalidRequest(#[from] RequestError),
}

impl RpcError {
    /// Whether retrying the same call may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool { matches!(self, Self::CommandTimeout(_)) }
}
