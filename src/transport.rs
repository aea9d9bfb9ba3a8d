//! Socket ownership: discovery, the single writer and the receive loop.
//!
//! A connected session owns one [`tokio::net::UnixStream`] split into halves.
//! The write half sits behind [`FrameSender`] so commands, handshake and
//! pong echoes never interleave on the wire. The read half is drained by
//! [`run_receive_loop`], which hands every decoded frame to the dispatcher.

mod discovery;
mod receive;
mod sender;

pub use discovery::{
    SANDBOX_ENV_VAR,
    SOCKET_NAME_PREFIX,
    SOCKET_SLOTS,
    default_socket_paths,
    is_sandboxed,
    is_sandboxed_with,
    runtime_dir_with,
    socket_paths_in,
};
pub(crate) use discovery::connect_first;
pub(crate) use receive::run_receive_loop;
pub(crate) use sender::FrameSender;
