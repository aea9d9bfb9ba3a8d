#![doc(html_root_url = "https://docs.rs/rpcframe/latest")]
//! Public API for the `rpcframe` library.
//!
//! This crate is a client for a local RPC peer reached over a Unix domain
//! socket. Frames carry an opcode and a JSON payload; commands are correlated
//! with their replies by nonce, either awaited with a deadline or answered
//! through callbacks, and the peer pushes subscribed events at any time.
//!
//! Start with [`Session::builder`].

pub mod byte_order;
pub mod codec;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod event;
pub mod frame;
mod invoker;
pub mod metrics;
pub mod nonce;
pub mod session;
pub mod tracing_config;
mod tracing_helpers;
pub mod transport;

pub use codec::{FrameError, IpcFrameCodec};
pub use envelope::{CommandKind, Envelope, EventKind, Reply, Request, RequestError};
pub use error::RpcError;
pub use event::{CloseCode, CloseEvent, ErrorCode, ErrorEvent, ReadyEvent};
pub use frame::{OpCode, RawFrame};
pub use metrics::{COMMAND_TIMEOUTS, Direction, ERRORS_TOTAL, FRAMES_PROCESSED, SESSIONS_ACTIVE};
pub use nonce::{Nonce, NonceError};
pub use session::{Session, SessionBuilder, SessionConfig, SessionState};
pub use tracing_config::TracingConfig;
