//! Utilities for driving an [`rpcframe::Session`] against a scripted peer
//! during tests.
//!
//! A [`PeerDir`] is a throwaway directory holding the numbered socket slots.
//! A [`MockPeer`] listens on one slot, and each accepted
//! [`PeerConnection`] reads and writes whole frames so tests can script the
//! peer's side of the conversation.
//!
//! ```rust,no_run
//! use rpcframe::Session;
//! use rpcframe_testing::PeerDir;
//!
//! # async fn example() -> std::io::Result<()> {
//! let dir = PeerDir::new()?;
//! let peer = dir.listen(0)?;
//! let session = Session::builder("abc").socket_dir(dir.path()).build();
//!
//! let (connected, conn) = tokio::join!(session.connect(), peer.accept_ready());
//! assert!(connected.is_ok());
//! let _conn = conn?;
//! # Ok(())
//! # }
//! ```

pub mod peer;
pub mod payloads;

pub use payloads::{error_event, ready_event};
pub use peer::{MockPeer, PeerConnection, PeerDir, peer_dir};

/// Result type for tests that propagate helper errors with `?`.
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;
