//! Shared utilities for integration tests.
//!
//! Provides handler recorders and a helper that connects a session to a
//! scripted peer, so each test only scripts the part of the conversation it
//! cares about.

// Items in this shared module may not be used by all test binaries that import it.
#![allow(
    dead_code,
    reason = "shared test utilities are not used by all test binaries"
)]

use std::time::Duration;

use rpcframe::{Session, SessionBuilder};
use rpcframe_testing::{MockPeer, PeerConnection, PeerDir, TestResult};
use tokio::sync::mpsc;

/// How long a test waits for something that should happen.
pub const EVENTUALLY: Duration = Duration::from_secs(2);

/// How long a test waits to be confident something did not happen.
pub const QUIET_PERIOD: Duration = Duration::from_millis(100);

/// Channel pair used to observe handler invocations.
pub fn recorder<T>() -> (mpsc::UnboundedSender<T>, mpsc::UnboundedReceiver<T>) {
    mpsc::unbounded_channel()
}

/// Builder preconfigured to look for sockets in `dir`.
pub fn builder_for(dir: &PeerDir) -> SessionBuilder {
    Session::builder("abc").socket_dir(dir.path())
}

/// Connect `session` to `peer` and complete the handshake.
pub async fn connect_pair(session: &Session, peer: &MockPeer) -> TestResult<PeerConnection> {
    let (ready, conn) = tokio::join!(session.connect(), peer.accept_ready());
    ready?;
    Ok(conn?)
}

/// Next value from `rx`, failing the test if none arrives in time.
pub async fn next<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> TestResult<T> {
    tokio::time::timeout(EVENTUALLY, rx.recv())
        .await?
        .ok_or_else(|| "recorder closed".into())
}

/// Assert that `rx` stays empty for [`QUIET_PERIOD`].
pub async fn assert_quiet<T: std::fmt::Debug>(rx: &mut mpsc::UnboundedReceiver<T>) {
    tokio::time::sleep(QUIET_PERIOD).await;
    let unexpected = rx.try_recv();
    assert!(unexpected.is_err(), "unexpected value: {unexpected:?}");
}
