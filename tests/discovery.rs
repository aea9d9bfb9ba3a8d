//! Integration tests for socket slot discovery.

use std::time::Duration;

use rpcframe::{RpcError, Session, SessionState, transport::SOCKET_SLOTS};
use rpcframe_testing::{PeerDir, TestResult, peer_dir};
use rstest::rstest;

mod common;
use common::builder_for;

#[rstest]
#[case::first(0)]
#[case::middle(4)]
#[case::last(SOCKET_SLOTS - 1)]
#[tokio::test]
async fn lowest_listening_slot_wins(peer_dir: PeerDir, #[case] slot: usize) -> TestResult {
    let peer = peer_dir.listen(slot)?;
    let later = if slot + 1 < SOCKET_SLOTS {
        Some(peer_dir.listen(slot + 1)?)
    } else {
        None
    };
    let session = builder_for(&peer_dir).build();

    let (ready, conn) = tokio::join!(session.connect(), peer.accept_ready());
    ready?;
    let _conn = conn?;

    assert_eq!(session.socket_path().await, Some(peer_dir.slot(slot)));
    if let Some(later) = later {
        let accepted = tokio::time::timeout(Duration::from_millis(100), later.accept()).await;
        assert!(accepted.is_err(), "slot {} should not be contacted", slot + 1);
    }
    Ok(())
}

#[rstest]
#[tokio::test]
async fn empty_directory_reports_every_slot(peer_dir: PeerDir) -> TestResult {
    let session = builder_for(&peer_dir).build();

    let err = session.connect().await.expect_err("nothing is listening");

    let RpcError::NoListenerFound { tried } = err else {
        panic!("unexpected error: {err:?}");
    };
    assert_eq!(tried.len(), SOCKET_SLOTS);
    assert_eq!(tried.first(), Some(&peer_dir.slot(0)));
    assert_eq!(session.state(), SessionState::Closed);
    Ok(())
}

#[rstest]
#[tokio::test]
async fn explicit_paths_are_tried_in_order(peer_dir: PeerDir) -> TestResult {
    let peer = peer_dir.listen(7)?;
    let session = Session::builder("abc")
        .socket_paths(vec![peer_dir.slot(3), peer_dir.slot(7)])
        .build();

    let (ready, conn) = tokio::join!(session.connect(), peer.accept_ready());
    ready?;
    let _conn = conn?;

    assert_eq!(session.socket_path().await, Some(peer_dir.slot(7)));
    Ok(())
}
