//! Integration tests for the ways a connection ends.

use std::sync::{Arc, OnceLock};

use rpcframe::{CloseCode, CommandKind, OpCode, Request, RpcError, Session, SessionState};
use rpcframe_testing::{PeerDir, TestResult, peer_dir};
use rstest::rstest;
use serde_json::json;

mod common;
use common::{EVENTUALLY, assert_quiet, builder_for, connect_pair, next, recorder};

async fn wait_for_closed(session: &Session) -> TestResult {
    let mut watch = session.watch_state();
    tokio::time::timeout(EVENTUALLY, watch.wait_for(|s| *s == SessionState::Closed)).await??;
    Ok(())
}

#[rstest]
#[tokio::test]
async fn peer_hang_up_reports_socket_disconnected_once(peer_dir: PeerDir) -> TestResult {
    let peer = peer_dir.listen(0)?;
    let (close_tx, mut close_rx) = recorder();
    let session = builder_for(&peer_dir)
        .on_disconnect(move |close| {
            let tx = close_tx.clone();
            async move {
                let _ = tx.send(close);
            }
        })
        .build();
    let conn = connect_pair(&session, &peer).await?;

    drop(conn);

    let close = next(&mut close_rx).await?;
    assert_eq!(close.known_code(), Some(CloseCode::SocketDisconnected));
    assert_eq!(close.message, "Socket Disconnected");
    wait_for_closed(&session).await?;
    assert_quiet(&mut close_rx).await;
    Ok(())
}

#[rstest]
#[tokio::test]
async fn close_frame_is_reported_and_ends_reading(peer_dir: PeerDir) -> TestResult {
    let peer = peer_dir.listen(0)?;
    let (close_tx, mut close_rx) = recorder();
    let (event_tx, mut event_rx) = recorder();
    let session = builder_for(&peer_dir)
        .on_disconnect(move |close| {
            let tx = close_tx.clone();
            async move {
                let _ = tx.send(close);
            }
        })
        .on_event(move |evt, _| {
            let tx = event_tx.clone();
            async move {
                let _ = tx.send(evt);
            }
        })
        .build();
    let mut conn = connect_pair(&session, &peer).await?;

    conn.close_with(4003, "Token revoked").await?;
    // The client stops reading after a close, so this write may fail.
    let _ = conn.dispatch("GUILD_CREATE", json!({})).await;

    let close = next(&mut close_rx).await?;
    assert_eq!(close.known_code(), Some(CloseCode::TokenRevoked));
    assert_eq!(close.message, "Token revoked");
    wait_for_closed(&session).await?;
    assert_quiet(&mut close_rx).await;
    assert_quiet(&mut event_rx).await;
    Ok(())
}

#[rstest]
#[tokio::test]
async fn explicit_disconnect_closes_and_rejects_calls(peer_dir: PeerDir) -> TestResult {
    let peer = peer_dir.listen(0)?;
    let (close_tx, mut close_rx) = recorder();
    let session = builder_for(&peer_dir)
        .on_disconnect(move |close| {
            let tx = close_tx.clone();
            async move {
                let _ = tx.send(close);
            }
        })
        .build();
    let mut conn = connect_pair(&session, &peer).await?;

    session.disconnect().await;

    assert_eq!(session.state(), SessionState::Closed);
    assert!(session.socket_path().await.is_none());
    let close = next(&mut close_rx).await?;
    assert_eq!(close.code, 0);
    assert!(conn.recv().await?.is_none(), "peer should see end of stream");

    let err = session
        .call(&Request::new(CommandKind::GetGuilds))
        .await
        .expect_err("closed session");
    assert!(matches!(err, RpcError::InvalidState(SessionState::Closed)));

    session.disconnect().await;
    assert_quiet(&mut close_rx).await;
    Ok(())
}

#[rstest]
#[tokio::test]
async fn pending_call_fails_when_peer_goes_away(peer_dir: PeerDir) -> TestResult {
    let peer = peer_dir.listen(0)?;
    let session = builder_for(&peer_dir).command_timeout(None).build();
    let mut conn = connect_pair(&session, &peer).await?;

    let request = Request::new(CommandKind::GetGuilds);
    let (result, peer_side) = tokio::join!(
        session.call(&request),
        async move {
            let request = conn.recv_command().await;
            drop(conn);
            request
        }
    );
    peer_side?;

    assert!(matches!(result, Err(RpcError::SocketDisconnected)));
    wait_for_closed(&session).await?;
    Ok(())
}

#[rstest]
#[tokio::test]
async fn oversized_frame_ends_the_connection(peer_dir: PeerDir) -> TestResult {
    let peer = peer_dir.listen(0)?;
    let (close_tx, mut close_rx) = recorder();
    let session = builder_for(&peer_dir)
        .max_frame_length(1024)
        .on_disconnect(move |close| {
            let tx = close_tx.clone();
            async move {
                let _ = tx.send(close);
            }
        })
        .build();
    let mut conn = connect_pair(&session, &peer).await?;

    conn.send(OpCode::Frame, vec![b' '; 4096]).await?;

    let close = next(&mut close_rx).await?;
    assert_eq!(close.known_code(), Some(CloseCode::SocketDisconnected));
    wait_for_closed(&session).await?;
    Ok(())
}

#[rstest]
#[tokio::test]
async fn disconnect_handler_may_disconnect_again(peer_dir: PeerDir) -> TestResult {
    let peer = peer_dir.listen(0)?;
    let (done_tx, mut done_rx) = recorder();
    let slot: Arc<OnceLock<Session>> = Arc::new(OnceLock::new());
    let handle = Arc::clone(&slot);
    let session = builder_for(&peer_dir)
        .on_disconnect(move |_| {
            let session = handle.get().cloned();
            let tx = done_tx.clone();
            async move {
                if let Some(session) = session {
                    session.disconnect().await;
                }
                let _ = tx.send(());
            }
        })
        .build();
    let _ = slot.set(session.clone());
    let conn = connect_pair(&session, &peer).await?;

    drop(conn);

    next(&mut done_rx).await?;
    assert_eq!(session.state(), SessionState::Closed);
    Ok(())
}

#[rstest]
#[tokio::test]
async fn handler_panic_does_not_swallow_later_reports(peer_dir: PeerDir) -> TestResult {
    let peer = peer_dir.listen(0)?;
    let (event_tx, mut event_rx) = recorder();
    let (close_tx, mut close_rx) = recorder();
    let session = builder_for(&peer_dir)
        .on_event(move |evt, _| {
            assert_ne!(evt, rpcframe::EventKind::GuildCreate, "handler failure");
            let tx = event_tx.clone();
            async move {
                let _ = tx.send(evt);
            }
        })
        .on_disconnect(move |close| {
            let tx = close_tx.clone();
            async move {
                let _ = tx.send(close);
            }
        })
        .build();
    let mut conn = connect_pair(&session, &peer).await?;

    conn.dispatch("GUILD_CREATE", json!({})).await?;
    conn.dispatch("CHANNEL_CREATE", json!({})).await?;
    assert_eq!(next(&mut event_rx).await?, rpcframe::EventKind::ChannelCreate);

    drop(conn);
    let close = next(&mut close_rx).await?;
    assert_eq!(close.known_code(), Some(CloseCode::SocketDisconnected));
    Ok(())
}
