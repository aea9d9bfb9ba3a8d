//! Integration coverage for `rpcframe_testing` peer helpers.

use futures::{SinkExt, StreamExt};
use rpcframe::{IpcFrameCodec, OpCode, RawFrame};
use rpcframe_testing::{PeerDir, TestResult, error_event, peer_dir};
use rstest::rstest;
use serde_json::{Value, json};
use tokio::net::UnixStream;
use tokio_util::codec::Framed;

async fn next_json(client: &mut Framed<UnixStream, IpcFrameCodec>) -> TestResult<(OpCode, Value)> {
    let frame = client.next().await.ok_or("peer closed")??;
    Ok((frame.opcode, serde_json::from_slice(&frame.payload)?))
}

#[rstest]
#[tokio::test]
async fn scripted_peer_answers_handshake_and_commands(peer_dir: PeerDir) -> TestResult {
    let peer = peer_dir.listen(2)?;
    assert_eq!(peer.path(), peer_dir.slot(2).as_path());

    let stream = UnixStream::connect(peer.path()).await?;
    let mut client = Framed::new(stream, IpcFrameCodec::default());
    let mut conn = peer.accept().await?;

    client
        .send(RawFrame::new(OpCode::Handshake, &br#"{"v":1,"client_id":"abc"}"#[..]))
        .await?;
    let hello = conn.complete_handshake().await?;
    assert_eq!(hello, json!({ "v": 1, "client_id": "abc" }));

    let (opcode, ready) = next_json(&mut client).await?;
    assert_eq!(opcode, OpCode::Frame);
    assert_eq!(ready["evt"], "READY");

    let command = json!({ "cmd": "GET_GUILD", "nonce": "sync;1", "args": {} });
    client
        .send(RawFrame::new(OpCode::Frame, serde_json::to_vec(&command)?))
        .await?;
    let received = conn.recv_command().await?;
    conn.reply(&received, json!({ "id": "9" })).await?;
    conn.send_json(OpCode::Frame, &error_event(&received, 4003, "Invalid guild"))
        .await?;

    let (_, reply) = next_json(&mut client).await?;
    assert_eq!(reply["nonce"], "sync;1");
    assert_eq!(reply["data"]["id"], "9");
    let (_, error) = next_json(&mut client).await?;
    assert_eq!(error["evt"], "ERROR");
    assert_eq!(error["data"]["code"], 4003);

    conn.close_with(4000, "Invalid client ID").await?;
    let (opcode, close) = next_json(&mut client).await?;
    assert_eq!(opcode, OpCode::Close);
    assert_eq!(close["code"], 4000);
    Ok(())
}

#[rstest]
#[tokio::test]
async fn recv_reports_end_of_stream(peer_dir: PeerDir) -> TestResult {
    let peer = peer_dir.listen(0)?;
    let stream = UnixStream::connect(peer.path()).await?;
    let mut conn = peer.accept().await?;

    drop(stream);

    assert!(conn.recv().await?.is_none());
    Ok(())
}
