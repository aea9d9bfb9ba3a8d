//! Scripted peer listening on a Unix socket.

use std::{
    io,
    path::{Path, PathBuf},
};

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use rpcframe::{IpcFrameCodec, OpCode, RawFrame, transport::socket_paths_in};
use rstest::fixture;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::{UnixListener, UnixStream};
use tokio_util::codec::Framed;

use crate::payloads::ready_event;

/// Temporary directory holding the numbered socket slots.
pub struct PeerDir {
    dir: TempDir,
}

impl PeerDir {
    /// Create an empty directory.
    ///
    /// # Errors
    ///
    /// Returns any error from creating the directory.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    /// Directory path, suitable for `SessionBuilder::socket_dir`.
    #[must_use]
    pub fn path(&self) -> &Path { self.dir.path() }

    /// Path of socket slot `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is outside the numbered range.
    #[must_use]
    pub fn slot(&self, slot: usize) -> PathBuf { socket_paths_in(self.path())[slot].clone() }

    /// Start listening on slot `slot`.
    ///
    /// # Errors
    ///
    /// Returns any error from binding the socket.
    pub fn listen(&self, slot: usize) -> io::Result<MockPeer> {
        let path = self.slot(slot);
        let listener = UnixListener::bind(&path)?;
        Ok(MockPeer { listener, path })
    }
}

/// Fresh socket directory for each test.
#[fixture]
pub fn peer_dir() -> PeerDir { PeerDir::new().expect("create socket directory") }

/// A listening peer.
pub struct MockPeer {
    listener: UnixListener,
    path: PathBuf,
}

impl MockPeer {
    /// Socket path the peer listens on.
    #[must_use]
    pub fn path(&self) -> &Path { &self.path }

    /// Accept the next client.
    ///
    /// # Errors
    ///
    /// Returns any error from `accept`.
    pub async fn accept(&self) -> io::Result<PeerConnection> {
        let (stream, _) = self.listener.accept().await?;
        Ok(PeerConnection::new(stream))
    }

    /// Accept the next client and answer its handshake with `READY`.
    ///
    /// # Errors
    ///
    /// Returns any error from accepting, reading the handshake or writing
    /// the reply.
    pub async fn accept_ready(&self) -> io::Result<PeerConnection> {
        let mut conn = self.accept().await?;
        conn.complete_handshake().await?;
        Ok(conn)
    }
}

/// The peer's end of one connection.
pub struct PeerConnection {
    framed: Framed<UnixStream, IpcFrameCodec>,
}

fn invalid_data(message: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.into())
}

impl PeerConnection {
    fn new(stream: UnixStream) -> Self {
        Self {
            framed: Framed::new(stream, IpcFrameCodec::default()),
        }
    }

    /// Read the next frame; `None` once the client closed the socket.
    ///
    /// # Errors
    ///
    /// Returns read or framing errors.
    pub async fn recv(&mut self) -> io::Result<Option<RawFrame>> { self.framed.next().await.transpose() }

    /// Read the next frame and parse its payload as JSON.
    ///
    /// # Errors
    ///
    /// Fails if the socket closed, on read errors, or if the payload is not
    /// JSON.
    pub async fn recv_json(&mut self) -> io::Result<(OpCode, Value)> {
        let frame = self
            .recv()
            .await?
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;
        let value = serde_json::from_slice(&frame.payload).map_err(io::Error::from)?;
        Ok((frame.opcode, value))
    }

    /// Read the next command frame.
    ///
    /// # Errors
    ///
    /// As [`recv_json`](Self::recv_json), or if the frame is not a command.
    pub async fn recv_command(&mut self) -> io::Result<Value> {
        match self.recv_json().await? {
            (OpCode::Frame, value) => Ok(value),
            (opcode, _) => Err(invalid_data(format!("expected a command, got {opcode}"))),
        }
    }

    /// Write a frame with a raw payload.
    ///
    /// # Errors
    ///
    /// Returns write errors.
    pub async fn send(&mut self, opcode: OpCode, payload: impl Into<Bytes>) -> io::Result<()> {
        self.framed.send(RawFrame::new(opcode, payload)).await
    }

    /// Write raw bytes, bypassing the frame encoder.
    ///
    /// # Errors
    ///
    /// Returns write errors.
    pub async fn send_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        use tokio::io::AsyncWriteExt;

        self.framed.get_mut().write_all(bytes).await
    }

    /// Write a frame carrying `value` as JSON.
    ///
    /// # Errors
    ///
    /// Returns write errors.
    pub async fn send_json(&mut self, opcode: OpCode, value: &Value) -> io::Result<()> {
        let payload = serde_json::to_vec(value).map_err(io::Error::from)?;
        self.send(opcode, payload).await
    }

    /// Read the handshake, answer with [`ready_event`] and return the
    /// handshake payload.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors or if the first frame is not a handshake.
    pub async fn complete_handshake(&mut self) -> io::Result<Value> {
        let (opcode, hello) = self.recv_json().await?;
        if opcode != OpCode::Handshake {
            return Err(invalid_data(format!("expected a handshake, got {opcode}")));
        }
        self.send_json(OpCode::Frame, &ready_event()).await?;
        Ok(hello)
    }

    /// Answer `request` with a reply carrying `data`.
    ///
    /// # Errors
    ///
    /// Returns write errors.
    pub async fn reply(&mut self, request: &Value, data: Value) -> io::Result<()> {
        let reply = json!({
            "cmd": request["cmd"],
            "evt": null,
            "nonce": request["nonce"],
            "data": data,
        });
        self.send_json(OpCode::Frame, &reply).await
    }

    /// Push an event dispatch.
    ///
    /// # Errors
    ///
    /// Returns write errors.
    pub async fn dispatch(&mut self, evt: &str, data: Value) -> io::Result<()> {
        let event = json!({ "cmd": "DISPATCH", "evt": evt, "data": data });
        self.send_json(OpCode::Frame, &event).await
    }

    /// Send a `Close` frame.
    ///
    /// # Errors
    ///
    /// Returns write errors.
    pub async fn close_with(&mut self, code: i64, message: &str) -> io::Result<()> {
        self.send_json(OpCode::Close, &json!({ "code": code, "message": message }))
            .await
    }
}
