//! Single-writer access to the socket's write half.

use std::{io, sync::Arc};

use bytes::Bytes;
use futures::SinkExt;
#[cfg(test)]
use tokio::sync::MutexGuard;
use tokio::{net::unix::OwnedWriteHalf, sync::Mutex};
use tokio_util::codec::FramedWrite;

use crate::{
    codec::IpcFrameCodec,
    frame::{OpCode, RawFrame},
    metrics::{self, Direction},
};

/// Cloneable handle that serialises frame writes.
///
/// Each [`send`](Self::send) holds the lock until the whole frame is
/// flushed, so two frames never interleave on the wire.
#[derive(Clone)]
pub(crate) struct FrameSender {
    inner: Arc<Mutex<FramedWrite<OwnedWriteHalf, IpcFrameCodec>>>,
}

impl FrameSender {
    pub(crate) fn new(half: OwnedWriteHalf, codec: IpcFrameCodec) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FramedWrite::new(half, codec))),
        }
    }

    /// Write one frame and flush it.
    pub(crate) async fn send(&self, opcode: OpCode, payload: impl Into<Bytes>) -> io::Result<()> {
        let mut writer = self.inner.lock().await;
        let result = writer.send(RawFrame::new(opcode, payload)).await;
        match &result {
            Ok(()) => metrics::inc_frames(Direction::Outbound),
            Err(_) => metrics::inc_errors(),
        }
        result
    }

    /// Hold the writer, blocking every other send until the guard drops.
    #[cfg(test)]
    pub(crate) async fn hold(&self) -> MutexGuard<'_, FramedWrite<OwnedWriteHalf, IpcFrameCodec>> {
        self.inner.lock().await
    }

    /// Flush and shut down the write half. Later sends fail.
    pub(crate) async fn close(&self) {
        let mut writer = self.inner.lock().await;
        if let Err(err) = writer.close().await {
            tracing::debug!(error = %err, "closing write half failed");
        }
    }
}
