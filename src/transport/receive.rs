//! The per-connection receive loop.

use futures::StreamExt;
use tokio::net::unix::OwnedReadHalf;
use tokio_util::{codec::FramedRead, sync::CancellationToken};

use crate::{
    codec::IpcFrameCodec,
    dispatch::Dispatcher,
    metrics::{self, Direction},
};

/// Read frames until the peer closes, a framing error occurs, a `Close`
/// frame arrives or `shutdown` fires, then tear the connection down.
#[allow(
    clippy::integer_division_remainder_used,
    reason = "tokio::select! expands to modulus internally"
)]
pub(crate) async fn run_receive_loop(
    mut frames: FramedRead<OwnedReadHalf, IpcFrameCodec>,
    mut dispatcher: Dispatcher,
    shutdown: CancellationToken,
) {
    loop {
        let next = tokio::select! {
            biased;

            () = shutdown.cancelled() => {
                tracing::debug!("receive loop cancelled");
                break;
            }
            next = frames.next() => next,
        };
        match next {
            Some(Ok(frame)) => {
                metrics::inc_frames(Direction::Inbound);
                if dispatcher.dispatch(frame).is_break() {
                    break;
                }
            }
            Some(Err(err)) => {
                metrics::inc_errors();
                tracing::warn!(error = %err, "receive loop stopped on read error");
                break;
            }
            None => {
                tracing::debug!("peer closed the socket");
                break;
            }
        }
    }
    dispatcher.finish().await;
}
