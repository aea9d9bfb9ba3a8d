//! Tokio codec for the opcode-tagged IPC framing.
//!
//! [`IpcFrameCodec`] turns a byte-stream socket into a sequence of
//! [`RawFrame`]s. A Unix stream socket gives no message boundaries, so the
//! decoder buffers until the 8-byte header is present and then until the
//! whole payload is present before yielding a frame.
//!
//! Two kinds of frame are protocol warnings rather than errors. A frame with
//! a zero length, or one whose opcode the protocol does not define, is logged
//! and skipped; decoding continues with the next frame in the buffer.

use std::io;

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::frame::{HEADER_SIZE, RawFrame, decode_header, encode_frame_into};

pub mod error;

pub use error::FrameError;

/// Minimum accepted value for the inbound payload limit.
pub const MIN_FRAME_LENGTH: usize = 64;

/// Maximum accepted value for the inbound payload limit (16 MiB).
pub const MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;

pub(crate) fn clamp_frame_length(value: usize) -> usize {
    value.clamp(MIN_FRAME_LENGTH, MAX_FRAME_LENGTH)
}

/// Length-prefixed codec for IPC frames.
///
/// # Examples
///
/// ```
/// use bytes::BytesMut;
/// use rpcframe::{
///     codec::IpcFrameCodec,
///     frame::{OpCode, RawFrame},
/// };
/// use tokio_util::codec::{Decoder, Encoder};
///
/// let mut codec = IpcFrameCodec::default();
/// let mut buf = BytesMut::new();
/// codec
///     .encode(RawFrame::new(OpCode::Frame, &b"{}"[..]), &mut buf)
///     .expect("encode");
/// let frame = codec.decode(&mut buf).expect("decode").expect("complete frame");
/// assert_eq!(frame.opcode, OpCode::Frame);
/// ```
#[derive(Clone, Debug)]
pub struct IpcFrameCodec {
    max_frame_length: usize,
}

impl IpcFrameCodec {
    /// Construct a codec that rejects inbound payloads above
    /// `max_frame_length` bytes.
    ///
    /// The limit is clamped to
    /// [`MIN_FRAME_LENGTH`]..=[`MAX_FRAME_LENGTH`].
    #[must_use]
    pub fn new(max_frame_length: usize) -> Self {
        Self {
            max_frame_length: clamp_frame_length(max_frame_length),
        }
    }

    /// Return the inbound payload limit.
    #[must_use]
    pub fn max_frame_length(&self) -> usize { self.max_frame_length }
}

impl Default for IpcFrameCodec {
    fn default() -> Self {
        Self {
            max_frame_length: MAX_FRAME_LENGTH,
        }
    }
}

/// Make sure `src` can hold `needed` bytes without reallocating per read.
fn reserve_for(src: &mut BytesMut, needed: usize) {
    if let Some(missing) = needed.checked_sub(src.len()) {
        src.reserve(missing);
    }
}

impl Decoder for IpcFrameCodec {
    type Item = RawFrame;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if src.len() < HEADER_SIZE {
                reserve_for(src, HEADER_SIZE);
                return Ok(None);
            }

            let header = decode_header(src)?;
            let length = header.payload_len();
            if length > self.max_frame_length {
                return Err(FrameError::OversizedFrame {
                    size: length,
                    max: self.max_frame_length,
                }
                .into());
            }

            let total = HEADER_SIZE + length;
            let Some(opcode) = header.known_opcode() else {
                // Skip the payload too so the next header lines up.
                if src.len() < total {
                    reserve_for(src, total);
                    return Ok(None);
                }
                tracing::warn!(
                    opcode = header.opcode,
                    length,
                    "dropping frame with unknown opcode"
                );
                src.advance(total);
                continue;
            };

            if length == 0 {
                tracing::warn!(%opcode, "dropping zero-length frame");
                src.advance(HEADER_SIZE);
                continue;
            }

            if src.len() < total {
                reserve_for(src, total);
                return Ok(None);
            }

            src.advance(HEADER_SIZE);
            let payload = src.split_to(length).freeze();
            return Ok(Some(RawFrame { opcode, payload }));
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if src.is_empty() {
            return Ok(None);
        }

        let bytes_received = src.len();
        let expected = decode_header(src)
            .map_or(HEADER_SIZE, |header| HEADER_SIZE + header.payload_len());
        Err(FrameError::Truncated {
            bytes_received,
            expected,
        }
        .into())
    }
}

impl Encoder<RawFrame> for IpcFrameCodec {
    type Error = io::Error;

    fn encode(&mut self, item: RawFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_frame_into(item.opcode, &item.payload, dst)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
