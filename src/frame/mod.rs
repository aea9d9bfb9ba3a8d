//! Wire frame layout for the local IPC protocol.
//!
//! Every frame is an 8-byte header followed by a UTF-8 JSON payload:
//!
//! ```text
//! +----------------+----------------+---------------------+
//! | opcode: u32 LE | length: u32 LE | payload (length B)  |
//! +----------------+----------------+---------------------+
//! ```
//!
//! This module only deals with bytes. JSON parsing is deferred to the
//! [`envelope`](crate::envelope) layer.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    byte_order::{read_wire_u32, write_wire_u32},
    codec::FrameError,
};

/// Size of the fixed frame header in bytes.
pub const HEADER_SIZE: usize = 8;

/// Frame kinds defined by the peer protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum OpCode {
    /// Initial client hello carrying the protocol version and client id.
    Handshake = 0,
    /// JSON command, reply or event.
    Frame = 1,
    /// Peer is closing the connection; payload is `{code, message}`.
    Close = 2,
    /// Keep-alive check that must be echoed back as [`OpCode::Pong`].
    Ping = 3,
    /// Answer to a [`OpCode::Ping`].
    Pong = 4,
}

impl OpCode {
    /// Map a raw wire value to an opcode, returning `None` when unknown.
    #[must_use]
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Handshake),
            1 => Some(Self::Frame),
            2 => Some(Self::Close),
            3 => Some(Self::Ping),
            4 => Some(Self::Pong),
            _ => None,
        }
    }

    /// Return the wire value of this opcode.
    #[must_use]
    pub fn as_u32(self) -> u32 { self as u32 }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Handshake => "handshake",
            Self::Frame => "frame",
            Self::Close => "close",
            Self::Ping => "ping",
            Self::Pong => "pong",
        };
        f.write_str(name)
    }
}

/// Decoded frame header.
///
/// The opcode is kept raw so callers can log values the protocol does not
/// define before discarding the frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    /// Raw opcode value.
    pub opcode: u32,
    /// Exact payload length in bytes.
    pub length: u32,
}

impl FrameHeader {
    /// Return the known opcode for this header, if any.
    #[must_use]
    pub fn known_opcode(&self) -> Option<OpCode> { OpCode::from_u32(self.opcode) }

    /// Payload length as a `usize`.
    #[must_use]
    pub fn payload_len(&self) -> usize { self.length as usize }
}

/// A complete frame: a known opcode and its raw payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawFrame {
    /// Frame kind.
    pub opcode: OpCode,
    /// Raw payload bytes, normally UTF-8 JSON.
    pub payload: Bytes,
}

impl RawFrame {
    /// Construct a frame from an opcode and payload.
    #[must_use]
    pub fn new(opcode: OpCode, payload: impl Into<Bytes>) -> Self {
        Self {
            opcode,
            payload: payload.into(),
        }
    }
}

/// Append the header and payload for `opcode` to `dst`.
///
/// # Errors
///
/// Returns [`FrameError::OversizedFrame`] if the payload length does not fit
/// the 32-bit length field.
pub fn encode_frame_into(opcode: OpCode, payload: &[u8], dst: &mut BytesMut) -> Result<(), FrameError> {
    let length = u32::try_from(payload.len()).map_err(|_| FrameError::OversizedFrame {
        size: payload.len(),
        max: u32::MAX as usize,
    })?;
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&write_wire_u32(opcode.as_u32()));
    dst.put_slice(&write_wire_u32(length));
    dst.put_slice(payload);
    Ok(())
}

/// Encode a whole frame into a freshly allocated buffer.
///
/// # Errors
///
/// Returns [`FrameError::OversizedFrame`] if the payload length does not fit
/// the 32-bit length field.
///
/// # Examples
///
/// ```
/// use rpcframe::frame::{OpCode, encode_frame};
///
/// let bytes = encode_frame(OpCode::Ping, b"{}").expect("encode");
/// assert_eq!(&bytes[..], &[3, 0, 0, 0, 2, 0, 0, 0, b'{', b'}']);
/// ```
pub fn encode_frame(opcode: OpCode, payload: &[u8]) -> Result<Bytes, FrameError> {
    let mut dst = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    encode_frame_into(opcode, payload, &mut dst)?;
    Ok(dst.freeze())
}

/// Decode the 8-byte frame header at the start of `bytes`.
///
/// Bytes beyond the header are ignored.
///
/// # Errors
///
/// Returns [`FrameError::MalformedHeader`] if fewer than [`HEADER_SIZE`]
/// bytes are available.
///
/// # Examples
///
/// ```
/// use rpcframe::frame::decode_header;
///
/// let header = decode_header(&[1, 0, 0, 0, 5, 0, 0, 0]).expect("header");
/// assert_eq!((header.opcode, header.length), (1, 5));
/// ```
pub fn decode_header(bytes: &[u8]) -> Result<FrameHeader, FrameError> {
    let (Some(op), Some(len)) = (bytes.get(0..4), bytes.get(4..HEADER_SIZE)) else {
        return Err(FrameError::MalformedHeader { have: bytes.len() });
    };
    let mut op_bytes = [0u8; 4];
    let mut len_bytes = [0u8; 4];
    op_bytes.copy_from_slice(op);
    len_bytes.copy_from_slice(len);
    Ok(FrameHeader {
        opcode: read_wire_u32(op_bytes),
        length: read_wire_u32(len_bytes),
    })
}

/// Return the payload bytes unchanged.
///
/// Payload interpretation happens in the envelope layer; the framing layer
/// never parses JSON.
#[must_use]
pub fn decode_payload(payload: Bytes) -> Bytes { payload }
