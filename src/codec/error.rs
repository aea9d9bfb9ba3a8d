//! Error types for the framing layer.
//!
//! [`FrameError`] covers wire-level failures: a header that is too short to
//! decode, a length that exceeds the configured limit, or a stream that ends
//! part-way through a frame. Zero-length frames and unknown opcodes are not
//! errors; the decoder drops them with a warning.

use std::io;

use thiserror::Error;

use crate::frame::HEADER_SIZE;

/// Framing errors raised while encoding or decoding IPC frames.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Fewer than eight header bytes were available.
    #[error("malformed frame header: have {have} bytes, need {HEADER_SIZE}")]
    MalformedHeader {
        /// Bytes available when decoding was attempted.
        have: usize,
    },

    /// Frame length exceeds the configured maximum.
    #[error("frame exceeds max length: {size} > {max}")]
    OversizedFrame {
        /// Payload size announced by, or computed for, the frame.
        size: usize,
        /// Maximum accepted payload size.
        max: usize,
    },

    /// The stream ended before a complete frame arrived.
    #[error("premature EOF: {bytes_received} bytes buffered, {expected} expected")]
    Truncated {
        /// Bytes buffered at EOF, header included.
        bytes_received: usize,
        /// Bytes required to complete the frame, header included.
        expected: usize,
    },
}

impl From<FrameError> for io::Error {
    fn from(value: FrameError) -> Self { io::Error::new(io::ErrorKind::InvalidData, value) }
}
