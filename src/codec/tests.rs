//! Unit tests for [`IpcFrameCodec`].

use bytes::{BufMut, Bytes, BytesMut};
use rstest::{fixture, rstest};
use tokio_util::codec::{Decoder, Encoder};
use tracing_test::traced_test;

use super::*;
use crate::{
    byte_order::write_wire_u32,
    frame::{OpCode, encode_frame},
};

#[fixture]
fn codec() -> IpcFrameCodec { IpcFrameCodec::default() }

fn raw_header(opcode: u32, length: u32) -> Vec<u8> {
    let mut header = write_wire_u32(opcode).to_vec();
    header.extend_from_slice(&write_wire_u32(length));
    header
}

#[rstest]
fn decodes_complete_frame(mut codec: IpcFrameCodec) {
    let mut buf = BytesMut::from(&encode_frame(OpCode::Frame, b"{\"a\":1}").expect("encode")[..]);

    let frame = codec.decode(&mut buf).expect("decode").expect("frame");
    assert_eq!(frame.opcode, OpCode::Frame);
    assert_eq!(frame.payload, Bytes::from_static(b"{\"a\":1}"));
    assert!(buf.is_empty());
}

#[rstest]
fn waits_for_full_header(mut codec: IpcFrameCodec) {
    let encoded = encode_frame(OpCode::Ping, b"{}").expect("encode");
    let mut buf = BytesMut::from(&encoded[..5]);

    assert!(codec.decode(&mut buf).expect("decode").is_none());
    assert_eq!(buf.len(), 5, "partial header must stay buffered");

    buf.put_slice(&encoded[5..]);
    let frame = codec.decode(&mut buf).expect("decode").expect("frame");
    assert_eq!(frame.opcode, OpCode::Ping);
}

#[rstest]
fn waits_for_full_payload(mut codec: IpcFrameCodec) {
    let encoded = encode_frame(OpCode::Frame, b"0123456789").expect("encode");
    let mut buf = BytesMut::from(&encoded[..HEADER_SIZE + 3]);

    assert!(codec.decode(&mut buf).expect("decode").is_none());

    buf.put_slice(&encoded[HEADER_SIZE + 3..]);
    let frame = codec.decode(&mut buf).expect("decode").expect("frame");
    assert_eq!(&frame.payload[..], b"0123456789");
}

#[rstest]
fn decodes_back_to_back_frames(mut codec: IpcFrameCodec) {
    let mut buf = BytesMut::new();
    buf.put_slice(&encode_frame(OpCode::Ping, b"1").expect("encode"));
    buf.put_slice(&encode_frame(OpCode::Frame, b"2").expect("encode"));

    let first = codec.decode(&mut buf).expect("decode").expect("first");
    let second = codec.decode(&mut buf).expect("decode").expect("second");
    assert_eq!((first.opcode, &first.payload[..]), (OpCode::Ping, &b"1"[..]));
    assert_eq!((second.opcode, &second.payload[..]), (OpCode::Frame, &b"2"[..]));
}

#[rstest]
#[traced_test]
fn zero_length_frame_is_skipped(mut codec: IpcFrameCodec) {
    let mut buf = BytesMut::from(&raw_header(1, 0)[..]);
    buf.put_slice(&encode_frame(OpCode::Frame, b"next").expect("encode"));

    let frame = codec.decode(&mut buf).expect("decode").expect("frame after skip");
    assert_eq!(&frame.payload[..], b"next");
    assert!(logs_contain("dropping zero-length frame"));
}

#[rstest]
#[traced_test]
fn unknown_opcode_frame_is_skipped_with_payload(mut codec: IpcFrameCodec) {
    let mut buf = BytesMut::from(&raw_header(42, 3)[..]);
    buf.put_slice(b"xyz");
    buf.put_slice(&encode_frame(OpCode::Close, b"{}").expect("encode"));

    let frame = codec.decode(&mut buf).expect("decode").expect("frame after skip");
    assert_eq!(frame.opcode, OpCode::Close);
    assert!(logs_contain("dropping frame with unknown opcode"));
}

#[rstest]
fn unknown_opcode_waits_for_its_payload(mut codec: IpcFrameCodec) {
    let mut buf = BytesMut::from(&raw_header(42, 4)[..]);
    buf.put_slice(b"ab");

    assert!(codec.decode(&mut buf).expect("decode").is_none());
    assert_eq!(buf.len(), HEADER_SIZE + 2);
}

#[test]
fn oversized_frame_is_rejected() {
    let mut codec = IpcFrameCodec::new(MIN_FRAME_LENGTH);
    let mut buf = BytesMut::from(&raw_header(1, 1_000)[..]);

    let err = codec.decode(&mut buf).expect_err("oversized frame must fail");
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
}

#[rstest]
#[case::mid_header(vec![1, 0, 0], HEADER_SIZE)]
#[case::mid_payload(vec![1, 0, 0, 0, 4, 0, 0, 0, b'a'], HEADER_SIZE + 4)]
fn eof_inside_frame_is_truncation(
    mut codec: IpcFrameCodec,
    #[case] bytes: Vec<u8>,
    #[case] expected: usize,
) {
    let received = bytes.len();
    let mut buf = BytesMut::from(&bytes[..]);

    let err = codec.decode_eof(&mut buf).expect_err("truncated frame");
    let inner = err
        .get_ref()
        .and_then(|e| e.downcast_ref::<FrameError>())
        .expect("frame error");
    assert_eq!(
        inner,
        &FrameError::Truncated {
            bytes_received: received,
            expected,
        }
    );
}

#[rstest]
fn clean_eof_yields_none(mut codec: IpcFrameCodec) {
    let mut buf = BytesMut::new();
    assert!(codec.decode_eof(&mut buf).expect("clean eof").is_none());
}

#[rstest]
fn encoder_matches_encode_frame(mut codec: IpcFrameCodec) {
    let mut buf = BytesMut::new();
    codec
        .encode(RawFrame::new(OpCode::Pong, &b"{\"x\":1}"[..]), &mut buf)
        .expect("encode");
    assert_eq!(
        buf.freeze(),
        encode_frame(OpCode::Pong, b"{\"x\":1}").expect("encode")
    );
}

#[rstest]
#[case(0, MIN_FRAME_LENGTH)]
#[case(usize::MAX, MAX_FRAME_LENGTH)]
#[case(4096, 4096)]
fn frame_length_is_clamped(#[case] requested: usize, #[case] expected: usize) {
    assert_eq!(IpcFrameCodec::new(requested).max_frame_length(), expected);
}
