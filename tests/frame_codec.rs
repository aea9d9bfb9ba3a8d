//! Generated checks for [`IpcFrameCodec`] framing.

use std::io;

use bytes::{Bytes, BytesMut};
use proptest::{
    collection::vec,
    prelude::{Just, Strategy, any, prop_oneof},
    prop_assert,
    prop_assert_eq,
    test_runner::{Config as ProptestConfig, RngAlgorithm, TestCaseError, TestRng, TestRunner},
};
use rpcframe::{
    IpcFrameCodec,
    OpCode,
    RawFrame,
    byte_order::write_wire_u32,
    codec::MIN_FRAME_LENGTH,
};
use rstest::rstest;
use tokio_util::codec::{Decoder, Encoder};

fn deterministic_runner(cases: u32) -> TestRunner {
    let config = ProptestConfig {
        cases,
        ..ProptestConfig::default()
    };
    let rng = TestRng::deterministic_rng(RngAlgorithm::ChaCha);
    TestRunner::new_with_rng(config, rng)
}

fn opcode_strategy() -> impl Strategy<Value = OpCode> {
    prop_oneof![
        Just(OpCode::Handshake),
        Just(OpCode::Frame),
        Just(OpCode::Close),
        Just(OpCode::Ping),
        Just(OpCode::Pong),
    ]
}

// Zero-length frames are dropped by the decoder, so payloads start at one byte.
fn frame_strategy(max_frame_length: usize) -> impl Strategy<Value = (OpCode, Vec<u8>)> {
    (
        opcode_strategy(),
        prop_oneof![
            Just(1usize),
            Just(max_frame_length),
            1usize..=max_frame_length
        ]
        .prop_flat_map(|len| vec(any::<u8>(), len)),
    )
}

fn encode_all(codec: &mut IpcFrameCodec, frames: &[(OpCode, Vec<u8>)]) -> Result<BytesMut, TestCaseError> {
    let mut wire = BytesMut::new();
    for (opcode, payload) in frames {
        codec
            .encode(RawFrame::new(*opcode, Bytes::from(payload.clone())), &mut wire)
            .map_err(|err| TestCaseError::fail(format!("encode failed: {err}")))?;
    }
    Ok(wire)
}

#[rstest]
#[case(MIN_FRAME_LENGTH, 96)]
#[case(1024, 64)]
fn generated_sequences_round_trip(#[case] max_frame_length: usize, #[case] cases: u32) {
    let mut runner = deterministic_runner(cases);
    let strategy = vec(frame_strategy(max_frame_length), 1..12);

    runner
        .run(&strategy, |frames| {
            let mut codec = IpcFrameCodec::new(max_frame_length);
            let mut wire = encode_all(&mut codec, &frames)?;

            for (opcode, payload) in &frames {
                let frame = codec
                    .decode(&mut wire)
                    .map_err(|err| TestCaseError::fail(format!("decode failed: {err}")))?
                    .ok_or_else(|| TestCaseError::fail("missing frame during decode".to_owned()))?;
                prop_assert_eq!(frame.opcode, *opcode);
                prop_assert_eq!(&frame.payload[..], &payload[..]);
            }

            prop_assert!(wire.is_empty());
            Ok(())
        })
        .expect("generated frame sequence should round-trip");
}

#[rstest]
#[case(256, 96)]
fn arbitrary_read_boundaries_yield_the_same_frames(
    #[case] max_frame_length: usize,
    #[case] cases: u32,
) {
    let mut runner = deterministic_runner(cases);
    let strategy = (
        vec(frame_strategy(max_frame_length), 1..8),
        vec(1usize..32, 1..64),
    );

    runner
        .run(&strategy, |(frames, chunks)| {
            let mut codec = IpcFrameCodec::new(max_frame_length);
            let wire = encode_all(&mut codec, &frames)?.freeze();

            let mut buffer = BytesMut::new();
            let mut decoded = Vec::new();
            let mut offset = 0;
            let mut sizes = chunks.iter().cycle();
            while offset < wire.len() {
                let size = sizes.next().copied().unwrap_or(1);
                let end = (offset + size).min(wire.len());
                buffer.extend_from_slice(&wire[offset..end]);
                offset = end;
                while let Some(frame) = codec
                    .decode(&mut buffer)
                    .map_err(|err| TestCaseError::fail(format!("decode failed: {err}")))?
                {
                    decoded.push((frame.opcode, frame.payload.to_vec()));
                }
            }

            prop_assert_eq!(decoded, frames);
            prop_assert!(buffer.is_empty());
            Ok(())
        })
        .expect("split reads should decode identically");
}

#[rstest]
#[case(MIN_FRAME_LENGTH, 64)]
fn oversized_lengths_are_rejected(#[case] max_frame_length: usize, #[case] cases: u32) {
    let mut runner = deterministic_runner(cases);
    let limit = u32::try_from(max_frame_length).expect("limit fits in u32");
    let strategy = (opcode_strategy(), (limit + 1)..=u32::MAX);

    runner
        .run(&strategy, |(opcode, declared)| {
            let mut codec = IpcFrameCodec::new(max_frame_length);
            let mut buffer = BytesMut::new();
            buffer.extend_from_slice(&write_wire_u32(opcode.as_u32()));
            buffer.extend_from_slice(&write_wire_u32(declared));

            match codec.decode(&mut buffer) {
                Err(err) => prop_assert_eq!(err.kind(), io::ErrorKind::InvalidData),
                Ok(frame) => {
                    return Err(TestCaseError::fail(format!(
                        "expected oversized frame to fail, got {frame:?}"
                    )));
                }
            }
            Ok(())
        })
        .expect("oversized frames should be rejected");
}
