//! Fuzz target: `FrameDecoder::push` + `events::parse`
//!
//! Drives arbitrary byte sequences through the streaming frame decoder and
//! parses every frame it yields.  Asserts that nothing panics, that no
//! payload exceeds the length field's range, and that a reset decoder
//! behaves exactly like a fresh one.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use carphone::protocol::codec::{FrameDecoder, MAX_PAYLOAD};
use carphone::protocol::events;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut decoder = FrameDecoder::new();
    let mut first = Vec::new();

    for &b in data {
        if let Some(payload) = decoder.push(b) {
            assert!(payload.len() <= MAX_PAYLOAD);
            let _ = events::parse(payload);
            first.push(payload.to_vec());
        }
    }

    decoder.reset();
    let mut second = Vec::new();
    for &b in data {
        if let Some(payload) = decoder.push(b) {
            second.push(payload.to_vec());
        }
    }
    assert_eq!(first, second, "reset decoder must match a fresh one");
});
