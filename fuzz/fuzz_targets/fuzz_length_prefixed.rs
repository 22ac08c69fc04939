//! Fuzz target for the length-prefix reader.
//!
//! Tests that truncated or overlong varints are rejected without reading out
//! of bounds, and that accepted chunks re-encode to the same bytes.

#![no_main]

use datagram_crypto::varint::{read_length_prefixed, write_length_prefixed};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok((chunk, rest)) = read_length_prefixed(data) {
        let consumed = data.len() - rest.len();
        assert_eq!(write_length_prefixed(chunk), &data[..consumed]);
    }
});
