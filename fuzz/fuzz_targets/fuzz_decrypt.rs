//! Fuzz target for envelope decryption.
//!
//! Arbitrary bytes must be rejected with an error, never a panic and never a
//! successful decode.

#![no_main]

use datagram_crypto::{JsonDatagram, SymmetricKey, TaggedSecretBox};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let datagram: JsonDatagram<serde_json::Value, serde_json::Value> =
        JsonDatagram::new("fuzz.payload", "1.0.0", "1.*").unwrap();
    // Fixed key: forging a valid tag without it is the thing being tested.
    let secret_box = TaggedSecretBox::new(SymmetricKey::from_bytes([0x42; 32]));

    assert!(secret_box.decrypt(&datagram, data).is_err());
});
