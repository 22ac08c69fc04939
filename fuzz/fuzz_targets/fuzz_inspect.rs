//! Fuzz target for key-less envelope inspection.
//!
//! `inspect` is run on untrusted buffers to route them; it must return `None`
//! for anything malformed and never panic.

#![no_main]

use datagram_crypto::{AadMeta, TypedBytes};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let typed = TypedBytes::new(data.to_vec());
    let first = typed.inspect();
    assert_eq!(typed.inspect(), first);

    // Whatever parses must survive a re-encode unchanged
    if let Ok(Some(parsed)) = AadMeta::deserialize(data) {
        let reencoded = parsed.metadata.serialize();
        let reparsed = AadMeta::deserialize(&reencoded).unwrap().unwrap();
        assert_eq!(reparsed.metadata, parsed.metadata);
    }
});
