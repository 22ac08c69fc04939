//! Property-based tests for the envelope format.
//!
//! - Length-prefixed chunks and metadata records survive encode/decode
//! - Envelopes decrypt to exactly what was encrypted
//! - Flipping any bit of the record fields or ciphertext is caught
//! - Key-less inspection never panics on arbitrary input

use proptest::prelude::*;
use serde::{Deserialize, Serialize};

use crate::aad::AadMeta;
use crate::constants::KEY_SIZE;
use crate::datagram::JsonDatagram;
use crate::errors::CryptoError;
use crate::secretbox::{SymmetricKey, TaggedSecretBox};
use crate::typed_bytes::TypedBytes;
use crate::varint::{read_length_prefixed, write_length_prefixed};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Header {
    thread: String,
    flags: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Body {
    text: String,
    attachments: Vec<Vec<u8>>,
}

fn datagram() -> JsonDatagram<Header, Body> {
    JsonDatagram::new("prop.message", "1.3.0", "^1.0.0").unwrap()
}

fn header_strategy() -> impl Strategy<Value = Header> {
    (".{0,40}", any::<u32>()).prop_map(|(thread, flags)| Header { thread, flags })
}

fn body_strategy() -> impl Strategy<Value = Body> {
    (".{0,200}", prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 0..4))
        .prop_map(|(text, attachments)| Body { text, attachments })
}

// ==================== Codec Property Tests ====================

proptest! {
    #[test]
    fn length_prefixed_roundtrip(
        data in prop::collection::vec(any::<u8>(), 0..20_000),
        tail in prop::collection::vec(any::<u8>(), 0..16),
    ) {
        let mut encoded = write_length_prefixed(&data);
        encoded.extend_from_slice(&tail);
        let (chunk, rest) = read_length_prefixed(&encoded).unwrap();
        prop_assert_eq!(chunk, data.as_slice());
        prop_assert_eq!(rest, tail.as_slice());
    }

    #[test]
    fn metadata_roundtrip(
        version in "[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}",
        datagram_type in "[a-z.]{1,40}",
        nonce in prop::array::uniform24(any::<u8>()),
        raw_header in prop::collection::vec(any::<u8>(), 0..300),
    ) {
        let meta = AadMeta::new(version, datagram_type, nonce, raw_header);
        let bytes = meta.serialize();
        let parsed = AadMeta::deserialize(&bytes).unwrap().unwrap();
        prop_assert_eq!(parsed.metadata, meta);
        prop_assert!(parsed.content.is_empty());
    }

    /// Inspection is a best-effort probe and must never panic.
    #[test]
    fn inspect_never_panics(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let typed = TypedBytes::new(data);
        let first = typed.inspect();
        prop_assert_eq!(typed.inspect(), first);
    }
}

// ==================== Envelope Property Tests ====================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn envelope_roundtrip(
        key in prop::array::uniform32(any::<u8>()),
        header in header_strategy(),
        body in body_strategy(),
    ) {
        let dg = datagram();
        let sb = TaggedSecretBox::new(SymmetricKey::from_bytes(key));
        let envelope = sb.encrypt(&dg, &header, &body).unwrap();
        let decrypted = sb.decrypt(&dg, &envelope).unwrap();
        prop_assert_eq!(decrypted.header, header);
        prop_assert_eq!(decrypted.body, body);
    }

    /// Any single-bit flip in the nonce, type, version, header or ciphertext
    /// fails authentication rather than decoding to something else.
    #[test]
    fn single_bit_flip_detected(
        header in header_strategy(),
        body in body_strategy(),
        pick in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let dg = datagram();
        let sb = TaggedSecretBox::new(SymmetricKey::from_bytes([0x11; KEY_SIZE]));
        let mut bytes = sb.encrypt(&dg, &header, &body).unwrap().into_bytes();

        // Offsets of authenticated field contents: every field after the
        // format version (minus its inner length prefix), plus the ciphertext.
        let (record, content) = read_length_prefixed(&bytes).unwrap();
        let mut flippable = Vec::new();
        let mut cursor = bytes.len() - record.len() - content.len();
        let mut rest = record;
        for field_index in 0..5 {
            let (chunk, next) = read_length_prefixed(rest).unwrap();
            let prefix_len = rest.len() - next.len() - chunk.len();
            let start = cursor + prefix_len;
            if field_index > 0 {
                flippable.extend(start..start + chunk.len());
            }
            cursor = start + chunk.len();
            rest = next;
        }
        flippable.extend(cursor..bytes.len());

        let at = flippable[pick.index(flippable.len())];
        bytes[at] ^= 1u8 << bit;

        let result = sb.decrypt(&dg, &bytes);
        prop_assert!(
            matches!(result, Err(CryptoError::AuthenticationFailed)),
            "flip at {} gave {:?}", at, result
        );
    }
}
