//! Length-prefixed byte chunks.
//!
//! Every chunk is `varint(len) || bytes`, where the varint is unsigned LEB128:
//! 7 bits per byte, least significant group first, high bit set on every byte
//! except the last. Decoding only ever slices the input; nothing is copied.

use crate::errors::CryptoError;

/// Longest LEB128 encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

/// Append the LEB128 encoding of `value` to `out`.
pub fn encode_varint(mut value: u64, out: &mut Vec<u8>) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Decode a leading LEB128 integer.
///
/// Returns the value and the number of bytes it occupied. Truncated input,
/// values wider than 64 bits, and non-minimal encodings (trailing `0x00`
/// continuation groups) are all rejected, so every length has exactly one
/// wire representation.
pub fn decode_varint(input: &[u8]) -> Result<(u64, usize), CryptoError> {
    let mut value: u64 = 0;
    for (i, &byte) in input.iter().enumerate().take(MAX_VARINT_LEN) {
        // The tenth group only has room for bit 63.
        if i == MAX_VARINT_LEN - 1 && byte > 0x01 {
            return Err(CryptoError::MalformedLength);
        }
        value |= u64::from(byte & 0x7f) << (7 * i as u32);
        if byte & 0x80 == 0 {
            if byte == 0 && i > 0 {
                return Err(CryptoError::MalformedLength);
            }
            return Ok((value, i + 1));
        }
    }
    Err(CryptoError::MalformedLength)
}

/// Append `varint(len(bytes)) || bytes` to `out`.
pub fn append_length_prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
    encode_varint(bytes.len() as u64, out);
    out.extend_from_slice(bytes);
}

/// Return `varint(len(bytes)) || bytes` as a new buffer.
pub fn write_length_prefixed(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_VARINT_LEN + bytes.len());
    append_length_prefixed(&mut out, bytes);
    out
}

/// Split one length-prefixed chunk off the front of `input`.
///
/// Returns `(chunk, remainder)`. The caller continues parsing from
/// `remainder`; a zero-length chunk is valid.
pub fn read_length_prefixed(input: &[u8]) -> Result<(&[u8], &[u8]), CryptoError> {
    let (len, used) = decode_varint(input)?;
    let len = usize::try_from(len).map_err(|_| CryptoError::MalformedLength)?;
    let rest = &input[used..];
    if len > rest.len() {
        return Err(CryptoError::MalformedLength);
    }
    Ok(rest.split_at(len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_boundary_lengths() {
        for len in [0usize, 1, 127, 128, 16383, 16384] {
            let data = vec![0x5a; len];
            let encoded = write_length_prefixed(&data);
            let (chunk, rest) = read_length_prefixed(&encoded).unwrap();
            assert_eq!(chunk, data.as_slice(), "length {len}");
            assert!(rest.is_empty(), "length {len}");
        }
    }

    #[test]
    fn prefix_width_grows_at_7_bit_boundaries() {
        assert_eq!(write_length_prefixed(&[0u8; 127]).len(), 1 + 127);
        assert_eq!(write_length_prefixed(&[0u8; 128]).len(), 2 + 128);
        assert_eq!(write_length_prefixed(&vec![0u8; 16383]).len(), 2 + 16383);
        assert_eq!(write_length_prefixed(&vec![0u8; 16384]).len(), 3 + 16384);
    }

    #[test]
    fn known_encodings() {
        let mut out = Vec::new();
        encode_varint(300, &mut out);
        assert_eq!(out, vec![0xac, 0x02]);

        let mut out = Vec::new();
        encode_varint(u64::MAX, &mut out);
        assert_eq!(out.len(), MAX_VARINT_LEN);
        assert_eq!(decode_varint(&out).unwrap(), (u64::MAX, MAX_VARINT_LEN));
    }

    #[test]
    fn empty_chunk_is_valid() {
        let (chunk, rest) = read_length_prefixed(&[0x00, 0xff]).unwrap();
        assert!(chunk.is_empty());
        assert_eq!(rest, &[0xff]);
    }

    #[test]
    fn remainder_is_returned_untouched() {
        let mut buf = write_length_prefixed(b"abc");
        buf.extend_from_slice(b"tail");
        let (chunk, rest) = read_length_prefixed(&buf).unwrap();
        assert_eq!(chunk, b"abc");
        assert_eq!(rest, b"tail");
    }

    #[test]
    fn empty_input_fails() {
        assert!(matches!(read_length_prefixed(&[]), Err(CryptoError::MalformedLength)));
    }

    #[test]
    fn truncated_varint_fails() {
        assert!(matches!(read_length_prefixed(&[0x80]), Err(CryptoError::MalformedLength)));
        assert!(matches!(read_length_prefixed(&[0xff, 0xff]), Err(CryptoError::MalformedLength)));
    }

    #[test]
    fn length_past_end_fails() {
        assert!(matches!(
            read_length_prefixed(&[0x05, 1, 2, 3]),
            Err(CryptoError::MalformedLength)
        ));
    }

    #[test]
    fn non_minimal_varint_fails() {
        // 0 encoded in two bytes
        assert!(matches!(decode_varint(&[0x80, 0x00]), Err(CryptoError::MalformedLength)));
    }

    #[test]
    fn overlong_varint_fails() {
        let mut too_wide = vec![0xffu8; 9];
        too_wide.push(0x02);
        assert!(matches!(decode_varint(&too_wide), Err(CryptoError::MalformedLength)));

        let eleven = vec![0x80u8; 11];
        assert!(matches!(decode_varint(&eleven), Err(CryptoError::MalformedLength)));
    }
}
