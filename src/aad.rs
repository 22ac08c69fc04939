//! Envelope metadata: the authenticated-but-unencrypted header.
//!
//! Wire format:
//! - record = lp(format_version) || lp(datagram_version) || lp(datagram_type)
//!   || lp(nonce) || lp(raw_header)
//! - envelope = lp(record) || ciphertext
//!
//! where `lp(x) = varint(len(x)) || x`. The outer prefix lets a reader split
//! metadata from ciphertext without looking inside the record; the record
//! bytes themselves are the AEAD associated data.

use crate::constants::{METADATA_FORMAT_VERSION, NONCE_SIZE};
use crate::errors::CryptoError;
use crate::varint::{append_length_prefixed, read_length_prefixed, write_length_prefixed};

/// Metadata bound to every envelope's ciphertext.
///
/// The metadata format version is not a field: it is written from
/// [`METADATA_FORMAT_VERSION`] on encode and checked on decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AadMeta {
    /// Schema version of the payload, as declared by its datagram.
    pub datagram_version: String,
    /// Type tag of the payload, as declared by its datagram.
    pub datagram_type: String,
    pub nonce: [u8; NONCE_SIZE],
    /// Header bytes in the datagram's own encoding.
    pub raw_header: Vec<u8>,
}

/// Result of splitting an envelope into metadata and ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMetadata<'a> {
    pub metadata: AadMeta,
    /// The record exactly as it appeared on the wire (the AEAD associated data).
    pub raw_metadata: &'a [u8],
    /// Everything after the record: the ciphertext.
    pub content: &'a [u8],
}

impl AadMeta {
    pub fn new(
        datagram_version: impl Into<String>,
        datagram_type: impl Into<String>,
        nonce: [u8; NONCE_SIZE],
        raw_header: Vec<u8>,
    ) -> Self {
        Self {
            datagram_version: datagram_version.into(),
            datagram_type: datagram_type.into(),
            nonce,
            raw_header,
        }
    }

    /// Encode the five-field record without the outer length prefix.
    pub fn encode_record(&self) -> Vec<u8> {
        let mut record = Vec::with_capacity(
            METADATA_FORMAT_VERSION.len()
                + self.datagram_version.len()
                + self.datagram_type.len()
                + NONCE_SIZE
                + self.raw_header.len()
                + 5 * 2,
        );
        append_length_prefixed(&mut record, METADATA_FORMAT_VERSION.as_bytes());
        append_length_prefixed(&mut record, self.datagram_version.as_bytes());
        append_length_prefixed(&mut record, self.datagram_type.as_bytes());
        append_length_prefixed(&mut record, &self.nonce);
        append_length_prefixed(&mut record, &self.raw_header);
        record
    }

    /// Encode the record wrapped in its outer length prefix.
    pub fn serialize(&self) -> Vec<u8> {
        write_length_prefixed(&self.encode_record())
    }

    /// Split `bytes` into metadata, raw record and trailing content.
    ///
    /// Returns `Ok(None)` when there is no readable outer length prefix at
    /// all, so arbitrary buffers can be probed. Once a record has been
    /// delimited, any defect inside it is an error.
    ///
    /// Version and type bytes that are not UTF-8 are decoded lossily, so a
    /// tampered record still reaches the AEAD check.
    pub fn deserialize(bytes: &[u8]) -> Result<Option<ParsedMetadata<'_>>, CryptoError> {
        Self::split(bytes, false)
    }

    /// Like [`deserialize`](Self::deserialize), but version and type bytes
    /// that are not UTF-8 fail with `MissingOrMalformedHeader`. For callers
    /// that read metadata without authenticating it.
    pub fn deserialize_strict(bytes: &[u8]) -> Result<Option<ParsedMetadata<'_>>, CryptoError> {
        Self::split(bytes, true)
    }

    fn split(bytes: &[u8], strict: bool) -> Result<Option<ParsedMetadata<'_>>, CryptoError> {
        let (raw_metadata, content) = match read_length_prefixed(bytes) {
            Ok(split) => split,
            Err(_) => return Ok(None),
        };
        let metadata = Self::parse_record(raw_metadata, strict)?;
        Ok(Some(ParsedMetadata {
            metadata,
            raw_metadata,
            content,
        }))
    }

    fn parse_record(record: &[u8], strict: bool) -> Result<Self, CryptoError> {
        let (format_version, rest) = read_length_prefixed(record)?;
        if format_version != METADATA_FORMAT_VERSION.as_bytes() {
            return Err(CryptoError::UnrecognizedMetadataVersion(
                String::from_utf8_lossy(format_version).into_owned(),
            ));
        }

        let (datagram_version, rest) = read_length_prefixed(rest)?;
        let (datagram_type, rest) = read_length_prefixed(rest)?;
        let (nonce, rest) = read_length_prefixed(rest)?;
        let (raw_header, rest) = read_length_prefixed(rest)?;
        if !rest.is_empty() {
            return Err(CryptoError::TrailingMetadataBytes);
        }

        let nonce: [u8; NONCE_SIZE] = nonce.try_into().map_err(|_| CryptoError::InvalidNonce)?;

        Ok(Self {
            datagram_version: decode_text(datagram_version, strict)?,
            datagram_type: decode_text(datagram_type, strict)?,
            nonce,
            raw_header: raw_header.to_vec(),
        })
    }
}

fn decode_text(bytes: &[u8], strict: bool) -> Result<String, CryptoError> {
    if strict {
        return String::from_utf8(bytes.to_vec())
            .map_err(|_| CryptoError::MissingOrMalformedHeader);
    }
    Ok(String::from_utf8_lossy(bytes).into_owned())
}
