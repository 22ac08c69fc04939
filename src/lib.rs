//! # datagram-crypto
//!
//! Typed, versioned authenticated-encryption envelopes.
//!
//! A payload type is described once by a [`Datagram`] (type tag, schema
//! version, version constraint, header/body serializers). [`TaggedSecretBox`]
//! encrypts payloads under a symmetric key and binds the datagram's type,
//! version and header to the ciphertext as associated data, so a ciphertext
//! can never be decrypted as a different payload type or an unreadable
//! schema version.
//!
//! ## Security Design
//!
//! - XChaCha20-Poly1305 with a fresh OS-random 24-byte nonce per message
//! - The metadata record is authenticated before any of its fields are trusted
//! - Wrong key and tampered data are indistinguishable to the caller
//! - Key material uses `Zeroize` on drop
//!
//! ## Wire format
//!
//! ```text
//! envelope = lp(record) || ciphertext
//! record   = lp("0.2.0") || lp(version) || lp(type) || lp(nonce) || lp(header)
//! lp(x)    = uleb128(len(x)) || x
//! ```

pub mod constants;
pub mod varint;
pub mod aad;
pub mod datagram;
pub mod secretbox;
pub mod typed_bytes;
pub mod errors;

#[cfg(test)]
mod proptests;

// Re-export core types
pub use constants::*;
pub use aad::{AadMeta, ParsedMetadata};
pub use datagram::{BytesDatagram, Datagram, JsonDatagram, Version, VersionConstraint};
pub use secretbox::{
    decrypt_symmetric, encrypt_symmetric, generate_symmetric_key, DecryptedDatagram, SymmetricKey,
    TaggedSecretBox,
};
pub use typed_bytes::TypedBytes;
pub use errors::CryptoError;
