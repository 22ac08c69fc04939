//! Wire-format constants for the tagged envelope.
//!
//! RULES:
//! 1. `METADATA_FORMAT_VERSION` changes whenever the metadata record layout changes
//! 2. A reader accepts exactly one format version; there is no fallback parsing
//! 3. These MUST be identical across every platform that reads or writes envelopes

/// Version of the metadata record layout embedded in every envelope.
pub const METADATA_FORMAT_VERSION: &str = "0.2.0";

/// XChaCha20-Poly1305 key length.
pub const KEY_SIZE: usize = 32;

/// XChaCha20-Poly1305 nonce length.
pub const NONCE_SIZE: usize = 24;

/// Poly1305 authentication tag length.
pub const TAG_SIZE: usize = 16;
