//! Error types for datagram-crypto operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Malformed length prefix: truncated varint or length exceeds buffer")]
    MalformedLength,

    #[error("Unrecognized metadata format version: {0:?}")]
    UnrecognizedMetadataVersion(String),

    #[error("Metadata record has trailing bytes after the last field")]
    TrailingMetadataBytes,

    #[error("Missing or malformed envelope header")]
    MissingOrMalformedHeader,

    #[error("Decryption failed: authentication tag mismatch")]
    AuthenticationFailed,

    #[error("Datagram type mismatch: expected {expected:?}, found {found:?}")]
    TypeMismatch { expected: String, found: String },

    #[error("Datagram version {version:?} rejected by constraint {constraint:?}")]
    VersionRejected { version: String, constraint: String },

    #[error("Invalid nonce length: expected 24 bytes")]
    InvalidNonce,

    #[error("Invalid secret key: must be 32 bytes")]
    InvalidSecretKey,

    #[error("Invalid datagram descriptor: {0}")]
    InvalidDatagram(String),

    #[error("Invalid version constraint: {0:?}")]
    InvalidVersionConstraint(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("OS randomness source unavailable")]
    RandomnessUnavailable,

    #[error("Datagram serialization failed: {0}")]
    Serialization(String),

    #[error("Invalid hex encoding: {0}")]
    HexError(#[from] hex::FromHexError),

    #[error("Invalid base64 encoding: {0}")]
    Base64Error(#[from] base64::DecodeError),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}
