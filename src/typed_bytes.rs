//! Envelope bytes as they travel: `lp(metadata record) || ciphertext`.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::aad::AadMeta;
use crate::errors::CryptoError;

/// An encrypted envelope. Holds no key and cannot decrypt; it can only
/// report the metadata it claims to carry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypedBytes(Vec<u8>);

impl TypedBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read the metadata without a key.
    ///
    /// The result is unauthenticated: use it to pick a datagram, never to
    /// trust the payload. Returns `None` for anything that does not parse,
    /// including version or type bytes that are not UTF-8.
    pub fn inspect(&self) -> Option<AadMeta> {
        match AadMeta::deserialize_strict(&self.0) {
            Ok(Some(parsed)) => Some(parsed.metadata),
            Ok(None) | Err(_) => None,
        }
    }

    /// Standard base64 with padding.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    pub fn from_base64(text: &str) -> Result<Self, CryptoError> {
        Ok(Self(STANDARD.decode(text.trim())?))
    }
}

impl From<Vec<u8>> for TypedBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<TypedBytes> for Vec<u8> {
    fn from(bytes: TypedBytes) -> Self {
        bytes.0
    }
}

impl AsRef<[u8]> for TypedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// Serialized as a base64 string so envelopes embed cleanly in JSON documents.
impl Serialize for TypedBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for TypedBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_base64(&text).map_err(serde::de::Error::custom)
    }
}
