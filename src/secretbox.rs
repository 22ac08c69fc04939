//! Tagged secret box: symmetric AEAD bound to a datagram's type and version.
//!
//! Encrypt:
//! 1. fresh 24-byte nonce from the OS RNG
//! 2. metadata = (version, type, nonce, serialized header)
//! 3. ciphertext = XChaCha20-Poly1305(key, nonce, body, aad = metadata record)
//! 4. envelope = lp(metadata record) || ciphertext
//!
//! Decrypt authenticates first, then checks type and version, then hands the
//! bytes back to the datagram. Nothing from the envelope is trusted before the
//! tag verifies.

use base64::{engine::general_purpose::STANDARD, Engine};
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};
use tracing::{debug, warn};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::aad::{AadMeta, ParsedMetadata};
use crate::constants::{KEY_SIZE, NONCE_SIZE};
use crate::datagram::Datagram;
use crate::errors::CryptoError;
use crate::typed_bytes::TypedBytes;
use crate::varint::{append_length_prefixed, MAX_VARINT_LEN};

/// A 32-byte XChaCha20-Poly1305 key, wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_SIZE]);

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let key: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| CryptoError::InvalidSecretKey)?;
        Ok(Self(key))
    }

    pub fn from_hex(key_hex: &str) -> Result<Self, CryptoError> {
        let bytes = Zeroizing::new(hex::decode(key_hex)?);
        Self::from_slice(&bytes)
    }

    pub fn from_base64(key_b64: &str) -> Result<Self, CryptoError> {
        let bytes = Zeroizing::new(STANDARD.decode(key_b64.trim())?);
        Self::from_slice(&bytes)
    }

    /// Generate a random key from the OS RNG.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut key = [0u8; KEY_SIZE];
        getrandom::getrandom(&mut key).map_err(|_| CryptoError::RandomnessUnavailable)?;
        Ok(Self(key))
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

/// Generate 24 random bytes for an XChaCha20-Poly1305 nonce.
///
/// Every encryption draws its nonce here; no API accepts a caller-chosen one.
fn random_nonce() -> Result<[u8; NONCE_SIZE], CryptoError> {
    let mut nonce = [0u8; NONCE_SIZE];
    getrandom::getrandom(&mut nonce).map_err(|_| CryptoError::RandomnessUnavailable)?;
    Ok(nonce)
}

/// A fully authenticated and validated decryption result.
#[derive(Debug, Clone, PartialEq)]
pub struct DecryptedDatagram<H, B> {
    pub metadata: AadMeta,
    pub header: H,
    pub body: B,
}

/// Symmetric envelope keyed once at construction.
///
/// Holds no mutable state, so one instance can serve any number of
/// concurrent encrypt/decrypt calls.
#[derive(Debug, Clone)]
pub struct TaggedSecretBox {
    key: SymmetricKey,
}

impl TaggedSecretBox {
    pub fn new(key: SymmetricKey) -> Self {
        Self { key }
    }

    pub fn from_base64_key(key_b64: &str) -> Result<Self, CryptoError> {
        Ok(Self::new(SymmetricKey::from_base64(key_b64)?))
    }

    fn cipher(&self) -> XChaCha20Poly1305 {
        XChaCha20Poly1305::new(self.key.as_bytes().into())
    }

    /// Encrypt `body` under this box's key, binding `header` and the
    /// datagram's type and version as associated data.
    pub fn encrypt<D: Datagram + ?Sized>(
        &self,
        datagram: &D,
        header: &D::Header,
        body: &D::Body,
    ) -> Result<TypedBytes, CryptoError> {
        let nonce_bytes = random_nonce()?;
        let version = datagram.version();
        let datagram_type = datagram.datagram_type();

        let raw_header = datagram.serialize_header(header, version)?;
        let plaintext = Zeroizing::new(datagram.serialize_body(body, version)?);

        let metadata = AadMeta::new(version, datagram_type, nonce_bytes, raw_header);
        let record = metadata.encode_record();

        let nonce = XNonce::from_slice(&nonce_bytes);
        let ciphertext = self
            .cipher()
            .encrypt(
                nonce,
                Payload {
                    msg: plaintext.as_slice(),
                    aad: &record,
                },
            )
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        // Pack: lp(record) + ciphertext
        let mut packed = Vec::with_capacity(MAX_VARINT_LEN + record.len() + ciphertext.len());
        append_length_prefixed(&mut packed, &record);
        packed.extend_from_slice(&ciphertext);

        debug!(
            datagram_type,
            version,
            plaintext_len = plaintext.len(),
            envelope_len = packed.len(),
            "sealed datagram"
        );
        Ok(TypedBytes::new(packed))
    }

    /// Encrypt and encode the envelope as standard base64.
    pub fn encrypt_to_text<D: Datagram + ?Sized>(
        &self,
        datagram: &D,
        header: &D::Header,
        body: &D::Body,
    ) -> Result<String, CryptoError> {
        Ok(self.encrypt(datagram, header, body)?.to_base64())
    }

    /// Authenticate and decrypt an envelope produced for `datagram`.
    ///
    /// Wrong key and tampered data both surface as `AuthenticationFailed`.
    pub fn decrypt<D: Datagram + ?Sized>(
        &self,
        datagram: &D,
        envelope: impl AsRef<[u8]>,
    ) -> Result<DecryptedDatagram<D::Header, D::Body>, CryptoError> {
        let ParsedMetadata {
            metadata,
            raw_metadata,
            content,
        } = AadMeta::deserialize(envelope.as_ref())?
            .ok_or(CryptoError::MissingOrMalformedHeader)?;

        let nonce = XNonce::from_slice(&metadata.nonce);
        let plaintext = self
            .cipher()
            .decrypt(
                nonce,
                Payload {
                    msg: content,
                    aad: raw_metadata,
                },
            )
            .map(Zeroizing::new)
            .map_err(|_| {
                debug!(
                    expected_type = datagram.datagram_type(),
                    envelope_len = envelope.as_ref().len(),
                    "envelope authentication failed"
                );
                CryptoError::AuthenticationFailed
            })?;

        if metadata.datagram_type != datagram.datagram_type() {
            warn!(
                expected = datagram.datagram_type(),
                found = %metadata.datagram_type,
                "datagram type mismatch"
            );
            return Err(CryptoError::TypeMismatch {
                expected: datagram.datagram_type().to_string(),
                found: metadata.datagram_type,
            });
        }

        if !datagram.accepts_version(&metadata.datagram_version) {
            let constraint = datagram.version_constraint().to_string();
            warn!(
                datagram_type = datagram.datagram_type(),
                version = %metadata.datagram_version,
                %constraint,
                "datagram version rejected"
            );
            return Err(CryptoError::VersionRejected {
                version: metadata.datagram_version,
                constraint,
            });
        }

        let header = datagram.deserialize_header(&metadata.raw_header, &metadata.datagram_version)?;
        let body = datagram.deserialize_body(&plaintext, &metadata.datagram_version)?;

        debug!(
            datagram_type = datagram.datagram_type(),
            version = %metadata.datagram_version,
            plaintext_len = plaintext.len(),
            "opened datagram"
        );
        Ok(DecryptedDatagram {
            metadata,
            header,
            body,
        })
    }

    /// Decode a base64 envelope and decrypt it.
    pub fn decrypt_from_text<D: Datagram + ?Sized>(
        &self,
        datagram: &D,
        text: &str,
    ) -> Result<DecryptedDatagram<D::Header, D::Body>, CryptoError> {
        let envelope = TypedBytes::from_base64(text)?;
        self.decrypt(datagram, &envelope)
    }
}

// --- Base64 key helpers ---

/// Generate a fresh symmetric key, returned as standard base64.
pub fn generate_symmetric_key() -> Result<String, CryptoError> {
    Ok(SymmetricKey::generate()?.to_base64())
}

/// Encrypt `body` with a default header under a base64 key. Returns the
/// base64 envelope.
pub fn encrypt_symmetric<D>(
    body: &D::Body,
    key_b64: &str,
    datagram: &D,
) -> Result<String, CryptoError>
where
    D: Datagram + ?Sized,
    D::Header: Default,
{
    let secret_box = TaggedSecretBox::from_base64_key(key_b64)?;
    secret_box.encrypt_to_text(datagram, &<D::Header as Default>::default(), body)
}

/// Decrypt a base64 envelope under a base64 key, returning only the body.
pub fn decrypt_symmetric<D>(text: &str, key_b64: &str, datagram: &D) -> Result<D::Body, CryptoError>
where
    D: Datagram + ?Sized,
{
    let secret_box = TaggedSecretBox::from_base64_key(key_b64)?;
    Ok(secret_box.decrypt_from_text(datagram, text)?.body)
}
