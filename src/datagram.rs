//! Datagram descriptors: the per-payload-type capability bundle.
//!
//! A datagram names a payload type, declares its schema version, says which
//! encrypted versions it can still read, and knows how to turn its header and
//! body into bytes. The envelope never looks inside those bytes; it only binds
//! the type tag and version to the ciphertext.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::CryptoError;

/// A `MAJOR.MINOR.PATCH` schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self { major, minor, patch }
    }

    /// Parse a strict `MAJOR.MINOR.PATCH` string (no pre-release or build
    /// suffix, no leading zeros).
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split('.');
        let major = parse_component(parts.next()?)?;
        let minor = parse_component(parts.next()?)?;
        let patch = parse_component(parts.next()?)?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { major, minor, patch })
    }
}

fn parse_component(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if s.len() > 1 && s.starts_with('0') {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Which payload versions a datagram will decrypt.
///
/// Accepted syntax:
/// - `*`: any well-formed version
/// - `1.*`: same major
/// - `0.1.*`: same major and minor
/// - `^1.2.3`: same major and at least 1.2.3; for major 0, the minor must match too
/// - `1.2.3`: exactly that version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionConstraint {
    Any,
    Major(u64),
    MajorMinor(u64, u64),
    Caret(Version),
    Exact(Version),
}

impl VersionConstraint {
    pub fn parse(s: &str) -> Result<Self, CryptoError> {
        let invalid = || CryptoError::InvalidVersionConstraint(s.to_string());
        let trimmed = s.trim();

        if trimmed == "*" {
            return Ok(Self::Any);
        }
        if let Some(base) = trimmed.strip_prefix('^') {
            return Version::parse(base).map(Self::Caret).ok_or_else(invalid);
        }
        if let Some(prefix) = trimmed.strip_suffix(".*") {
            let mut parts = prefix.split('.');
            let major = parts.next().and_then(parse_component).ok_or_else(invalid)?;
            return match parts.next() {
                None => Ok(Self::Major(major)),
                Some(minor) => {
                    let minor = parse_component(minor).ok_or_else(invalid)?;
                    if parts.next().is_some() {
                        return Err(invalid());
                    }
                    Ok(Self::MajorMinor(major, minor))
                }
            };
        }
        Version::parse(trimmed).map(Self::Exact).ok_or_else(invalid)
    }

    /// Test a version string. Anything that is not a well-formed version is rejected.
    pub fn matches(&self, candidate: &str) -> bool {
        Version::parse(candidate).is_some_and(|v| self.matches_version(&v))
    }

    pub fn matches_version(&self, v: &Version) -> bool {
        match self {
            Self::Any => true,
            Self::Major(major) => v.major == *major,
            Self::MajorMinor(major, minor) => v.major == *major && v.minor == *minor,
            Self::Caret(base) => {
                v.major == base.major
                    && (base.major != 0 || v.minor == base.minor)
                    && v >= base
            }
            Self::Exact(exact) => v == exact,
        }
    }
}

impl FromStr for VersionConstraint {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Major(major) => write!(f, "{major}.*"),
            Self::MajorMinor(major, minor) => write!(f, "{major}.{minor}.*"),
            Self::Caret(base) => write!(f, "^{base}"),
            Self::Exact(exact) => write!(f, "{exact}"),
        }
    }
}

/// Descriptor for one payload type.
///
/// Implementations must be deterministic, and each `deserialize_*` must
/// invert the matching `serialize_*` for the same version. The declared
/// [`version`](Datagram::version) must satisfy the datagram's own constraint,
/// since that constraint is what decryption checks the embedded version against.
pub trait Datagram {
    type Header;
    type Body;

    /// Stable type tag. This is the only thing preventing a ciphertext of one
    /// payload type from being decrypted as another.
    fn datagram_type(&self) -> &str;

    /// Schema version written into new envelopes.
    fn version(&self) -> &str;

    fn version_constraint(&self) -> &VersionConstraint;

    fn accepts_version(&self, version: &str) -> bool {
        self.version_constraint().matches(version)
    }

    fn serialize_header(
        &self,
        header: &Self::Header,
        version: &str,
    ) -> Result<Vec<u8>, CryptoError>;

    fn deserialize_header(&self, bytes: &[u8], version: &str)
        -> Result<Self::Header, CryptoError>;

    fn serialize_body(&self, body: &Self::Body, version: &str) -> Result<Vec<u8>, CryptoError>;

    fn deserialize_body(&self, bytes: &[u8], version: &str) -> Result<Self::Body, CryptoError>;
}

/// Check the invariants every descriptor must hold before it is used.
fn validate_descriptor(
    datagram_type: &str,
    version: &str,
    constraint: &VersionConstraint,
) -> Result<(), CryptoError> {
    if datagram_type.is_empty() {
        return Err(CryptoError::InvalidDatagram("empty type tag".into()));
    }
    if Version::parse(version).is_none() {
        return Err(CryptoError::InvalidDatagram(format!(
            "{datagram_type}: version {version:?} is not MAJOR.MINOR.PATCH"
        )));
    }
    if !constraint.matches(version) {
        return Err(CryptoError::InvalidDatagram(format!(
            "{datagram_type}: version {version} does not satisfy its own constraint {constraint}"
        )));
    }
    Ok(())
}

/// Datagram whose header and body are JSON documents.
pub struct JsonDatagram<H, B> {
    datagram_type: String,
    version: String,
    constraint: VersionConstraint,
    _marker: PhantomData<fn() -> (H, B)>,
}

impl<H, B> JsonDatagram<H, B> {
    pub fn new(
        datagram_type: impl Into<String>,
        version: impl Into<String>,
        constraint: &str,
    ) -> Result<Self, CryptoError> {
        let datagram_type = datagram_type.into();
        let version = version.into();
        let constraint = VersionConstraint::parse(constraint)?;
        validate_descriptor(&datagram_type, &version, &constraint)?;
        Ok(Self {
            datagram_type,
            version,
            constraint,
            _marker: PhantomData,
        })
    }
}

impl<H, B> Clone for JsonDatagram<H, B> {
    fn clone(&self) -> Self {
        Self {
            datagram_type: self.datagram_type.clone(),
            version: self.version.clone(),
            constraint: self.constraint.clone(),
            _marker: PhantomData,
        }
    }
}

impl<H, B> fmt::Debug for JsonDatagram<H, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonDatagram")
            .field("datagram_type", &self.datagram_type)
            .field("version", &self.version)
            .field("constraint", &self.constraint)
            .finish()
    }
}

impl<H, B> Datagram for JsonDatagram<H, B>
where
    H: Serialize + DeserializeOwned,
    B: Serialize + DeserializeOwned,
{
    type Header = H;
    type Body = B;

    fn datagram_type(&self) -> &str {
        &self.datagram_type
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn version_constraint(&self) -> &VersionConstraint {
        &self.constraint
    }

    fn serialize_header(&self, header: &H, _version: &str) -> Result<Vec<u8>, CryptoError> {
        Ok(serde_json::to_vec(header)?)
    }

    fn deserialize_header(&self, bytes: &[u8], _version: &str) -> Result<H, CryptoError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn serialize_body(&self, body: &B, _version: &str) -> Result<Vec<u8>, CryptoError> {
        Ok(serde_json::to_vec(body)?)
    }

    fn deserialize_body(&self, bytes: &[u8], _version: &str) -> Result<B, CryptoError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Datagram carrying opaque bytes and no header.
#[derive(Debug, Clone)]
pub struct BytesDatagram {
    datagram_type: String,
    version: String,
    constraint: VersionConstraint,
}

impl BytesDatagram {
    pub fn new(
        datagram_type: impl Into<String>,
        version: impl Into<String>,
        constraint: &str,
    ) -> Result<Self, CryptoError> {
        let datagram_type = datagram_type.into();
        let version = version.into();
        let constraint = VersionConstraint::parse(constraint)?;
        validate_descriptor(&datagram_type, &version, &constraint)?;
        Ok(Self {
            datagram_type,
            version,
            constraint,
        })
    }
}

impl Datagram for BytesDatagram {
    type Header = ();
    type Body = Vec<u8>;

    fn datagram_type(&self) -> &str {
        &self.datagram_type
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn version_constraint(&self) -> &VersionConstraint {
        &self.constraint
    }

    fn serialize_header(&self, _header: &(), _version: &str) -> Result<Vec<u8>, CryptoError> {
        Ok(Vec::new())
    }

    fn deserialize_header(&self, bytes: &[u8], _version: &str) -> Result<(), CryptoError> {
        if !bytes.is_empty() {
            return Err(CryptoError::Serialization(format!(
                "{}: expected an empty header, found {} bytes",
                self.datagram_type,
                bytes.len()
            )));
        }
        Ok(())
    }

    fn serialize_body(&self, body: &Vec<u8>, _version: &str) -> Result<Vec<u8>, CryptoError> {
        Ok(body.clone())
    }

    fn deserialize_body(&self, bytes: &[u8], _version: &str) -> Result<Vec<u8>, CryptoError> {
        Ok(bytes.to_vec())
    }
}
