//! Binding envelopes to digests and content identifiers
//!
//! Both the [`IntegrityDigest`] and the derived [`ContentIdentifier`] hash the
//! same bytes: the compact JSON of the encoded envelope map, keys sorted. The
//! whole envelope is covered, so swapping a nonce or tag is caught just like
//! editing the ciphertext.
//!
//! Typical use is "fetch by identifier, recompute, compare against a digest
//! recorded somewhere trusted". When the identifier was itself derived from
//! the content, [`verify_identifier`] is that same check.

use std::fmt;
use std::str::FromStr;

use cid::Cid;
use multihash::Multihash;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::envelope::{encode, Envelope};
use crate::error::SealError;
use crate::store::ContentIdentifier;

/// Size of a SHA-256 digest in bytes
pub const DIGEST_SIZE: usize = 32;

/// Multicodec code for raw binary content
const RAW_CODEC: u64 = 0x55;
/// Multihash code for sha2-256
const SHA2_256_CODE: u64 = 0x12;

/// SHA-256 over the canonical encoded envelope
///
/// Rendered as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntegrityDigest([u8; DIGEST_SIZE]);

impl IntegrityDigest {
    pub fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a hex digest; accepts an optional "0x" prefix
    pub fn from_hex(hex: &str) -> Result<Self, SealError> {
        let hex = hex.trim();
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let mut buff = [0u8; DIGEST_SIZE];
        hex::decode_to_slice(hex, &mut buff)
            .map_err(|e| SealError::MalformedEnvelope(format!("invalid digest: {}", e)))?;
        Ok(Self(buff))
    }
}

impl From<[u8; DIGEST_SIZE]> for IntegrityDigest {
    fn from(bytes: [u8; DIGEST_SIZE]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for IntegrityDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IntegrityDigest({})", self.to_hex())
    }
}

impl fmt::Display for IntegrityDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for IntegrityDigest {
    type Err = SealError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for IntegrityDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for IntegrityDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// The exact bytes hashed by [`digest`] and [`content_identifier`]
pub fn canonical_envelope_bytes(envelope: &Envelope) -> Vec<u8> {
    envelope.to_json().into_bytes()
}

/// Compute the integrity digest of an envelope
pub fn digest(envelope: &Envelope) -> IntegrityDigest {
    IntegrityDigest(Sha256::digest(canonical_envelope_bytes(envelope)).into())
}

/// Recompute the digest of `envelope` and compare it to `expected`
///
/// Exact equality over all 32 bytes. The digest is not secret, so the
/// comparison does not need to be constant time.
pub fn verify(expected: &IntegrityDigest, envelope: &Envelope) -> bool {
    digest(envelope) == *expected
}

/// Derive a CIDv1 (raw codec, sha2-256) identifying the envelope's content
pub fn content_identifier(envelope: &Envelope) -> Result<ContentIdentifier, SealError> {
    let d = digest(envelope);
    let mh = Multihash::<64>::wrap(SHA2_256_CODE, d.as_bytes())
        .map_err(|e| SealError::Storage(format!("failed to build multihash: {}", e)))?;
    Ok(ContentIdentifier::from(Cid::new_v1(RAW_CODEC, mh)))
}

/// Recompute the content identifier of `envelope` and compare it to `expected`
pub fn verify_identifier(expected: &ContentIdentifier, envelope: &Envelope) -> bool {
    content_identifier(envelope).is_ok_and(|id| id == *expected)
}
