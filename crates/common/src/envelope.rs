//! Encrypted record envelopes and their text encoding
//!
//! Storage collaborators and transports are text/JSON oriented, so the three
//! byte fields of an [`Envelope`] travel as standard base64 strings:
//!
//! ```text
//! { "ciphertext": "<base64>", "nonce": "<base64, 12 bytes>", "tag": "<base64, 16 bytes>" }
//! ```
//!
//! Older producers called the nonce `iv`; [`decode`] accepts either name.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{Result, SealError};

/// Size of the AES-GCM nonce in bytes
pub const NONCE_SIZE: usize = 12;
/// Size of the AES-GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

pub const CIPHERTEXT_FIELD: &str = "ciphertext";
pub const NONCE_FIELD: &str = "nonce";
pub const TAG_FIELD: &str = "tag";
const LEGACY_NONCE_FIELD: &str = "iv";

/// Text form of an envelope, keyed by field name
///
/// A `BTreeMap` so serialization order is always sorted.
pub type EnvelopeMap = BTreeMap<String, String>;

/// Ciphertext, nonce and authentication tag produced by one seal operation
///
/// Immutable once built. The nonce is single-use: every seal draws a fresh one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    ciphertext: Vec<u8>,
    nonce: [u8; NONCE_SIZE],
    tag: [u8; TAG_SIZE],
}

impl Envelope {
    pub fn new(ciphertext: Vec<u8>, nonce: [u8; NONCE_SIZE], tag: [u8; TAG_SIZE]) -> Self {
        Self {
            ciphertext,
            nonce,
            tag,
        }
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn nonce(&self) -> &[u8; NONCE_SIZE] {
        &self.nonce
    }

    pub fn tag(&self) -> &[u8; TAG_SIZE] {
        &self.tag
    }

    /// Encode to the JSON text transported and stored by callers
    pub fn to_json(&self) -> String {
        // A map of strings always serializes
        serde_json::to_string(&encode(self)).unwrap_or_default()
    }

    /// Parse the JSON text produced by [`Envelope::to_json`]
    pub fn from_json(json: &str) -> Result<Self> {
        let map: EnvelopeMap = serde_json::from_str(json)
            .map_err(|e| SealError::MalformedEnvelope(format!("invalid envelope JSON: {}", e)))?;
        decode(&map)
    }
}

/// Encode an envelope into its text map
pub fn encode(envelope: &Envelope) -> EnvelopeMap {
    let mut map = EnvelopeMap::new();
    map.insert(CIPHERTEXT_FIELD.to_string(), STANDARD.encode(&envelope.ciphertext));
    map.insert(NONCE_FIELD.to_string(), STANDARD.encode(envelope.nonce));
    map.insert(TAG_FIELD.to_string(), STANDARD.encode(envelope.tag));
    map
}

/// Decode a text map back into an envelope, byte for byte
///
/// # Errors
///
/// Returns [`SealError::MalformedEnvelope`] naming the offending field if a
/// field is missing, is not valid base64, or has the wrong length.
pub fn decode(map: &EnvelopeMap) -> Result<Envelope> {
    let ciphertext = decode_field(map, CIPHERTEXT_FIELD)?;

    let nonce_field = if !map.contains_key(NONCE_FIELD) && map.contains_key(LEGACY_NONCE_FIELD) {
        LEGACY_NONCE_FIELD
    } else {
        NONCE_FIELD
    };
    let nonce = fixed::<NONCE_SIZE>(nonce_field, decode_field(map, nonce_field)?)?;
    let tag = fixed::<TAG_SIZE>(TAG_FIELD, decode_field(map, TAG_FIELD)?)?;

    Ok(Envelope::new(ciphertext, nonce, tag))
}

fn decode_field(map: &EnvelopeMap, field: &str) -> Result<Vec<u8>> {
    let text = map
        .get(field)
        .ok_or_else(|| SealError::MalformedEnvelope(format!("missing field `{}`", field)))?;
    STANDARD
        .decode(text.trim())
        .map_err(|e| SealError::MalformedEnvelope(format!("field `{}` is not base64: {}", field, e)))
}

fn fixed<const N: usize>(field: &str, bytes: Vec<u8>) -> Result<[u8; N]> {
    bytes.try_into().map_err(|bytes: Vec<u8>| {
        SealError::MalformedEnvelope(format!(
            "field `{}` must be {} bytes, got {}",
            field,
            N,
            bytes.len()
        ))
    })
}
