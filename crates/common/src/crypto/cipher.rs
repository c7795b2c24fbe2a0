//! Record encryption using AES-256-GCM
//!
//! Each call to [`seal`] draws a fresh 12-byte nonce from the OS RNG. With a
//! single static key, random nonces are the accepted mitigation against reuse,
//! not a guarantee: after roughly 2^32 seals under one key the collision
//! probability stops being negligible. Rotate the key pair well before that.

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce, Tag};
use zeroize::Zeroize;

use super::derive::DerivedKey;
use crate::envelope::{Envelope, NONCE_SIZE, TAG_SIZE};
use crate::error::{Result, SealError};
use crate::record::{canonical_bytes, parse_record, Record};

/// Encrypt a record under `key`
///
/// The record is serialized canonically (sorted keys) so that sealing the
/// same logical record twice differs only by nonce. No associated data is
/// authenticated.
///
/// # Errors
///
/// Returns [`SealError::Rng`] if no nonce can be drawn.
pub fn seal(key: &DerivedKey, record: &Record) -> Result<Envelope> {
    let mut buffer = canonical_bytes(record)?;

    let mut nonce = [0u8; NONCE_SIZE];
    getrandom::getrandom(&mut nonce)
        .map_err(|e| SealError::Rng(format!("failed to generate nonce: {}", e)))?;

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.bytes()));
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(&nonce), b"", &mut buffer)
        .map_err(|_| {
            // Only reachable for plaintexts beyond the GCM length limit
            SealError::MalformedRecord("record too large to encrypt".to_string())
        })?;

    let mut tag_bytes = [0u8; TAG_SIZE];
    tag_bytes.copy_from_slice(tag.as_slice());

    tracing::debug!(ciphertext_len = buffer.len(), "sealed record");
    Ok(Envelope::new(buffer, nonce, tag_bytes))
}

/// Decrypt and authenticate an envelope under `key`
///
/// The tag is verified as part of decryption; on failure nothing decrypted
/// is returned or retained.
///
/// # Errors
///
/// - [`SealError::Integrity`] if the tag does not verify. A wrong key,
///   corrupted ciphertext and deliberate tampering are indistinguishable.
/// - [`SealError::MalformedRecord`] if the authenticated plaintext is not a
///   serialized record.
pub fn open(key: &DerivedKey, envelope: &Envelope) -> Result<Record> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.bytes()));
    let mut buffer = envelope.ciphertext().to_vec();

    if cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(envelope.nonce()),
            b"",
            &mut buffer,
            Tag::from_slice(envelope.tag()),
        )
        .is_err()
    {
        buffer.zeroize();
        tracing::warn!(
            ciphertext_len = envelope.ciphertext().len(),
            "envelope failed authentication"
        );
        return Err(SealError::Integrity);
    }

    let record = parse_record(&buffer);
    buffer.zeroize();
    tracing::debug!(ciphertext_len = envelope.ciphertext().len(), "opened envelope");
    record
}
