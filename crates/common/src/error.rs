//! Error types for sealing, opening and verifying records.

use crate::store::ContentIdentifier;

/// Errors that can occur anywhere in the seal / store / verify pipeline.
///
/// None of these are retried internally. Messages never carry plaintext
/// record content or key material.
#[derive(Debug, thiserror::Error)]
pub enum SealError {
    /// The persisted key pair could not be read, parsed or written
    #[error("key storage error: {0}")]
    KeyStorage(String),

    /// A cryptographic primitive rejected its input while deriving a key
    #[error("key derivation error: {0}")]
    Derivation(String),

    /// The operating system RNG failed to produce a nonce or key
    #[error("random number generator failure: {0}")]
    Rng(String),

    /// Authentication failed: wrong key, corrupted data or tampering
    #[error("verification failed")]
    Integrity,

    /// The envelope is missing a field or a field is not validly encoded
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// The decrypted bytes are not a serialized record
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// The content store has nothing under this identifier
    #[error("no content stored under {0}")]
    NotFound(ContentIdentifier),

    /// The content store itself failed
    #[error("content store error: {0}")]
    Storage(String),
}

impl SealError {
    /// Whether the error was caused by the shape of caller-supplied input,
    /// as opposed to tampering, a wrong key or an environment failure.
    pub fn is_client_input(&self) -> bool {
        matches!(
            self,
            SealError::MalformedEnvelope(_) | SealError::MalformedRecord(_)
        )
    }
}

/// Result type alias for sealing operations.
pub type Result<T> = std::result::Result<T, SealError>;
