//! Symmetric key derivation from the long-lived key pair
//!
//! The derived key comes from an ECDH exchange between the key pair's
//! private key and *its own* public key, run through HKDF-SHA256 with a
//! fixed salt and info string.
//!
//! The self-exchange is a simplification standing in for a two-party key
//! agreement: it does not establish a secret with anyone else, it only
//! turns one persisted key pair into one stable AES key. Anyone holding the
//! private key can recompute it.

use std::fmt;

use hkdf::Hkdf;
use p256::ecdh::diffie_hellman;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::keys::KeyPair;
use crate::error::{Result, SealError};

/// Size of the derived AES-256 key in bytes
pub const DERIVED_KEY_SIZE: usize = 32;

/// Default HKDF salt. Not secret, but must never change for a deployment.
pub const DEFAULT_SALT: &str = "sealcid-static-salt";
/// Default HKDF info / context string
pub const DEFAULT_INFO: &str = "sealcid-record-envelope";

/// Fixed, non-secret HKDF inputs
///
/// Changing either value changes the derived key exactly like replacing the
/// key pair would.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivationContext {
    #[serde(default = "default_salt")]
    pub salt: String,
    #[serde(default = "default_info")]
    pub info: String,
}

fn default_salt() -> String {
    DEFAULT_SALT.to_string()
}

fn default_info() -> String {
    DEFAULT_INFO.to_string()
}

impl Default for DerivationContext {
    fn default() -> Self {
        Self {
            salt: default_salt(),
            info: default_info(),
        }
    }
}

impl DerivationContext {
    pub fn new(salt: impl Into<String>, info: impl Into<String>) -> Self {
        Self {
            salt: salt.into(),
            info: info.into(),
        }
    }
}

/// A 256-bit AES key derived from a [`KeyPair`]
///
/// Zeroed on drop. `Debug` output is redacted so the key never reaches a log.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; DERIVED_KEY_SIZE]);

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(<redacted>)")
    }
}

impl From<[u8; DERIVED_KEY_SIZE]> for DerivedKey {
    fn from(bytes: [u8; DERIVED_KEY_SIZE]) -> Self {
        DerivedKey(bytes)
    }
}

impl DerivedKey {
    /// Get a reference to the key bytes
    pub fn bytes(&self) -> &[u8; DERIVED_KEY_SIZE] {
        &self.0
    }
}

/// Derive the record key for `pair` under `ctx`
///
/// Pure and deterministic: the same pair and context always give the same
/// bytes, so every instance sharing the persisted pair can open what any
/// other instance sealed.
///
/// # Errors
///
/// Returns [`SealError::Derivation`] if HKDF rejects the requested length.
/// A validly generated P-256 pair cannot make the exchange itself fail.
pub fn derive_key(pair: &KeyPair, ctx: &DerivationContext) -> Result<DerivedKey> {
    let shared = diffie_hellman(pair.secret().to_nonzero_scalar(), pair.public().as_affine());

    let hk = Hkdf::<Sha256>::new(Some(ctx.salt.as_bytes()), shared.raw_secret_bytes().as_slice());
    let mut okm = [0u8; DERIVED_KEY_SIZE];
    hk.expand(ctx.info.as_bytes(), &mut okm)
        .map_err(|e| SealError::Derivation(format!("hkdf expand: {}", e)))?;

    let key = DerivedKey(okm);
    okm.zeroize();
    Ok(key)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        let pair = KeyPair::generate().unwrap();
        let ctx = DerivationContext::default();

        let a = derive_key(&pair, &ctx).unwrap();
        let b = derive_key(&pair, &ctx).unwrap();
        assert_eq!(a.bytes(), b.bytes());
    }

    #[test]
    fn test_derivation_survives_pem_round_trip() {
        let pair = KeyPair::generate().unwrap();
        let reloaded = KeyPair::from_pem(&pair.to_pem().unwrap()).unwrap();
        let ctx = DerivationContext::default();

        assert_eq!(
            derive_key(&pair, &ctx).unwrap(),
            derive_key(&reloaded, &ctx).unwrap()
        );
    }

    #[test]
    fn test_context_changes_key() {
        let pair = KeyPair::generate().unwrap();
        let base = derive_key(&pair, &DerivationContext::default()).unwrap();

        let other_salt = DerivationContext::new("another-salt", DEFAULT_INFO);
        let other_info = DerivationContext::new(DEFAULT_SALT, "another-info");

        assert_ne!(base, derive_key(&pair, &other_salt).unwrap());
        assert_ne!(base, derive_key(&pair, &other_info).unwrap());
    }

    #[test]
    fn test_different_pairs_give_different_keys() {
        let ctx = DerivationContext::default();
        let a = derive_key(&KeyPair::generate().unwrap(), &ctx).unwrap();
        let b = derive_key(&KeyPair::generate().unwrap(), &ctx).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = DerivedKey::from([7u8; DERIVED_KEY_SIZE]);
        assert_eq!(format!("{:?}", key), "DerivedKey(<redacted>)");
    }
}
