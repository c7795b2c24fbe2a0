//! Cryptographic primitives for sealcid
//!
//! This module provides the cryptographic core of the record sealing scheme:
//!
//! - **Key Pair**: one long-lived P-256 key pair per deployment, PEM encoded
//! - **Key Derivation**: self-ECDH plus HKDF-SHA256 into a 32-byte AES key
//! - **Encryption**: AES-256-GCM over canonical JSON records
//!
//! # Security Model
//!
//! ## Key Pair
//! The pair is generated once and persisted by a [`crate::keystore::KeyStore`].
//! Every record key is derived from it, so losing or replacing it makes all
//! existing envelopes unreadable.
//!
//! ## Key Derivation
//! The key pair is exchanged against its own public key. This is a
//! simplification in place of a real two-party handshake: it yields a stable
//! key for the holder of the private key and nothing more. Salt and info are
//! fixed per deployment, which makes derivation deterministic across
//! processes and restarts.
//!
//! ## Record Encryption
//! Each seal uses a fresh random 96-bit nonce and produces a detached 128-bit
//! tag. Opening verifies the tag before any plaintext is released.

mod cipher;
mod derive;
mod keys;

pub use cipher::{open, seal};
pub use derive::{
    derive_key, DerivationContext, DerivedKey, DEFAULT_INFO, DEFAULT_SALT, DERIVED_KEY_SIZE,
};
pub use keys::{KeyPair, COMPRESSED_PUBLIC_KEY_SIZE, PRIVATE_KEY_SIZE};
