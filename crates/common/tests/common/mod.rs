//! Shared test utilities for sealing integration tests
#![allow(dead_code)]

use common::crypto::{DerivationContext, KeyPair};
use common::keystore::{FileKeyStore, KeyStore};
use common::record::Record;
use common::sealer::Sealer;
use serde_json::Value;
use tempfile::TempDir;

/// Set up a key store in a fresh directory and a sealer derived from it
pub fn setup_test_env() -> (Sealer, FileKeyStore, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = FileKeyStore::new(temp_dir.path().join("key.pem"));
    let sealer = Sealer::from_key_store(&store, &DerivationContext::default()).unwrap();
    (sealer, store, temp_dir)
}

/// A sealer over a throwaway key pair
pub fn random_sealer() -> Sealer {
    Sealer::new(&KeyPair::generate().unwrap(), &DerivationContext::default()).unwrap()
}

pub fn record(value: Value) -> Record {
    value.as_object().cloned().expect("test records are JSON objects")
}

/// Whether two stores hand out the same key material
pub fn same_key(a: &dyn KeyStore, b: &dyn KeyStore) -> bool {
    a.get_or_create().unwrap().to_pem().unwrap() == b.get_or_create().unwrap().to_pem().unwrap()
}
