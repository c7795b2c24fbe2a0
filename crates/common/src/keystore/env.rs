use std::sync::OnceLock;

use super::KeyStore;
use crate::crypto::KeyPair;
use crate::error::{Result, SealError};

/// Key store reading a PEM document from an environment variable
///
/// Load-only: this store never generates a pair, since it cannot persist
/// one. Provisioning and protecting the key is the job of whatever sets the
/// variable.
#[derive(Debug)]
pub struct EnvKeyStore {
    var: String,
    cached: OnceLock<KeyPair>,
}

impl EnvKeyStore {
    pub fn new(var: impl Into<String>) -> Self {
        Self {
            var: var.into(),
            cached: OnceLock::new(),
        }
    }
}

impl KeyStore for EnvKeyStore {
    fn get_or_create(&self) -> Result<KeyPair> {
        if let Some(pair) = self.cached.get() {
            return Ok(pair.clone());
        }

        let pem = std::env::var(&self.var).map_err(|e| {
            SealError::KeyStorage(format!("key variable ${} unavailable: {}", self.var, e))
        })?;
        let pair = KeyPair::from_pem(&pem)
            .map_err(|e| SealError::KeyStorage(format!("key variable ${}: {}", self.var, e)))?;

        tracing::debug!(var = %self.var, fingerprint = %pair.fingerprint(), "loaded key pair");
        // Parsing is deterministic, so a racing initializer stored the same pair
        Ok(self.cached.get_or_init(|| pair).clone())
    }
}
