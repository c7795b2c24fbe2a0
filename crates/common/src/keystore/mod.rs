//! Ownership and persistence of the deployment's key pair
//!
//! A [`KeyStore`] hands out the one long-lived [`KeyPair`]. Whatever backs it,
//! the contract is the same: idempotent, and never silently replacing valid
//! material, since a new pair invalidates every envelope sealed before it.

mod env;
mod file;

pub use env::EnvKeyStore;
pub use file::FileKeyStore;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::crypto::KeyPair;
use crate::error::Result;

/// Default key file name, relative to the state directory
pub const DEFAULT_KEY_FILE_NAME: &str = "key.pem";

/// Source of the deployment's key pair
pub trait KeyStore: Send + Sync + std::fmt::Debug {
    /// Return the key pair, creating and persisting it first if the backend
    /// supports creation and none exists yet
    ///
    /// # Errors
    ///
    /// Returns [`crate::SealError::KeyStorage`] if existing material cannot be
    /// read or parsed, or new material cannot be persisted.
    fn get_or_create(&self) -> Result<KeyPair>;
}

/// Where the key pair lives and how it is protected
///
/// `file` keeps an unencrypted PKCS#8 PEM on disk and generates it on first
/// use. `env` reads the PEM from an environment variable, leaving protection
/// to whatever injects it (a secret manager, an orchestrator); it never
/// generates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KeyStoreConfig {
    File {
        /// Key file path; relative paths resolve against the state directory
        path: PathBuf,
    },
    Env {
        /// Name of the variable holding the PEM document
        var: String,
    },
}

impl Default for KeyStoreConfig {
    fn default() -> Self {
        KeyStoreConfig::File {
            path: PathBuf::from(DEFAULT_KEY_FILE_NAME),
        }
    }
}

impl KeyStoreConfig {
    /// Build the configured store, resolving relative paths against `base_dir`
    pub fn build(&self, base_dir: &Path) -> Arc<dyn KeyStore> {
        match self {
            KeyStoreConfig::File { path } => {
                Arc::new(FileKeyStore::new(resolve(base_dir, path)))
            }
            KeyStoreConfig::Env { var } => Arc::new(EnvKeyStore::new(var.clone())),
        }
    }

    /// Human readable location, for display
    pub fn describe(&self, base_dir: &Path) -> String {
        match self {
            KeyStoreConfig::File { path } => resolve(base_dir, path).display().to_string(),
            KeyStoreConfig::Env { var } => format!("${}", var),
        }
    }
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
