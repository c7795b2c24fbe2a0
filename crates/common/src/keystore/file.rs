use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use parking_lot::Mutex;

use super::KeyStore;
use crate::crypto::KeyPair;
use crate::error::{Result, SealError};

/// Key store backed by a single PEM file
///
/// The first call against a missing file generates a pair and publishes it
/// with an atomic create-if-absent (temp file, then a no-clobber rename in
/// the same directory). When several threads or processes race on an empty
/// store, exactly one publish succeeds; every loser drops its own pair and
/// loads the winner's, so all callers end up with the same material.
///
/// Once loaded the pair is cached and further calls never touch the lock or
/// the disk.
#[derive(Debug)]
pub struct FileKeyStore {
    path: PathBuf,
    cached: OnceLock<KeyPair>,
    init: Mutex<()>,
}

impl FileKeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Option<KeyPair>> {
        match fs::read_to_string(&self.path) {
            Ok(pem) => KeyPair::from_pem(&pem).map(Some).map_err(|e| match e {
                SealError::KeyStorage(msg) => {
                    SealError::KeyStorage(format!("{}: {}", self.path.display(), msg))
                }
                other => other,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error("failed to read key file", e)),
        }
    }

    fn create(&self) -> Result<KeyPair> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| self.io_error("failed to create key directory", e))?;

        let pair = KeyPair::generate()?;
        let pem = pair.to_pem()?;

        // Temp files are created 0600 on unix
        let mut tmp = tempfile::Builder::new()
            .prefix(".key-")
            .suffix(".tmp")
            .tempfile_in(&dir)
            .map_err(|e| self.io_error("failed to create temp key file", e))?;
        tmp.write_all(pem.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| self.io_error("failed to write key file", e))?;

        match tmp.persist_noclobber(&self.path) {
            Ok(_) => {
                tracing::info!(
                    path = %self.path.display(),
                    fingerprint = %pair.fingerprint(),
                    "generated new key pair"
                );
                Ok(pair)
            }
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                tracing::debug!(
                    path = %self.path.display(),
                    "key file appeared concurrently, loading it instead"
                );
                self.load()?.ok_or_else(|| {
                    SealError::KeyStorage(format!(
                        "{}: key file vanished after concurrent creation",
                        self.path.display()
                    ))
                })
            }
            Err(e) => Err(self.io_error("failed to publish key file", e.error)),
        }
    }

    fn io_error(&self, context: &str, e: std::io::Error) -> SealError {
        SealError::KeyStorage(format!("{} {}: {}", context, self.path.display(), e))
    }
}

impl KeyStore for FileKeyStore {
    fn get_or_create(&self) -> Result<KeyPair> {
        if let Some(pair) = self.cached.get() {
            return Ok(pair.clone());
        }

        let _guard = self.init.lock();
        if let Some(pair) = self.cached.get() {
            return Ok(pair.clone());
        }

        let pair = match self.load()? {
            Some(pair) => {
                tracing::debug!(
                    path = %self.path.display(),
                    fingerprint = %pair.fingerprint(),
                    "loaded key pair"
                );
                pair
            }
            None => self.create()?,
        };

        Ok(self.cached.get_or_init(|| pair).clone())
    }
}
