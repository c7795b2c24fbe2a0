//! Seam to the content-addressed storage collaborator
//!
//! The backend itself (IPFS, an object store, ...) lives outside this crate.
//! It only has to put an encoded envelope and hand back an opaque identifier,
//! and later return the same envelope for that identifier.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use cid::Cid;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::envelope::{decode, EnvelopeMap};
use crate::error::{Result, SealError};
use crate::integrity::content_identifier;

/// Opaque handle a content store returns for a stored envelope
///
/// Usually a CID, but nothing here depends on that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentIdentifier(String);

impl ContentIdentifier {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentIdentifier {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.trim().to_string()))
    }
}

impl From<Cid> for ContentIdentifier {
    fn from(cid: Cid) -> Self {
        Self(cid.to_string())
    }
}

/// Put/get access to a content-addressed store of encoded envelopes
#[async_trait]
pub trait ContentStore: Send + Sync + fmt::Debug {
    /// Store an encoded envelope, returning its identifier
    async fn put(&self, envelope: &EnvelopeMap) -> Result<ContentIdentifier>;

    /// Fetch the encoded envelope stored under `id`
    ///
    /// Should fail with [`SealError::NotFound`] if nothing is stored there.
    async fn get(&self, id: &ContentIdentifier) -> Result<EnvelopeMap>;
}

/// In-memory content store keyed by derived CIDs
///
/// Identifiers are computed with [`content_identifier`], so storing the same
/// envelope twice returns the same identifier. Meant for tests and for
/// embedding; not durable.
#[derive(Debug, Clone, Default)]
pub struct MemoryContentStore {
    inner: Arc<RwLock<HashMap<ContentIdentifier, EnvelopeMap>>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Overwrite whatever is stored under `id`, bypassing addressing
    ///
    /// Lets tests play a misbehaving or compromised backend.
    pub fn replace(&self, id: &ContentIdentifier, envelope: EnvelopeMap) {
        self.inner.write().insert(id.clone(), envelope);
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn put(&self, envelope: &EnvelopeMap) -> Result<ContentIdentifier> {
        let id = content_identifier(&decode(envelope)?)?;
        self.inner.write().insert(id.clone(), envelope.clone());
        tracing::debug!(cid = %id, "stored envelope");
        Ok(id)
    }

    async fn get(&self, id: &ContentIdentifier) -> Result<EnvelopeMap> {
        self.inner
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| SealError::NotFound(id.clone()))
    }
}
