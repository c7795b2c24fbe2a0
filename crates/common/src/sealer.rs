//! Caller-facing sealing operations
//!
//! A [`Sealer`] is built once from the key store and holds the derived key
//! for the rest of its lifetime. It is cheap to clone and safe to share
//! across threads and tasks: the key is immutable after derivation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::crypto::{self, derive_key, DerivationContext, DerivedKey, KeyPair};
use crate::envelope::{decode, encode, Envelope, EnvelopeMap};
use crate::error::{Result, SealError};
use crate::integrity::{self, IntegrityDigest};
use crate::keystore::KeyStore;
use crate::record::Record;
use crate::store::{ContentIdentifier, ContentStore};

/// An encoded envelope plus the digest to record somewhere trusted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedRecord {
    pub envelope: EnvelopeMap,
    pub digest: IntegrityDigest,
}

/// A sealed record after it was handed to a content store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub cid: ContentIdentifier,
    pub digest: IntegrityDigest,
    pub envelope: EnvelopeMap,
}

#[derive(Clone)]
pub struct Sealer {
    key: Arc<DerivedKey>,
    fingerprint: Option<String>,
}

impl std::fmt::Debug for Sealer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sealer")
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

impl Sealer {
    /// Derive the record key from `pair`
    pub fn new(pair: &KeyPair, ctx: &DerivationContext) -> Result<Self> {
        Ok(Self {
            key: Arc::new(derive_key(pair, ctx)?),
            fingerprint: Some(pair.fingerprint()),
        })
    }

    /// Get (or create) the pair from `store` and derive the record key
    pub fn from_key_store(store: &dyn KeyStore, ctx: &DerivationContext) -> Result<Self> {
        let pair = store.get_or_create()?;
        Self::new(&pair, ctx)
    }

    /// Use an already derived key
    pub fn from_key(key: DerivedKey) -> Self {
        Self {
            key: Arc::new(key),
            fingerprint: None,
        }
    }

    /// Fingerprint of the public key the record key was derived from
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    pub fn seal(&self, record: &Record) -> Result<Envelope> {
        crypto::seal(&self.key, record)
    }

    pub fn open(&self, envelope: &Envelope) -> Result<Record> {
        crypto::open(&self.key, envelope)
    }

    /// Seal and encode a record, returning the envelope and its digest
    pub fn encrypt_record(&self, record: &Record) -> Result<SealedRecord> {
        let envelope = self.seal(record)?;
        Ok(SealedRecord {
            digest: integrity::digest(&envelope),
            envelope: encode(&envelope),
        })
    }

    /// Decode and open an encoded envelope
    pub fn decrypt_envelope(&self, envelope: &EnvelopeMap) -> Result<Record> {
        self.open(&decode(envelope)?)
    }

    /// Seal a record and put it in `store`
    pub async fn store_record<S>(&self, store: &S, record: &Record) -> Result<StoredRecord>
    where
        S: ContentStore + ?Sized,
    {
        let sealed = self.encrypt_record(record)?;
        let cid = store.put(&sealed.envelope).await?;
        tracing::info!(cid = %cid, digest = %sealed.digest, "stored sealed record");
        Ok(StoredRecord {
            cid,
            digest: sealed.digest,
            envelope: sealed.envelope,
        })
    }

    /// Check that `envelope` is the one a trusted digest and/or content
    /// identifier were recorded for
    ///
    /// Every binding that is given must match. An envelope with nothing to
    /// bind it is rejected.
    ///
    /// # Errors
    ///
    /// [`SealError::Integrity`] on any mismatch, or if both are `None`.
    pub fn verify_envelope(
        &self,
        envelope: &Envelope,
        digest: Option<&IntegrityDigest>,
        cid: Option<&ContentIdentifier>,
    ) -> Result<()> {
        if digest.is_none() && cid.is_none() {
            tracing::warn!("no digest or identifier to verify the envelope against");
            return Err(SealError::Integrity);
        }
        if let Some(expected) = digest {
            if !integrity::verify(expected, envelope) {
                tracing::warn!(expected = %expected, "envelope digest mismatch");
                return Err(SealError::Integrity);
            }
        }
        if let Some(cid) = cid {
            if !integrity::verify_identifier(cid, envelope) {
                tracing::warn!(cid = %cid, "envelope does not hash to its identifier");
                return Err(SealError::Integrity);
            }
        }
        Ok(())
    }

    /// Fetch an envelope by identifier, prove it unchanged, then open it
    ///
    /// With a `trusted` digest (one recorded out of band at seal time) the
    /// fetched envelope's digest must match it exactly. Without one, `id` must
    /// be content-derived and is recomputed from the fetched envelope instead.
    ///
    /// # Errors
    ///
    /// - [`SealError::NotFound`] / [`SealError::Storage`] from the store
    /// - [`SealError::MalformedEnvelope`] if the stored map does not decode
    /// - [`SealError::Integrity`] on a digest or identifier mismatch, or if
    ///   the tag does not verify
    pub async fn fetch_verified<S>(
        &self,
        store: &S,
        id: &ContentIdentifier,
        trusted: Option<&IntegrityDigest>,
    ) -> Result<Record>
    where
        S: ContentStore + ?Sized,
    {
        let envelope = decode(&store.get(id).await?)?;

        match trusted {
            Some(expected) => self.verify_envelope(&envelope, Some(expected), None)?,
            None => self.verify_envelope(&envelope, None, Some(id))?,
        }

        self.open(&envelope)
    }
}
