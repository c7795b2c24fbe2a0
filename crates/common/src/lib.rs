/**
 * Cryptographic types and operations.
 *  - P-256 key pair and PEM encoding
 *  - Self-exchange key derivation
 *  - AES-256-GCM record sealing
 */
pub mod crypto;
/**
 * Envelope type and its base64 text map codec.
 */
pub mod envelope;
pub mod error;
/**
 * Digests and content identifiers that bind
 *  an envelope to what was originally stored.
 */
pub mod integrity;
/**
 * Persistence of the single long-lived key pair.
 */
pub mod keystore;
pub mod record;
/**
 * The caller-facing operations, tying the
 *  pieces above together.
 */
pub mod sealer;
/**
 * Seam to the content-addressed storage collaborator.
 */
pub mod store;

pub use error::{Result, SealError};

pub mod prelude {
    pub use crate::crypto::{DerivationContext, KeyPair};
    pub use crate::envelope::{Envelope, EnvelopeMap};
    pub use crate::error::SealError;
    pub use crate::integrity::IntegrityDigest;
    pub use crate::keystore::{KeyStore, KeyStoreConfig};
    pub use crate::record::Record;
    pub use crate::sealer::{SealedRecord, Sealer, StoredRecord};
    pub use crate::store::{ContentIdentifier, ContentStore, MemoryContentStore};
}
