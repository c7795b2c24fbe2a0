//! Integration tests for tamper and wrong-key detection

mod common;

use ::common::envelope::{self, Envelope};
use ::common::integrity;
use ::common::sealer::Sealer;
use ::common::store::{ContentStore, MemoryContentStore};
use ::common::SealError;
use serde_json::json;

fn sealed() -> (Sealer, Envelope) {
    let sealer = common::random_sealer();
    let envelope = sealer
        .seal(&common::record(json!({"email": "a@example.com"})))
        .unwrap();
    (sealer, envelope)
}

#[test]
fn test_every_ciphertext_bit_flip_detected() {
    let (sealer, envelope) = sealed();

    for byte in 0..envelope.ciphertext().len() {
        for bit in 0..8 {
            let mut ciphertext = envelope.ciphertext().to_vec();
            ciphertext[byte] ^= 1 << bit;
            let tampered = Envelope::new(ciphertext, *envelope.nonce(), *envelope.tag());

            assert!(
                matches!(sealer.open(&tampered), Err(SealError::Integrity)),
                "flip of byte {} bit {} went unnoticed",
                byte,
                bit
            );
        }
    }
}

#[test]
fn test_every_tag_bit_flip_detected() {
    let (sealer, envelope) = sealed();

    for byte in 0..envelope.tag().len() {
        for bit in 0..8 {
            let mut tag = *envelope.tag();
            tag[byte] ^= 1 << bit;
            let tampered = Envelope::new(envelope.ciphertext().to_vec(), *envelope.nonce(), tag);

            assert!(matches!(sealer.open(&tampered), Err(SealError::Integrity)));
        }
    }
}

#[test]
fn test_truncated_ciphertext_detected() {
    let (sealer, envelope) = sealed();
    let mut ciphertext = envelope.ciphertext().to_vec();
    ciphertext.pop();
    let tampered = Envelope::new(ciphertext, *envelope.nonce(), *envelope.tag());

    assert!(matches!(sealer.open(&tampered), Err(SealError::Integrity)));
}

#[test]
fn test_wrong_key_rejected() {
    let (_, envelope) = sealed();
    let other = common::random_sealer();

    let err = other.open(&envelope).unwrap_err();
    assert!(matches!(err, SealError::Integrity));
    assert!(!err.is_client_input());
}

#[test]
fn test_malformed_envelope_is_client_input() {
    let (sealer, envelope) = sealed();
    let mut map = envelope::encode(&envelope);
    map.remove("nonce");

    let err = sealer.decrypt_envelope(&map).unwrap_err();
    assert!(matches!(err, SealError::MalformedEnvelope(_)));
    assert!(err.is_client_input());
}

#[tokio::test]
async fn test_swapped_content_fails_digest_check() {
    let sealer = common::random_sealer();
    let store = MemoryContentStore::new();

    let original = sealer
        .store_record(&store, &common::record(json!({"email": "a@example.com"})))
        .await
        .unwrap();

    // A validly sealed but different record placed under the original id
    let forged = sealer
        .encrypt_record(&common::record(json!({"email": "mallory@example.com"})))
        .unwrap();
    store.replace(&original.cid, forged.envelope);

    assert!(matches!(
        sealer
            .fetch_verified(&store, &original.cid, Some(&original.digest))
            .await,
        Err(SealError::Integrity)
    ));
    assert!(matches!(
        sealer.fetch_verified(&store, &original.cid, None).await,
        Err(SealError::Integrity)
    ));
}

#[tokio::test]
async fn test_untouched_content_passes_digest_check() {
    let sealer = common::random_sealer();
    let store = MemoryContentStore::new();
    let record = common::record(json!({"email": "a@example.com"}));

    let stored = sealer.store_record(&store, &record).await.unwrap();
    let fetched = store.get(&stored.cid).await.unwrap();

    assert!(integrity::verify(
        &stored.digest,
        &envelope::decode(&fetched).unwrap()
    ));
    assert_eq!(
        sealer
            .fetch_verified(&store, &stored.cid, Some(&stored.digest))
            .await
            .unwrap(),
        record
    );
}
