use std::collections::HashSet;

use base64::Engine;
use field_crypto::{CryptoError, FieldCipher, NONCE_LEN, SEALED_PREFIX};

fn test_cipher() -> FieldCipher {
    FieldCipher::from_key(&[0x42u8; 32]).expect("build cipher")
}

#[test]
fn round_trip_restores_plaintext() {
    let cipher = test_cipher();
    let sealed = cipher
        .encrypt(b"Jordan Example, born 1990", b"players.name")
        .expect("encrypt");

    assert!(sealed.starts_with(SEALED_PREFIX));
    assert!(sealed.is_ascii());

    let opened = cipher.decrypt(&sealed, b"players.name").expect("decrypt");
    assert_eq!(opened, b"Jordan Example, born 1990");
}

#[test]
fn empty_plaintext_round_trips() {
    let cipher = test_cipher();
    let sealed = cipher.encrypt(b"", b"field").expect("encrypt");
    let opened = cipher.decrypt(&sealed, b"field").expect("decrypt");
    assert!(opened.is_empty());
}

#[test]
fn flipping_any_ciphertext_byte_fails_decryption() {
    let cipher = test_cipher();
    let sealed = cipher.encrypt(b"sensitive", b"aad").expect("encrypt");
    let encoded = sealed.strip_prefix(SEALED_PREFIX).expect("prefix");
    let blob = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .expect("decode");

    // Flip one byte at every position past the nonce (ciphertext and tag).
    for index in NONCE_LEN..blob.len() {
        let mut tampered = blob.clone();
        tampered[index] ^= 0x01;
        let resealed = format!(
            "{}{}",
            SEALED_PREFIX,
            base64::engine::general_purpose::STANDARD.encode(&tampered)
        );
        assert_eq!(
            cipher.decrypt(&resealed, b"aad"),
            Err(CryptoError::DecryptFailed),
            "byte {} flip must not decrypt",
            index
        );
    }
}

#[test]
fn mismatched_aad_fails_deterministically() {
    let cipher = test_cipher();
    let sealed = cipher.encrypt(b"payload", b"table.column").expect("encrypt");

    assert_eq!(
        cipher.decrypt(&sealed, b"table.other"),
        Err(CryptoError::DecryptFailed)
    );
    assert_eq!(cipher.decrypt(&sealed, b""), Err(CryptoError::DecryptFailed));
    assert!(cipher.decrypt(&sealed, b"table.column").is_ok());
}

#[test]
fn wrong_key_fails_decryption() {
    let sealed = test_cipher().encrypt(b"payload", b"aad").expect("encrypt");
    let other = FieldCipher::from_key(&[0x43u8; 32]).expect("build cipher");
    assert_eq!(other.decrypt(&sealed, b"aad"), Err(CryptoError::DecryptFailed));
}

#[test]
fn input_without_version_prefix_passes_through_unchanged() {
    let cipher = test_cipher();
    let opened = cipher
        .decrypt("plain legacy value", b"whatever")
        .expect("passthrough");
    assert_eq!(opened, b"plain legacy value");
}

#[test]
fn invalid_base64_is_malformed_not_a_tag_failure() {
    let cipher = test_cipher();
    let result = cipher.decrypt("GCM1:!!!not-base64!!!", b"aad");
    assert!(matches!(
        result,
        Err(CryptoError::MalformedSealedValue(_))
    ));
}

#[test]
fn payload_below_nonce_plus_tag_minimum_is_rejected() {
    let cipher = test_cipher();
    let short = base64::engine::general_purpose::STANDARD.encode([0u8; 27]);
    let result = cipher.decrypt(&format!("{}{}", SEALED_PREFIX, short), b"aad");
    assert!(matches!(
        result,
        Err(CryptoError::MalformedSealedValue(_))
    ));
}

#[test]
fn ten_thousand_encryptions_use_distinct_nonces() {
    let cipher = test_cipher();
    let mut nonces = HashSet::new();

    for _ in 0..10_000 {
        let sealed = cipher.encrypt(b"x", b"").expect("encrypt");
        let encoded = sealed.strip_prefix(SEALED_PREFIX).expect("prefix");
        let blob = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .expect("decode");
        nonces.insert(blob[..NONCE_LEN].to_vec());
    }

    assert_eq!(nonces.len(), 10_000);
}

#[test]
fn rejects_keys_of_wrong_length() {
    assert!(matches!(
        FieldCipher::from_key(&[0u8; 16]),
        Err(CryptoError::InvalidParameter(_))
    ));
}
