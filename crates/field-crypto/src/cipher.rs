use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;

use crate::app_key::AppKeyManager;
use crate::errors::{CryptoError, CryptoResult};
use crate::kdf::KEY_LEN;

/// Version tag carried by every sealed value this cipher produces.
pub const SEALED_PREFIX: &str = "GCM1:";
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// Authenticated field-level encryption. Sealed values are ASCII strings of
/// the form `GCM1:base64(nonce[12] || ciphertext || tag[16])`, stored by
/// collaborators in opaque text fields.
pub struct FieldCipher {
    cipher: Aes256Gcm,
}

impl FieldCipher {
    pub fn new(keys: &AppKeyManager) -> CryptoResult<Self> {
        let key = keys.key()?;
        Self::from_key(key)
    }

    pub fn from_key(key: &[u8]) -> CryptoResult<Self> {
        if key.len() != KEY_LEN {
            return Err(CryptoError::InvalidParameter(format!(
                "AES-256 key must be {} bytes, got {}",
                KEY_LEN,
                key.len()
            )));
        }
        let cipher =
            Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::EncryptFailed)?;
        Ok(Self { cipher })
    }

    /// Seal `plaintext`, binding but not encrypting `aad`. A fresh random
    /// nonce is drawn from the OS on every call; nonce reuse under one key
    /// would break the AEAD guarantees, so no caller-supplied nonces exist.
    pub fn encrypt(&self, plaintext: &[u8], aad: &[u8]) -> CryptoResult<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: plaintext,
                    aad,
                },
            )
            .map_err(|_| CryptoError::EncryptFailed)?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(nonce.as_slice());
        blob.extend_from_slice(&ciphertext);

        Ok(format!(
            "{}{}",
            SEALED_PREFIX,
            base64::engine::general_purpose::STANDARD.encode(blob)
        ))
    }

    /// Open a sealed value. `aad` must match the value bound at encryption
    /// time exactly or authentication fails.
    ///
    /// Input without the version prefix is returned unchanged ("unsealed
    /// passthrough"): pre-encryption records coexist with sealed ones in the
    /// same storage fields.
    pub fn decrypt(&self, sealed: &str, aad: &[u8]) -> CryptoResult<Vec<u8>> {
        let Some(encoded) = sealed.strip_prefix(SEALED_PREFIX) else {
            return Ok(sealed.as_bytes().to_vec());
        };

        let blob = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|err| CryptoError::MalformedSealedValue(format!("invalid base64: {}", err)))?;

        if blob.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::MalformedSealedValue(format!(
                "decoded payload is {} bytes, below the {}-byte nonce+tag minimum",
                blob.len(),
                NONCE_LEN + TAG_LEN
            )));
        }

        let (nonce, ciphertext) = blob.split_at(NONCE_LEN);
        self.cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad,
                },
            )
            .map_err(|_| CryptoError::DecryptFailed)
    }
}
