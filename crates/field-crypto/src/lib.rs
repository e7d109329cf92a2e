mod app_key;
mod cipher;
mod credential;
mod errors;
mod kdf;

pub use app_key::{AppKeyManager, KeyState, APP_KEY_ITERATIONS, PASSPHRASE_ENV};
pub use cipher::{FieldCipher, NONCE_LEN, SEALED_PREFIX, TAG_LEN};
pub use credential::{
    fnv1a64, CredentialHasher, CredentialRecord, CREDENTIAL_ITERATIONS, CREDENTIAL_SALT_LEN,
};
pub use errors::{CryptoError, CryptoResult};
pub use kdf::{derive_key, DEFAULT_KDF_ITERATIONS, KEY_LEN};
