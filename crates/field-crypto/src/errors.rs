use std::fmt;

#[derive(Debug, PartialEq, Eq)]
pub enum CryptoError {
    /// Application key requested before a successful init.
    NotInitialized,
    /// Application key requested or re-initialized after destruction.
    KeyDestroyed,
    /// No passphrase in the environment and the prompt produced none.
    MissingPassphrase,
    InvalidParameter(String),
    /// Sealed value is structurally broken (encoding, framing, length).
    MalformedSealedValue(String),
    /// Authentication failed: wrong key, wrong associated data, or a
    /// tampered ciphertext. Deliberately carries no further detail.
    DecryptFailed,
    EncryptFailed,
    Allocation(String),
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "application key is not initialized"),
            Self::KeyDestroyed => write!(f, "application key has been destroyed"),
            Self::MissingPassphrase => write!(f, "no passphrase available from environment or prompt"),
            Self::InvalidParameter(msg) => write!(f, "invalid parameter: {}", msg),
            Self::MalformedSealedValue(msg) => write!(f, "malformed sealed value: {}", msg),
            Self::DecryptFailed => write!(f, "decryption failed"),
            Self::EncryptFailed => write!(f, "encryption failed"),
            Self::Allocation(msg) => write!(f, "allocation error: {}", msg),
        }
    }
}

impl std::error::Error for CryptoError {}

impl From<secure_buffer::SecureBufferError> for CryptoError {
    fn from(value: secure_buffer::SecureBufferError) -> Self {
        Self::Allocation(value.to_string())
    }
}

pub type CryptoResult<T> = std::result::Result<T, CryptoError>;
