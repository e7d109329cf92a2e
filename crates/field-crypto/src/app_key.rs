use secure_buffer::SecureBuffer;
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

use crate::errors::{CryptoError, CryptoResult};
use crate::kdf::{derive_key, KEY_LEN};

pub const PASSPHRASE_ENV: &str = "TEAMCORE_APP_PASSPHRASE";
pub const APP_KEY_ITERATIONS: u32 = 100_000;

// Fixed per-build salt, byte-identical to the value every deployed sealed
// record was derived under. Known limitation: it defeats cross-deployment
// salting, but it cannot be randomized without a key-rotation and data
// migration story.
const APP_KEY_SALT: [u8; 16] = *b"LS_APP_SALT_2025";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Uninitialized,
    Ready,
    Destroyed,
}

/// Owner of the single process-wide symmetric key. Built explicitly and
/// passed by reference to collaborators; constructing independent instances
/// is allowed (and used by the tests).
///
/// Lifecycle is one-way: `Uninitialized -> Ready -> Destroyed`.
pub struct AppKeyManager {
    key: SecureBuffer,
    state: KeyState,
}

impl AppKeyManager {
    pub fn new() -> Self {
        Self {
            key: SecureBuffer::empty(),
            state: KeyState::Uninitialized,
        }
    }

    pub fn state(&self) -> KeyState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == KeyState::Ready
    }

    /// Derive the application key from a passphrase. The passphrase comes
    /// from `TEAMCORE_APP_PASSPHRASE` when set and non-empty; otherwise
    /// `prompt` is invoked (the caller owns the echo-suppressed I/O).
    /// Neither source yielding a passphrase is a startup failure.
    ///
    /// Idempotent: calling again while `Ready` succeeds without re-deriving.
    pub fn init_from_env_or<F>(&mut self, prompt: F) -> CryptoResult<()>
    where
        F: FnOnce() -> Option<String>,
    {
        match self.state {
            KeyState::Ready => return Ok(()),
            KeyState::Destroyed => return Err(CryptoError::KeyDestroyed),
            KeyState::Uninitialized => {}
        }

        let passphrase = match std::env::var(PASSPHRASE_ENV) {
            Ok(value) if !value.is_empty() => Zeroizing::new(value),
            _ => match prompt() {
                Some(value) if !value.is_empty() => Zeroizing::new(value),
                _ => return Err(CryptoError::MissingPassphrase),
            },
        };

        // The Zeroizing wrapper wipes the passphrase on every exit path from
        // here on, including the error returns below.
        let mut derived = derive_key(passphrase.as_bytes(), &APP_KEY_SALT, APP_KEY_ITERATIONS)?;

        let mut key = SecureBuffer::new(KEY_LEN)?;
        key.as_mut_slice().copy_from_slice(&derived);
        derived.zeroize();

        self.key = key;
        self.state = KeyState::Ready;
        debug!("application key derived and sealed in memory");
        Ok(())
    }

    /// Initialize from an already-obtained passphrase. Used by collaborators
    /// that run their own prompt loop.
    pub fn init_with_passphrase(&mut self, passphrase: &str) -> CryptoResult<()> {
        match self.state {
            KeyState::Ready => return Ok(()),
            KeyState::Destroyed => return Err(CryptoError::KeyDestroyed),
            KeyState::Uninitialized => {}
        }
        if passphrase.is_empty() {
            return Err(CryptoError::MissingPassphrase);
        }

        let mut derived = derive_key(passphrase.as_bytes(), &APP_KEY_SALT, APP_KEY_ITERATIONS)?;
        let mut key = SecureBuffer::new(KEY_LEN)?;
        key.as_mut_slice().copy_from_slice(&derived);
        derived.zeroize();

        self.key = key;
        self.state = KeyState::Ready;
        Ok(())
    }

    /// Read-only view of the 32-byte key. Fails until `init` has succeeded
    /// and after `destroy`.
    pub fn key(&self) -> CryptoResult<&[u8]> {
        match self.state {
            KeyState::Ready => Ok(self.key.as_slice()),
            KeyState::Uninitialized => Err(CryptoError::NotInitialized),
            KeyState::Destroyed => Err(CryptoError::KeyDestroyed),
        }
    }

    /// Wipe the key material and end the lifecycle. Terminal: the manager
    /// cannot be re-initialized afterwards.
    pub fn destroy(&mut self) {
        self.key.wipe_and_release();
        self.state = KeyState::Destroyed;
        debug!("application key destroyed");
    }
}

impl Default for AppKeyManager {
    fn default() -> Self {
        Self::new()
    }
}
