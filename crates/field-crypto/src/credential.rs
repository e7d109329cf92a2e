use rand::Rng;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::errors::CryptoResult;
use crate::kdf::derive_key;

pub const CREDENTIAL_SALT_LEN: usize = 16;
pub const CREDENTIAL_ITERATIONS: u32 = 100_000;

/// Stored credential. Two formats coexist while old records migrate: the
/// salted PBKDF2 form for everything written today, and the legacy unsalted
/// FNV-1a 64 form still present in old user files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialRecord {
    Stretched {
        salt: [u8; CREDENTIAL_SALT_LEN],
        hash: [u8; 32],
        iterations: u32,
    },
    /// Not cryptographic. Accepted for verification only; `hash` never
    /// produces this format, so a legacy record is upgraded the next time
    /// its password is re-set, never silently.
    Legacy { hash: u64 },
}

impl CredentialRecord {
    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy { .. })
    }
}

pub struct CredentialHasher;

impl CredentialHasher {
    /// Hash a password under a fresh random per-record salt. Always produces
    /// the stretched format.
    pub fn hash(password: &str) -> CryptoResult<CredentialRecord> {
        let mut salt = [0u8; CREDENTIAL_SALT_LEN];
        rand::rng().fill(&mut salt);

        let hash = derive_key(password.as_bytes(), &salt, CREDENTIAL_ITERATIONS)?;
        Ok(CredentialRecord::Stretched {
            salt,
            hash,
            iterations: CREDENTIAL_ITERATIONS,
        })
    }

    /// Verify a password against either record format. The stretched path
    /// compares in constant time; the legacy path is ordinary equality on a
    /// non-secret-length hash and is explicitly the weaker check.
    pub fn verify(password: &str, record: &CredentialRecord) -> bool {
        match record {
            CredentialRecord::Stretched {
                salt,
                hash,
                iterations,
            } => {
                let Ok(mut candidate) = derive_key(password.as_bytes(), salt, *iterations) else {
                    return false;
                };
                let matched = bool::from(candidate.ct_eq(hash));
                candidate.zeroize();
                matched
            }
            CredentialRecord::Legacy { hash } => fnv1a64(password) == *hash,
        }
    }
}

/// FNV-1a 64 over the password bytes. Kept only for legacy records; the
/// constants match the ones the old user files were written with.
pub fn fnv1a64(s: &str) -> u64 {
    const FNV_OFFSET: u64 = 1_469_598_103_934_665_603;
    const FNV_PRIME: u64 = 1_099_511_628_211;

    let mut h = FNV_OFFSET;
    for byte in s.bytes() {
        h ^= u64::from(byte);
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}
