use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::errors::{RaspError, RaspResult};
use crate::event_log::{EventKind, SecurityEvent, SecurityEventLog, Severity};
use crate::platform::{host_image, ProcessImage};

pub const BASELINE_DIGEST_ENV: &str = "TEAMCORE_EXPECTED_TEXT_SHA256";
pub const BASELINE_DIGEST_FILE_ENV: &str = "TEAMCORE_EXPECTED_TEXT_SHA256_FILE";
const COMPILETIME_BASELINE_DIGEST: Option<&str> = option_env!("TEAMCORE_EXPECTED_TEXT_SHA256");

/// Verifies that the process's code section still hashes to a known-good
/// baseline. Every outcome is recorded in the event log before the boolean
/// reaches the caller, so ignoring the return value cannot hide a mismatch.
pub struct IntegrityMonitor {
    log: Arc<SecurityEventLog>,
}

impl IntegrityMonitor {
    pub fn new(log: Arc<SecurityEventLog>) -> Self {
        Self { log }
    }

    /// SHA-256 of the executable's code section as a 64-char lowercase hex
    /// string.
    pub fn compute_digest(&self) -> RaspResult<String> {
        self.compute_digest_with(&host_image())
    }

    pub fn compute_digest_with(&self, image: &impl ProcessImage) -> RaspResult<String> {
        let text = image.text_section().map_err(RaspError::Image)?;
        Ok(encode_hex(&Sha256::digest(&text)))
    }

    /// Recompute and compare against `expected`. An empty `expected` means
    /// no baseline is configured and always passes without logging.
    pub fn verify(&self, expected: &str) -> bool {
        self.verify_with(&host_image(), expected)
    }

    pub fn verify_with(&self, image: &impl ProcessImage, expected: &str) -> bool {
        if expected.is_empty() {
            return true;
        }

        let current = match self.compute_digest_with(image) {
            Ok(digest) => digest,
            Err(err) => {
                self.log.append(SecurityEvent::new(
                    EventKind::ChecksumCalculationFailed,
                    Severity::Critical,
                    format!("failed computing code section checksum: {}", err),
                ));
                return false;
            }
        };

        let expected =
            normalize_sha256_hex(expected).unwrap_or_else(|| expected.trim().to_ascii_lowercase());

        if current == expected {
            self.log.append(SecurityEvent::new(
                EventKind::IntegrityCheckPassed,
                Severity::Info,
                "binary integrity verified successfully",
            ));
            true
        } else {
            self.log.append(SecurityEvent::new(
                EventKind::ChecksumMismatch,
                Severity::Critical,
                format!(
                    "code tampering detected: expected={} observed={}",
                    expected, current
                ),
            ));
            false
        }
    }
}

/// Trim, lowercase, and validate a 64-character hex digest.
pub fn normalize_sha256_hex(raw: &str) -> Option<String> {
    let normalized = raw.trim().to_ascii_lowercase();
    if normalized.len() != 64 {
        return None;
    }
    if !normalized.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }
    Some(normalized)
}

/// Resolve the build-time baseline digest: process environment first, then a
/// baseline file, then the value baked in at compile time. `None` means no
/// baseline is configured and integrity checks pass permissively.
pub fn resolve_baseline_digest() -> Option<String> {
    if let Ok(raw) = std::env::var(BASELINE_DIGEST_ENV) {
        if let Some(value) = normalize_sha256_hex(&raw) {
            return Some(value);
        }
    }

    if let Ok(path) = std::env::var(BASELINE_DIGEST_FILE_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            if let Ok(content) = std::fs::read_to_string(trimmed) {
                if let Some(value) = normalize_sha256_hex(&content) {
                    return Some(value);
                }
            }
        }
    }

    COMPILETIME_BASELINE_DIGEST.and_then(normalize_sha256_hex)
}

pub(crate) fn encode_hex(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}
