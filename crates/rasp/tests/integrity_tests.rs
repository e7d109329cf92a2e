use std::sync::{Arc, Mutex, OnceLock};

use rasp::{
    normalize_sha256_hex, resolve_baseline_digest, EventKind, IntegrityMonitor, SecurityEventLog,
    BASELINE_DIGEST_ENV, BASELINE_DIGEST_FILE_ENV,
};

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

#[test]
fn normalize_accepts_only_64_hex_chars() {
    let digest = "A".repeat(64);
    assert_eq!(normalize_sha256_hex(&digest), Some("a".repeat(64)));
    assert_eq!(
        normalize_sha256_hex("  deadbeef  "),
        None,
        "short digests are rejected"
    );
    assert_eq!(normalize_sha256_hex(&"g".repeat(64)), None);

    let padded = format!("  {}\n", "0f".repeat(32));
    assert_eq!(normalize_sha256_hex(&padded), Some("0f".repeat(32)));
}

#[test]
fn empty_baseline_passes_without_logging() {
    let log = Arc::new(SecurityEventLog::in_memory());
    let monitor = IntegrityMonitor::new(Arc::clone(&log));
    assert!(monitor.verify(""));
    assert_eq!(log.count(), 0);
}

fn temp_digest_file(content: &str) -> std::path::PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    let path = std::env::temp_dir().join(format!("rasp-baseline-{}.sha256", nanos));
    std::fs::write(&path, content).expect("write digest file");
    path
}

#[test]
fn baseline_env_var_wins_over_the_file() {
    let _guard = env_lock().lock().expect("env lock");
    let env_digest = "a".repeat(64);
    let file = temp_digest_file(&"b".repeat(64));
    std::env::set_var(BASELINE_DIGEST_ENV, format!("  {}  ", env_digest.to_uppercase()));
    std::env::set_var(BASELINE_DIGEST_FILE_ENV, &file);

    // Normalized (trimmed, lowercased) on the way through.
    assert_eq!(resolve_baseline_digest(), Some(env_digest));

    std::env::remove_var(BASELINE_DIGEST_ENV);
    std::env::remove_var(BASELINE_DIGEST_FILE_ENV);
    std::fs::remove_file(&file).ok();
}

#[test]
fn baseline_falls_back_to_the_digest_file() {
    let _guard = env_lock().lock().expect("env lock");
    let file_digest = "c".repeat(64);
    let file = temp_digest_file(&format!("{}\n", file_digest));
    std::env::remove_var(BASELINE_DIGEST_ENV);
    std::env::set_var(BASELINE_DIGEST_FILE_ENV, &file);

    assert_eq!(resolve_baseline_digest(), Some(file_digest));

    std::env::remove_var(BASELINE_DIGEST_FILE_ENV);
    std::fs::remove_file(&file).ok();
}

#[test]
fn malformed_env_digest_falls_through_to_the_file() {
    let _guard = env_lock().lock().expect("env lock");
    let file_digest = "d".repeat(64);
    let file = temp_digest_file(&file_digest);
    std::env::set_var(BASELINE_DIGEST_ENV, "not-a-sha256");
    std::env::set_var(BASELINE_DIGEST_FILE_ENV, &file);

    assert_eq!(resolve_baseline_digest(), Some(file_digest));

    std::env::remove_var(BASELINE_DIGEST_ENV);
    std::env::remove_var(BASELINE_DIGEST_FILE_ENV);
    std::fs::remove_file(&file).ok();
}

#[test]
fn no_configured_baseline_resolves_to_none() {
    let _guard = env_lock().lock().expect("env lock");
    std::env::remove_var(BASELINE_DIGEST_ENV);
    std::env::remove_var(BASELINE_DIGEST_FILE_ENV);

    // A missing or malformed baseline file counts as unconfigured too.
    assert_eq!(resolve_baseline_digest(), None);

    let file = temp_digest_file("junk, not hex");
    std::env::set_var(BASELINE_DIGEST_FILE_ENV, &file);
    assert_eq!(resolve_baseline_digest(), None);

    std::env::remove_var(BASELINE_DIGEST_FILE_ENV);
    std::fs::remove_file(&file).ok();
}

#[cfg(target_os = "linux")]
mod linux {
    use super::*;

    #[test]
    fn digest_is_64_hex_and_stable() {
        let log = Arc::new(SecurityEventLog::in_memory());
        let monitor = IntegrityMonitor::new(log);
        let first = monitor.compute_digest().expect("compute digest");
        let second = monitor.compute_digest().expect("compute digest");
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|ch| ch.is_ascii_hexdigit()));
        assert_eq!(first, second);
    }

    #[test]
    fn matching_baseline_verifies_and_logs_a_pass() {
        let log = Arc::new(SecurityEventLog::in_memory());
        let monitor = IntegrityMonitor::new(Arc::clone(&log));
        let digest = monitor.compute_digest().expect("compute digest");

        assert!(monitor.verify(&digest));
        let events = log.list();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::IntegrityCheckPassed);
    }

    #[test]
    fn uppercase_baseline_still_matches() {
        let log = Arc::new(SecurityEventLog::in_memory());
        let monitor = IntegrityMonitor::new(log);
        let digest = monitor.compute_digest().expect("compute digest");
        assert!(monitor.verify(&digest.to_ascii_uppercase()));
    }

    #[test]
    fn wrong_baseline_fails_and_logs_a_mismatch() {
        let log = Arc::new(SecurityEventLog::in_memory());
        let monitor = IntegrityMonitor::new(Arc::clone(&log));

        let wrong = "0".repeat(64);
        assert!(!monitor.verify(&wrong));
        let events = log.list();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::ChecksumMismatch);
        assert!(events[0].description.contains(&wrong));
    }
}
