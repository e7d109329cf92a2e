use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_LOG_PATH: &str = "rasp_security.log";
pub const DEFAULT_MONITORING_INTERVAL_MS: u64 = 5_000;

/// Protection policy consumed at `ProtectionController::start`. Replaceable
/// wholesale before start; read-only while protection is active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaspConfig {
    pub enable_debugger_detection: bool,
    pub enable_integrity_check: bool,
    pub enable_hook_detection: bool,
    /// When set, any detection escalates to fail-closed termination instead
    /// of being reported upward.
    pub auto_terminate_on_threat: bool,
    pub monitoring_interval_ms: u64,
    /// Durable security log destination; `None` keeps events in memory only.
    pub log_path: Option<PathBuf>,
}

impl Default for RaspConfig {
    fn default() -> Self {
        Self {
            enable_debugger_detection: true,
            enable_integrity_check: true,
            enable_hook_detection: true,
            auto_terminate_on_threat: true,
            monitoring_interval_ms: DEFAULT_MONITORING_INTERVAL_MS,
            log_path: Some(PathBuf::from(DEFAULT_LOG_PATH)),
        }
    }
}

impl RaspConfig {
    /// Defaults with `TEAMCORE_RASP_*` environment overrides applied.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enable_debugger_detection: env_bool(
                "TEAMCORE_RASP_DEBUGGER_DETECTION",
                defaults.enable_debugger_detection,
            ),
            enable_integrity_check: env_bool(
                "TEAMCORE_RASP_INTEGRITY_CHECK",
                defaults.enable_integrity_check,
            ),
            enable_hook_detection: env_bool(
                "TEAMCORE_RASP_HOOK_DETECTION",
                defaults.enable_hook_detection,
            ),
            auto_terminate_on_threat: env_bool(
                "TEAMCORE_RASP_AUTO_TERMINATE",
                defaults.auto_terminate_on_threat,
            ),
            monitoring_interval_ms: env_u64(
                "TEAMCORE_RASP_MONITORING_INTERVAL_MS",
                defaults.monitoring_interval_ms,
            ),
            log_path: env_non_empty("TEAMCORE_RASP_LOG_PATH")
                .map(PathBuf::from)
                .or(defaults.log_path),
        }
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(raw) => matches!(
            raw.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}
