mod config;
mod controller;
mod debugger;
mod errors;
mod event_log;
mod hooks;
mod integrity;
mod platform;

pub use config::RaspConfig;
pub use controller::{ControllerState, ProtectionController};
pub use debugger::{detect_once, tracer_pid_from_status, DebuggerSentinel};
pub use errors::{RaspError, RaspResult};
pub use event_log::{EventKind, SecurityEvent, SecurityEventLog, Severity};
pub use hooks::{count_redirected_slots, HookScanner};
pub use integrity::{
    normalize_sha256_hex, resolve_baseline_digest, IntegrityMonitor, BASELINE_DIGEST_ENV,
    BASELINE_DIGEST_FILE_ENV,
};
pub use platform::{host_image, HostImage, ProcessImage};
