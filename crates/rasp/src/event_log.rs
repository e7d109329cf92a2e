use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn level(self) -> u8 {
        match self {
            Self::Info => 1,
            Self::Warning => 2,
            Self::Critical => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    DebuggerDetected,
    ChecksumMismatch,
    ChecksumCalculationFailed,
    IntegrityCheckPassed,
    HookDetected,
    FailClosedShutdown,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DebuggerDetected => "DEBUGGER_DETECTED",
            Self::ChecksumMismatch => "CHECKSUM_MISMATCH",
            Self::ChecksumCalculationFailed => "CHECKSUM_CALCULATION_FAILED",
            Self::IntegrityCheckPassed => "INTEGRITY_CHECK_PASSED",
            Self::HookDetected => "HOOK_DETECTED",
            Self::FailClosedShutdown => "FAIL_CLOSED_SHUTDOWN",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected security event. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub timestamp: String,
    pub kind: EventKind,
    pub description: String,
    pub severity: Severity,
}

impl SecurityEvent {
    pub fn new(kind: EventKind, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            kind,
            description: description.into(),
            severity,
        }
    }

    /// Line format of the durable log:
    /// `[timestamp] [KIND] [Severity:n] description`
    pub fn log_line(&self) -> String {
        format!(
            "[{}] [{}] [Severity:{}] {}",
            self.timestamp,
            self.kind,
            self.severity.level(),
            self.description
        )
    }
}

/// Thread-safe append-only event record, mirrored to a line-oriented file.
/// The in-memory sequence is authoritative; a failing file write degrades to
/// memory-only logging and is never fatal.
#[derive(Debug)]
pub struct SecurityEventLog {
    events: Mutex<Vec<SecurityEvent>>,
    path: Option<PathBuf>,
}

impl SecurityEventLog {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            path,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(None)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn append(&self, event: SecurityEvent) {
        match event.severity {
            Severity::Critical => {
                error!(kind = %event.kind, description = %event.description, "security event")
            }
            Severity::Warning => {
                warn!(kind = %event.kind, description = %event.description, "security event")
            }
            Severity::Info => {
                info!(kind = %event.kind, description = %event.description, "security event")
            }
        }

        let line = event.log_line();
        let mut events = self.lock_events();
        events.push(event);

        // Written while holding the lock so file order matches memory order.
        if let Some(path) = &self.path {
            if let Err(err) = append_line(path, &line) {
                warn!(path = %path.display(), error = %err, "security log file write failed, keeping in-memory copy");
            }
        }
    }

    /// Snapshot copy of all events in insertion order.
    pub fn list(&self) -> Vec<SecurityEvent> {
        self.lock_events().clone()
    }

    pub fn count(&self) -> usize {
        self.lock_events().len()
    }

    /// Empty both the in-memory sequence and the durable file. The only
    /// operation that ever rewrites the file.
    pub fn clear(&self) {
        let mut events = self.lock_events();
        events.clear();

        if let Some(path) = &self.path {
            if let Err(err) = File::create(path) {
                warn!(path = %path.display(), error = %err, "security log file truncate failed");
            }
        }
    }

    fn lock_events(&self) -> std::sync::MutexGuard<'_, Vec<SecurityEvent>> {
        // A panicking appender must not silence the log for everyone else.
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)
}
