use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::RaspConfig;
use crate::debugger::DebuggerSentinel;
use crate::errors::{RaspError, RaspResult};
use crate::event_log::{EventKind, SecurityEvent, SecurityEventLog, Severity};
use crate::hooks::HookScanner;
use crate::integrity::IntegrityMonitor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Inactive,
    Active,
    ShuttingDown,
}

/// Owns the protection lifecycle: boot-time integrity verification, the
/// background debugger sentinel, and on-demand rescans, all reporting into
/// one shared event log. State only ever moves Inactive -> Active ->
/// ShuttingDown -> Inactive.
pub struct ProtectionController {
    config: RaspConfig,
    log: Arc<SecurityEventLog>,
    sentinel: DebuggerSentinel,
    integrity: IntegrityMonitor,
    hooks: HookScanner,
    expected_digest: String,
    state: ControllerState,
}

impl ProtectionController {
    pub fn new(config: RaspConfig) -> Self {
        let log = Arc::new(SecurityEventLog::new(config.log_path.clone()));
        Self::with_log(config, log)
    }

    /// Build against a caller-supplied log, e.g. one shared with other
    /// subsystems. `config.log_path` is ignored in this case.
    pub fn with_log(config: RaspConfig, log: Arc<SecurityEventLog>) -> Self {
        Self {
            config,
            sentinel: DebuggerSentinel::new(Arc::clone(&log)),
            integrity: IntegrityMonitor::new(Arc::clone(&log)),
            hooks: HookScanner::new(Arc::clone(&log)),
            log,
            expected_digest: String::new(),
            state: ControllerState::Inactive,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn config(&self) -> &RaspConfig {
        &self.config
    }

    pub fn event_log(&self) -> &Arc<SecurityEventLog> {
        &self.log
    }

    /// Activate protection. Runs the boot-time integrity check, launches the
    /// debugger sentinel, and performs an initial import-hook sweep, in that
    /// order. `expected_digest` is the known-good code section checksum;
    /// empty disables the integrity comparison.
    ///
    /// With `auto_terminate_on_threat` set, any detection here or later in
    /// the sentinel terminates the process instead of returning an error.
    pub fn start(&mut self, expected_digest: &str) -> RaspResult<()> {
        if self.state != ControllerState::Inactive {
            return Err(RaspError::AlreadyActive);
        }

        self.expected_digest = expected_digest.trim().to_ascii_lowercase();

        if self.config.enable_integrity_check && !self.integrity.verify(&self.expected_digest) {
            if self.config.auto_terminate_on_threat {
                self.fail_closed("boot-time integrity verification failed");
            }
            return Err(RaspError::IntegrityCheckFailed);
        }

        if self.config.enable_debugger_detection {
            let interval = Duration::from_millis(self.config.monitoring_interval_ms.max(1));
            let log = Arc::clone(&self.log);
            let auto_terminate = self.config.auto_terminate_on_threat;
            self.sentinel.start_monitoring(interval, move |pid| {
                if auto_terminate {
                    fail_closed_with(
                        &log,
                        &format!("debugger attached (tracer pid {})", pid),
                    );
                }
            });
        }

        if self.config.enable_hook_detection {
            match self.hooks.scan_imports() {
                Ok(count) if count > 0 && self.config.auto_terminate_on_threat => {
                    self.fail_closed("import table tampering detected");
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(error = %err, "initial import hook scan failed");
                }
            }
        }

        self.state = ControllerState::Active;
        info!("runtime protection active");
        Ok(())
    }

    /// Re-run every enabled detection once. Returns `Ok(true)` when all of
    /// them came back clean. Detections are logged by the individual
    /// monitors; with `auto_terminate_on_threat` set this does not return on
    /// a detection.
    pub fn scan(&mut self) -> RaspResult<bool> {
        if self.state != ControllerState::Active {
            return Err(RaspError::NotActive);
        }

        let mut clean = true;

        if self.config.enable_integrity_check && !self.integrity.verify(&self.expected_digest) {
            clean = false;
        }

        if self.config.enable_debugger_detection {
            if let Some(pid) = crate::debugger::detect_once() {
                self.log.append(SecurityEvent::new(
                    EventKind::DebuggerDetected,
                    Severity::Critical,
                    format!("runtime debugger detected (tracer pid {})", pid),
                ));
                clean = false;
            }
        }

        if self.config.enable_hook_detection {
            match self.hooks.scan_imports() {
                Ok(count) => clean &= count == 0,
                Err(err) => warn!(error = %err, "import hook scan failed"),
            }
        }

        if !clean && self.config.auto_terminate_on_threat {
            self.fail_closed("on-demand scan detected tampering");
        }
        Ok(clean)
    }

    /// Deactivate protection and join the sentinel thread. Idempotent; safe
    /// to call from any state.
    pub fn stop(&mut self) {
        if self.state != ControllerState::Active {
            return;
        }
        self.state = ControllerState::ShuttingDown;
        self.sentinel.stop_monitoring();
        self.state = ControllerState::Inactive;
        info!("runtime protection stopped");
    }

    /// Record the shutdown and terminate the process. Never returns.
    pub fn fail_closed(&mut self, reason: &str) -> ! {
        self.state = ControllerState::ShuttingDown;
        self.sentinel.stop_monitoring();
        fail_closed_with(&self.log, reason)
    }
}

impl Drop for ProtectionController {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Terminal threat response: one final event, then immediate process exit.
/// Free function so the sentinel's detection callback can invoke it without
/// holding a controller reference.
pub(crate) fn fail_closed_with(log: &SecurityEventLog, reason: &str) -> ! {
    log.append(SecurityEvent::new(
        EventKind::FailClosedShutdown,
        Severity::Critical,
        format!("terminating process: {}", reason),
    ));
    error!(reason, "fail-closed shutdown");
    std::process::exit(1);
}
