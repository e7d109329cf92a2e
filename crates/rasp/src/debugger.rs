use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::warn;

use crate::event_log::{EventKind, SecurityEvent, SecurityEventLog, Severity};

/// One-shot attach-state probe. Returns the tracer's pid when a debugger is
/// attached to this process.
#[cfg(target_os = "linux")]
pub fn detect_once() -> Option<u32> {
    match std::fs::read_to_string("/proc/self/status") {
        Ok(status) => tracer_pid_from_status(&status).filter(|pid| *pid > 0),
        Err(err) => {
            warn!(error = %err, "tracer pid probe failed");
            None
        }
    }
}

/// Platforms without a native probe honor an explicit simulation override so
/// operators and tests can exercise the detection path; they never report a
/// false positive on their own.
#[cfg(not(target_os = "linux"))]
pub fn detect_once() -> Option<u32> {
    let simulated = std::env::var("TEAMCORE_SIMULATE_DEBUGGER")
        .map(|raw| {
            matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(false);
    simulated.then_some(0)
}

/// Extract the `TracerPid` field from `/proc/<pid>/status` content. A pid of
/// zero means no tracer; a missing or unparseable field yields `None`.
pub fn tracer_pid_from_status(status: &str) -> Option<u32> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("TracerPid:"))
        .and_then(|raw| raw.trim().parse::<u32>().ok())
}

/// Continuous debugger monitoring on a single background thread. The loop
/// sleeps for the configured interval and re-checks a stop flag on every
/// wake, so `stop_monitoring` latency is bounded by roughly one interval and
/// the join guarantees no detection callback fires after it returns.
pub struct DebuggerSentinel {
    log: Arc<SecurityEventLog>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl DebuggerSentinel {
    pub fn new(log: Arc<SecurityEventLog>) -> Self {
        Self {
            log,
            stop: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.handle.is_some()
    }

    /// Launch the monitoring loop. A second start without an intervening
    /// stop is a warned no-op, never an error.
    pub fn start_monitoring<F>(&mut self, interval: Duration, on_detected: F)
    where
        F: Fn(u32) + Send + 'static,
    {
        if self.handle.is_some() {
            warn!("debugger monitoring is already running");
            return;
        }

        self.stop.store(false, Ordering::SeqCst);
        let stop = Arc::clone(&self.stop);
        let log = Arc::clone(&self.log);

        self.handle = Some(std::thread::spawn(move || {
            while !stop.load(Ordering::SeqCst) {
                std::thread::sleep(interval);
                if stop.load(Ordering::SeqCst) {
                    break;
                }
                if let Some(pid) = detect_once() {
                    log.append(SecurityEvent::new(
                        EventKind::DebuggerDetected,
                        Severity::Critical,
                        format!("runtime debugger detected (tracer pid {})", pid),
                    ));
                    on_detected(pid);
                }
            }
        }));
    }

    /// Stop and join the monitoring loop. Idempotent; returns only after the
    /// background thread has fully exited.
    pub fn stop_monitoring(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("debugger monitoring thread panicked before join");
            }
        }
    }
}

impl Drop for DebuggerSentinel {
    fn drop(&mut self) {
        self.stop_monitoring();
    }
}
