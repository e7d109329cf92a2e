use std::ops::Range;
use std::sync::Arc;

use crate::errors::{RaspError, RaspResult};
use crate::event_log::{EventKind, SecurityEvent, SecurityEventLog, Severity};
use crate::platform::{host_image, ProcessImage};

/// Best-effort detection of import-table tampering: counts resolved import
/// slots whose target address lies outside every executable mapping. Covers
/// GOT/IAT-style redirection, not every hooking technique.
pub struct HookScanner {
    log: Arc<SecurityEventLog>,
}

impl HookScanner {
    pub fn new(log: Arc<SecurityEventLog>) -> Self {
        Self { log }
    }

    /// Walk the import slots of the running executable. A count above zero
    /// emits one aggregated critical event; the policy decision belongs to
    /// the caller.
    pub fn scan_imports(&self) -> RaspResult<usize> {
        self.scan_imports_with(&host_image())
    }

    pub fn scan_imports_with(&self, image: &impl ProcessImage) -> RaspResult<usize> {
        let ranges = image.executable_ranges().map_err(RaspError::Image)?;
        let targets = image.import_slot_targets().map_err(RaspError::Image)?;

        let count = count_redirected_slots(&targets, &ranges);
        if count > 0 {
            self.log.append(SecurityEvent::new(
                EventKind::HookDetected,
                Severity::Critical,
                format!("import table hooks detected: {} redirected entries", count),
            ));
        }
        Ok(count)
    }
}

/// Slots holding zero are unresolved lazy-binding entries and clean by
/// definition; anything else must point into executable memory.
pub fn count_redirected_slots(targets: &[usize], executable_ranges: &[Range<usize>]) -> usize {
    targets
        .iter()
        .filter(|&&target| {
            target != 0 && !executable_ranges.iter().any(|range| range.contains(&target))
        })
        .count()
}
