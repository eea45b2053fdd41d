//! Health classification of a snapshot.
//!
//! A pure function of the current metrics; it carries no memory of previous
//! polls. Thresholds are named configuration, not inline constants.

use super::config::HealthThresholds;
use super::stats::{HealthLevel, Snapshot};

/// Classify overall health from the usage percentages of one snapshot.
///
/// Critical when CPU crosses its critical threshold; Warning when CPU,
/// memory or the root disk cross their warning thresholds; Good otherwise.
pub fn classify_health(cpu: u8, memory: u8, disk: u8, t: &HealthThresholds) -> HealthLevel {
    if cpu >= t.cpu_critical {
        HealthLevel::Critical
    } else if cpu >= t.cpu_warning || memory >= t.memory_warning || disk >= t.disk_warning {
        HealthLevel::Warning
    } else {
        HealthLevel::Good
    }
}

/// Convenience wrapper classifying a fully assembled snapshot.
pub fn classify_snapshot(snapshot: &Snapshot, t: &HealthThresholds) -> HealthLevel {
    classify_health(
        snapshot.cpu.current,
        snapshot.memory.percent,
        snapshot.disk.percent,
        t,
    )
}
