//! Domain collectors.
//!
//! Each collector exposes `collect(..) -> DomainStats` and internally runs an
//! ordered fallback chain over its raw sources: a strategy that is
//! capability-gated off, times out, or produces unparsable output advances
//! the chain, and exhaustion yields the domain's sentinel defaults. Nothing
//! in here ever fails past the collector boundary.

pub mod cpu;
pub mod disk;
pub mod gpu;
pub mod memory;
pub mod network;
pub mod power;
pub mod process;

use std::path::Path;

use crate::error::{Result, VigilError};

/// Read a pseudo-file, classifying the error so callers can tell an absent
/// source from a permission-blocked one.
pub(crate) fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            VigilError::source_unavailable(format!("{} does not exist", path.display()))
        }
        std::io::ErrorKind::PermissionDenied => {
            VigilError::permission_denied(path.display().to_string())
        }
        _ => VigilError::Io(e),
    })
}

/// Read and trim a single-value pseudo-file (sysfs convention).
pub(crate) fn read_value(path: &Path) -> Result<String> {
    Ok(read_source(path)?.trim().to_string())
}
