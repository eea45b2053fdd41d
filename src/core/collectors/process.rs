//! Process collector.
//!
//! Counts all processes and those actually in the running state. Primary
//! strategy scans /proc numeric entries and reads each state field; the
//! fallback uses the running/total summary in /proc/loadavg.

use std::path::Path;

use crate::core::stats::ProcessStats;
use crate::error::{Result, VigilError};
use crate::platform::CapabilitySet;

use super::read_source;

pub async fn collect(caps: &CapabilitySet) -> ProcessStats {
    if !caps.procfs {
        return ProcessStats::default();
    }

    match scan_proc(Path::new("/proc")) {
        Ok(stats) => return stats,
        Err(e) => log::debug!("proc scan failed: {}", e),
    }

    match read_source(Path::new("/proc/loadavg")).and_then(|c| parse_loadavg_counts(&c)) {
        Ok(stats) => stats,
        Err(e) => {
            log::debug!("loadavg process counts unavailable: {}", e);
            ProcessStats::default()
        }
    }
}

/// Walk /proc counting numeric entries; a process that vanishes between the
/// directory listing and the stat read is simply not counted as running.
pub(crate) fn scan_proc(root: &Path) -> Result<ProcessStats> {
    let entries = std::fs::read_dir(root)
        .map_err(|e| VigilError::source_unavailable(format!("{}: {}", root.display(), e)))?;

    let mut total = 0u32;
    let mut running = 0u32;

    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        total += 1;

        if let Ok(stat) = std::fs::read_to_string(entry.path().join("stat")) {
            if parse_stat_state(&stat) == Some('R') {
                running += 1;
            }
        }
    }

    if total == 0 {
        return Err(VigilError::source_unavailable("no process entries found"));
    }

    Ok(ProcessStats { total, running })
}

/// State field of /proc/<pid>/stat. The comm field may itself contain
/// spaces and parentheses, so the state is the first token after the last
/// closing parenthesis.
pub(crate) fn parse_stat_state(stat: &str) -> Option<char> {
    let after = &stat[stat.rfind(')')? + 1..];
    after.split_whitespace().next()?.chars().next()
}

/// running/total from the fourth field of /proc/loadavg ("2/345").
pub(crate) fn parse_loadavg_counts(content: &str) -> Result<ProcessStats> {
    let field = content
        .split_whitespace()
        .nth(3)
        .ok_or_else(|| VigilError::parse("loadavg has no process field"))?;
    let (running, total) = field
        .split_once('/')
        .ok_or_else(|| VigilError::parse("loadavg process field is not x/y"))?;

    Ok(ProcessStats {
        running: running
            .parse()
            .map_err(|_| VigilError::parse("non-numeric running count"))?,
        total: total
            .parse()
            .map_err(|_| VigilError::parse("non-numeric total count"))?,
    })
}
