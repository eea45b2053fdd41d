//! Memory collector.
//!
//! Single source: the flat key/value counter table in /proc/meminfo.
//! `used` prefers `MemAvailable` (kernel >= 3.14); older kernels fall back
//! to `total - free - buffers - cached`.

use std::path::Path;

use crate::core::stats::MemoryStats;
use crate::core::units::{kb_to_gb, percent_of};
use crate::error::{Result, VigilError};
use crate::platform::CapabilitySet;

use super::read_source;

/// Raw counters in kilobytes, as /proc/meminfo reports them.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub(crate) struct MemCounters {
    pub total: u64,
    pub free: u64,
    pub available: Option<u64>,
    pub buffers: u64,
    pub cached: u64,
    pub swap_total: u64,
    pub swap_free: u64,
}

impl MemCounters {
    pub fn used(&self) -> u64 {
        match self.available {
            Some(available) => self.total.saturating_sub(available),
            None => self
                .total
                .saturating_sub(self.free)
                .saturating_sub(self.buffers)
                .saturating_sub(self.cached),
        }
    }

    pub fn available_or_derived(&self) -> u64 {
        self.available
            .unwrap_or_else(|| self.total.saturating_sub(self.used()))
    }

    pub fn swap_used(&self) -> u64 {
        self.swap_total.saturating_sub(self.swap_free)
    }
}

pub async fn collect(caps: &CapabilitySet) -> MemoryStats {
    if !caps.procfs {
        return MemoryStats::default();
    }

    match read_source(Path::new("/proc/meminfo")).and_then(|c| parse_meminfo(&c)) {
        Ok(counters) => to_stats(&counters),
        Err(e) => {
            log::debug!("meminfo unavailable: {}", e);
            MemoryStats::default()
        }
    }
}

pub(crate) fn to_stats(c: &MemCounters) -> MemoryStats {
    MemoryStats {
        total: kb_to_gb(c.total),
        used: kb_to_gb(c.used()),
        available: kb_to_gb(c.available_or_derived()),
        cached: kb_to_gb(c.cached),
        percent: percent_of(c.used(), c.total),
        swap_used: kb_to_gb(c.swap_used()),
    }
}

pub(crate) fn parse_meminfo(content: &str) -> Result<MemCounters> {
    let mut counters = MemCounters::default();
    let mut saw_total = false;

    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        // Values are "<n> kB"; take the first numeric token
        let Some(value) = rest.split_whitespace().next().and_then(|t| t.parse::<u64>().ok())
        else {
            continue;
        };
        match key.trim() {
            "MemTotal" => {
                counters.total = value;
                saw_total = true;
            }
            "MemFree" => counters.free = value,
            "MemAvailable" => counters.available = Some(value),
            "Buffers" => counters.buffers = value,
            "Cached" => counters.cached = value,
            "SwapTotal" => counters.swap_total = value,
            "SwapFree" => counters.swap_free = value,
            _ => {}
        }
    }

    if !saw_total {
        return Err(VigilError::parse("meminfo has no MemTotal line"));
    }
    Ok(counters)
}
