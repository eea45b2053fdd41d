//! Snapshot assembly.
//!
//! Fans out to every domain collector, merges the results, classifies
//! health and stamps the snapshot. One assembler owns one polling session:
//! the rolling CPU history and the previous network counters live here,
//! and `&mut self` keeps at most one assembly in flight per session.

use std::path::Path;
use std::time::Instant;

use chrono::{TimeZone, Utc};

use crate::core::collectors::{self, cpu, disk, gpu, memory, network, power, process};
use crate::core::config::VigilConfig;
use crate::core::health::classify_health;
use crate::core::history::SampleHistory;
use crate::core::stats::{NetworkStats, Snapshot};
use crate::platform::{CapabilitySet, PlatformInfo};

struct NetSample {
    taken_at: Instant,
    rx_total: u64,
    tx_total: u64,
}

pub struct SnapshotAssembler {
    platform: &'static PlatformInfo,
    caps: CapabilitySet,
    config: VigilConfig,
    history: SampleHistory,
    last_net: Option<NetSample>,
}

impl SnapshotAssembler {
    pub fn new(platform: &'static PlatformInfo, caps: CapabilitySet, config: VigilConfig) -> Self {
        let history = SampleHistory::with_capacity(config.history_capacity);
        Self {
            platform,
            caps,
            config,
            history,
            last_net: None,
        }
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.caps
    }

    /// Replace the capability set, e.g. after a user-triggered re-probe.
    pub fn set_capabilities(&mut self, caps: CapabilitySet) {
        self.caps = caps;
    }

    /// Assemble one complete snapshot.
    ///
    /// Collectors run concurrently and independently; each degrades to its
    /// sentinel defaults on its own, so assembly as a whole cannot fail.
    /// Dropping the returned future abandons the poll at the next await
    /// point and kills any in-flight external tools.
    pub async fn assemble(&mut self) -> Snapshot {
        let timeout = self.config.tool_timeout();

        let (mut cpu, memory, disk, mut net, gpu, battery, processes) = tokio::join!(
            cpu::collect(&self.caps, timeout),
            memory::collect(&self.caps),
            disk::collect(&self.caps),
            network::collect(&self.caps, timeout),
            gpu::collect(&self.caps, timeout),
            power::collect(&self.caps, self.platform, timeout),
            process::collect(&self.caps),
        );

        let now = Utc::now();
        let timestamp = now.timestamp();

        self.history.push(cpu.current, now.format("%H:%M:%S").to_string());
        cpu.history = self.history.samples();
        cpu.timestamps = self.history.timestamps();
        cpu.avg = self.history.avg();
        cpu.max = self.history.max();
        cpu.min = self.history.min();

        self.derive_network_rates(&mut net);

        let health = classify_health(
            cpu.current,
            memory.percent,
            disk.percent,
            &self.config.thresholds,
        );

        Snapshot {
            timestamp,
            hostname: read_hostname(),
            kernel: self.platform.kernel.clone(),
            uptime: read_uptime(),
            load_avg: read_load_avg(),
            health,
            cpu,
            memory,
            disk,
            network: net,
            gpu,
            battery,
            processes,
        }
    }

    /// Rates come from the counter delta against the previous poll of this
    /// session; the first poll reports 0.
    fn derive_network_rates(&mut self, net: &mut NetworkStats) {
        let now = Instant::now();
        if let Some(prev) = &self.last_net {
            let elapsed = now.duration_since(prev.taken_at).as_secs_f64();
            if elapsed > 0.0 {
                net.rx_rate =
                    (net.rx_total.saturating_sub(prev.rx_total) as f64 / elapsed) as u64;
                net.tx_rate =
                    (net.tx_total.saturating_sub(prev.tx_total) as f64 / elapsed) as u64;
            }
        }
        self.last_net = Some(NetSample {
            taken_at: now,
            rx_total: net.rx_total,
            tx_total: net.tx_total,
        });
    }
}

fn read_hostname() -> String {
    collectors::read_value(Path::new("/proc/sys/kernel/hostname"))
        .unwrap_or_else(|_| "unknown".to_string())
}

fn read_uptime() -> u64 {
    collectors::read_source(Path::new("/proc/uptime"))
        .ok()
        .and_then(|c| parse_uptime(&c))
        .unwrap_or(0)
}

fn read_load_avg() -> [f64; 3] {
    collectors::read_source(Path::new("/proc/loadavg"))
        .ok()
        .and_then(|c| cpu::parse_loadavg(&c).ok())
        .map(|(a, b, c)| [a, b, c])
        .unwrap_or([0.0, 0.0, 0.0])
}

fn parse_uptime(content: &str) -> Option<u64> {
    content
        .split_whitespace()
        .next()?
        .parse::<f64>()
        .ok()
        .map(|secs| secs as u64)
}

/// Format a snapshot timestamp for display and log output.
pub fn format_timestamp(timestamp: i64) -> String {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "1970-01-01 00:00:00".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uptime() {
        assert_eq!(parse_uptime("354892.12 1423082.55\n"), Some(354_892));
        assert_eq!(parse_uptime("garbage\n"), None);
    }

    #[test]
    fn test_format_timestamp_stable() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00");
        assert_eq!(format_timestamp(1_754_438_400), "2025-08-06 00:00:00");
    }
}
