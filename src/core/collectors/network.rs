//! Network collector.
//!
//! Per-interface counters from /proc/net/dev (loopback excluded), operstate
//! from sysfs, and best-effort IPv4 resolution through the `ip` tool.
//! Rates are not computed here; the assembler derives them from consecutive
//! polls.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::core::stats::{InterfaceStats, NetworkStats};
use crate::platform::{run_tool, CapabilitySet};

use super::{read_source, read_value};

pub async fn collect(caps: &CapabilitySet, timeout: Duration) -> NetworkStats {
    if !caps.procfs {
        return NetworkStats::default();
    }

    let content = match read_source(Path::new("/proc/net/dev")) {
        Ok(content) => content,
        Err(e) => {
            log::debug!("net/dev unavailable: {}", e);
            return NetworkStats::default();
        }
    };

    let mut interfaces = parse_net_dev(&content);

    if caps.net_sysfs {
        for iface in &mut interfaces {
            if let Ok(state) = read_value(&operstate_path(&iface.name)) {
                iface.status = state;
            }
        }
    }

    // Address resolution is optional; interfaces stay "N/A" without it.
    if caps.ip {
        match run_tool("ip", &["-4", "-o", "addr", "show"], timeout).await {
            Ok(out) => {
                let addrs = parse_ip_addr_output(&out);
                for iface in &mut interfaces {
                    if let Some(addr) = addrs.get(&iface.name) {
                        iface.ipv4 = addr.clone();
                    }
                }
            }
            Err(e) => log::debug!("ip addr failed: {}", e),
        }
    }

    let rx_total = interfaces.iter().map(|i| i.rx_bytes).sum();
    let tx_total = interfaces.iter().map(|i| i.tx_bytes).sum();

    NetworkStats {
        rx_total,
        tx_total,
        rx_rate: 0,
        tx_rate: 0,
        interfaces,
    }
}

fn operstate_path(interface: &str) -> std::path::PathBuf {
    Path::new("/sys/class/net").join(interface).join("operstate")
}

/// Per-interface counters from /proc/net/dev, loopback excluded, ordered by
/// interface name.
pub(crate) fn parse_net_dev(content: &str) -> Vec<InterfaceStats> {
    let mut interfaces: Vec<InterfaceStats> = content
        .lines()
        .skip(2) // two header lines
        .filter_map(|line| {
            let (name, counters) = line.split_once(':')?;
            let name = name.trim();
            if name == "lo" {
                return None;
            }
            let fields: Vec<u64> = counters
                .split_whitespace()
                .map(|t| t.parse().unwrap_or(0))
                .collect();
            // rx: bytes packets errs drop ... (8 fields), then tx the same
            if fields.len() < 16 {
                return None;
            }
            Some(InterfaceStats {
                name: name.to_string(),
                rx_bytes: fields[0],
                rx_packets: fields[1],
                rx_errors: fields[2],
                rx_dropped: fields[3],
                tx_bytes: fields[8],
                tx_packets: fields[9],
                ..InterfaceStats::default()
            })
        })
        .collect();
    interfaces.sort_by(|a, b| a.name.cmp(&b.name));
    interfaces
}

/// Interface -> dotted-quad map from `ip -4 -o addr show` output.
pub(crate) fn parse_ip_addr_output(output: &str) -> HashMap<String, String> {
    let mut addrs = HashMap::new();
    for line in output.lines() {
        // "2: eth0    inet 192.168.1.5/24 brd ..."
        let mut it = line.split_whitespace();
        let _index = it.next();
        let Some(name) = it.next() else { continue };
        let mut rest = it;
        while let Some(token) = rest.next() {
            if token == "inet" {
                if let Some(cidr) = rest.next() {
                    let addr = cidr.split('/').next().unwrap_or(cidr);
                    // first address wins when an interface has several
                    addrs
                        .entry(name.trim_end_matches(':').to_string())
                        .or_insert_with(|| addr.to_string());
                }
                break;
            }
        }
    }
    addrs
}

#[cfg(test)]
mod tests {
    use super::*;

    const NET_DEV: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 1000000    5000    0    0    0     0          0         0  1000000    5000    0    0    0     0       0          0
  eth0: 123456789  98765    2    1    0     0          0         0  23456789  45678    0    0    0     0       0          0
 wlan0: 5555555     4444    0    0    0     0          0         0   333333    2222    0    0    0     0       0          0
";

    #[test]
    fn test_parse_net_dev_excludes_loopback() {
        let ifaces = parse_net_dev(NET_DEV);
        assert_eq!(ifaces.len(), 2);
        assert!(ifaces.iter().all(|i| i.name != "lo"));
    }

    #[test]
    fn test_parse_net_dev_counters_and_order() {
        let ifaces = parse_net_dev(NET_DEV);
        assert_eq!(ifaces[0].name, "eth0");
        assert_eq!(ifaces[0].rx_bytes, 123_456_789);
        assert_eq!(ifaces[0].rx_packets, 98_765);
        assert_eq!(ifaces[0].rx_errors, 2);
        assert_eq!(ifaces[0].rx_dropped, 1);
        assert_eq!(ifaces[0].tx_bytes, 23_456_789);
        assert_eq!(ifaces[0].tx_packets, 45_678);
        assert_eq!(ifaces[1].name, "wlan0");
    }

    #[test]
    fn test_parse_net_dev_sentinel_fields() {
        let ifaces = parse_net_dev(NET_DEV);
        // status and ipv4 are filled by other sources; sentinel until then
        assert_eq!(ifaces[0].status, "N/A");
        assert_eq!(ifaces[0].ipv4, "N/A");
    }

    #[test]
    fn test_aggregate_totals() {
        let ifaces = parse_net_dev(NET_DEV);
        let rx: u64 = ifaces.iter().map(|i| i.rx_bytes).sum();
        assert_eq!(rx, 123_456_789 + 5_555_555);
    }

    #[test]
    fn test_parse_ip_addr_output() {
        let out = "\
1: lo    inet 127.0.0.1/8 scope host lo\\       valid_lft forever
2: eth0    inet 192.168.1.5/24 brd 192.168.1.255 scope global dynamic eth0\\       valid_lft 85999sec
";
        let addrs = parse_ip_addr_output(out);
        assert_eq!(addrs.get("eth0").map(String::as_str), Some("192.168.1.5"));
        assert_eq!(addrs.get("lo").map(String::as_str), Some("127.0.0.1"));
    }

    #[test]
    fn test_parse_ip_addr_first_address_wins() {
        let out = "2: eth0 inet 10.0.0.2/24 ...\n2: eth0 inet 10.0.0.3/24 ...\n";
        let addrs = parse_ip_addr_output(out);
        assert_eq!(addrs.get("eth0").map(String::as_str), Some("10.0.0.2"));
    }
}
