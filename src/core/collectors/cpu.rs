//! CPU collector.
//!
//! Usage chain: mpstat per-core sampling, then a single `top` batch sample,
//! then load average scaled by core count. Whichever strategy wins, the
//! result is an integer percent in [0, 100].
//!
//! Temperature sub-chain: a labeled `sensors` line, then a thermal-zone scan,
//! then the "N/A" sentinel.

use std::path::Path;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::stats::{CpuStats, Reading};
use crate::core::units::{clamp_percent, normalize_temp, percent_round};
use crate::error::{Result, VigilError};
use crate::platform::{run_tool, CapabilitySet};

use super::{read_source, read_value};

/// Thermal-zone type labels that identify a CPU-adjacent sensor.
const CPU_ZONE_TYPES: &[&str] = &["x86_pkg_temp", "cpu", "tctl", "tdie", "soc", "tsens", "acpitz"];

static SENSORS_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)cpu|package|tctl").expect("static regex"));
static SENSORS_TEMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([+-]?\d+(?:\.\d+)?)\s*°C").expect("static regex"));

pub async fn collect(caps: &CapabilitySet, timeout: Duration) -> CpuStats {
    let (model, cores) = match read_source(Path::new("/proc/cpuinfo")) {
        Ok(content) => parse_cpuinfo(&content),
        Err(e) => {
            log::debug!("cpuinfo unavailable: {}", e);
            ("N/A".to_string(), 0)
        }
    };

    let current = collect_usage(caps, cores, timeout).await;
    let temperature = collect_temperature(caps, timeout).await;

    CpuStats {
        current,
        model,
        cores,
        temperature,
        ..CpuStats::default()
    }
}

/// Run the usage fallback chain. Exhaustion yields 0.
async fn collect_usage(caps: &CapabilitySet, cores: u32, timeout: Duration) -> u8 {
    if caps.mpstat {
        match run_tool("mpstat", &["1", "1"], timeout).await {
            Ok(out) => match parse_mpstat_idle(&out) {
                Ok(idle) => return percent_round(100.0 - idle),
                Err(e) => log::debug!("mpstat output not usable: {}", e),
            },
            Err(e) => log::debug!("mpstat failed: {}", e),
        }
    }

    if caps.top {
        match run_tool("top", &["-bn1"], timeout).await {
            Ok(out) => match parse_top_idle(&out) {
                Ok(idle) => return percent_round(100.0 - idle),
                Err(e) => log::debug!("top output not usable: {}", e),
            },
            Err(e) => log::debug!("top failed: {}", e),
        }
    }

    // Last resort: one-minute load scaled by core count. Coarse, but it
    // needs nothing beyond procfs.
    if caps.procfs {
        if let Ok(content) = read_source(Path::new("/proc/loadavg")) {
            if let Ok((load1, _, _)) = parse_loadavg(&content) {
                return load_to_percent(load1, cores);
            }
        }
    }

    0
}

async fn collect_temperature(caps: &CapabilitySet, timeout: Duration) -> Reading {
    if caps.sensors {
        match run_tool("sensors", &[], timeout).await {
            Ok(out) => {
                if let Some(temp) = parse_sensors_cpu_temp(&out) {
                    return Reading::Value(temp);
                }
            }
            Err(e) => log::debug!("sensors failed: {}", e),
        }
    }

    if caps.thermal {
        if let Some(temp) = scan_thermal_zones(Path::new("/sys/class/thermal"), CPU_ZONE_TYPES) {
            return Reading::Value(temp);
        }
    }

    Reading::Unavailable
}

/// Model name and logical core count from /proc/cpuinfo.
pub(crate) fn parse_cpuinfo(content: &str) -> (String, u32) {
    let mut model = None;
    let mut cores = 0u32;

    for line in content.lines() {
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            if key == "processor" {
                cores += 1;
            } else if model.is_none() && (key == "model name" || key == "Hardware") {
                // "Hardware" carries the SoC name on older Android kernels
                model = Some(value.trim().to_string());
            }
        }
    }

    (model.unwrap_or_else(|| "N/A".to_string()), cores)
}

/// Idle percentage from `mpstat 1 1` output: the "all" row, last column.
pub(crate) fn parse_mpstat_idle(output: &str) -> Result<f64> {
    for line in output.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if !tokens.iter().any(|t| *t == "all") {
            continue;
        }
        if let Some(last) = tokens.last() {
            // Some locales print a decimal comma
            if let Ok(idle) = last.replace(',', ".").parse::<f64>() {
                return Ok(clamp_percent(idle));
            }
        }
    }
    Err(VigilError::parse("no 'all' row with a numeric idle column"))
}

/// Idle percentage from the `%Cpu(s)` summary row of `top -bn1`.
pub(crate) fn parse_top_idle(output: &str) -> Result<f64> {
    for line in output.lines() {
        if !line.contains("Cpu(s)") {
            continue;
        }
        // "%Cpu(s):  1.2 us, ..., 97.3 id, ..." - the number preceding "id"
        for part in line.split(',') {
            let part = part.trim();
            if let Some(value) = part.strip_suffix("id") {
                if let Ok(idle) = value.trim().replace(',', ".").parse::<f64>() {
                    return Ok(clamp_percent(idle));
                }
            }
        }
    }
    Err(VigilError::parse("no Cpu(s) row with an id column"))
}

/// The three load averages from /proc/loadavg.
pub(crate) fn parse_loadavg(content: &str) -> Result<(f64, f64, f64)> {
    let mut it = content.split_whitespace();
    let l1 = it.next().and_then(|t| t.parse().ok());
    let l5 = it.next().and_then(|t| t.parse().ok());
    let l15 = it.next().and_then(|t| t.parse().ok());
    match (l1, l5, l15) {
        (Some(a), Some(b), Some(c)) => Ok((a, b, c)),
        _ => Err(VigilError::parse("loadavg did not have three numeric fields")),
    }
}

/// Approximate usage from the one-minute load, clamped to [0, 100].
pub(crate) fn load_to_percent(load1: f64, cores: u32) -> u8 {
    let cores = cores.max(1);
    percent_round(clamp_percent(load1 / cores as f64 * 100.0))
}

/// First temperature on a `sensors` line whose label looks CPU-related.
pub(crate) fn parse_sensors_cpu_temp(output: &str) -> Option<f64> {
    for line in output.lines() {
        let Some((label, rest)) = line.split_once(':') else {
            continue;
        };
        if !SENSORS_LABEL_RE.is_match(label) {
            continue;
        }
        if let Some(cap) = SENSORS_TEMP_RE.captures(rest) {
            if let Ok(temp) = cap[1].parse::<f64>() {
                return Some(temp);
            }
        }
    }
    None
}

/// Scan thermal zones for one whose type label matches a candidate, and
/// return its normalized reading in degrees.
pub(crate) fn scan_thermal_zones(root: &Path, candidates: &[&str]) -> Option<f64> {
    let mut zones: Vec<_> = std::fs::read_dir(root)
        .ok()?
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().starts_with("thermal_zone"))
        .map(|e| e.path())
        .collect();
    zones.sort();

    for zone in zones {
        let Ok(zone_type) = read_value(&zone.join("type")) else {
            continue;
        };
        let zone_type = zone_type.to_lowercase();
        if !candidates.iter().any(|c| zone_type.contains(c)) {
            continue;
        }
        let Ok(raw) = read_value(&zone.join("temp")) else {
            continue;
        };
        if let Ok(value) = raw.parse::<f64>() {
            return Some(normalize_temp(value));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const MPSTAT_OUTPUT: &str = "\
Linux 6.8.0-41-generic (host) \t08/06/26 \t_x86_64_\t(8 CPU)

12:00:01     CPU    %usr   %nice    %sys %iowait    %irq   %soft  %steal  %guest  %gnice   %idle
12:00:02     all    9.50    0.00    2.50    0.12    0.00    0.25    0.00    0.00    0.00   87.63
Average:     all    9.50    0.00    2.50    0.12    0.00    0.25    0.00    0.00    0.00   87.63
";

    #[test]
    fn test_parse_mpstat_idle() {
        let idle = parse_mpstat_idle(MPSTAT_OUTPUT).unwrap();
        assert_eq!(idle, 87.63);
        assert_eq!(percent_round(100.0 - idle), 12);
    }

    #[test]
    fn test_parse_mpstat_decimal_comma() {
        let out = "12:00:02     all    9,50    0,00    2,50    0,12    0,00    0,25    0,00    0,00    0,00   87,63\n";
        assert_eq!(parse_mpstat_idle(out).unwrap(), 87.63);
    }

    #[test]
    fn test_parse_mpstat_garbage() {
        assert!(parse_mpstat_idle("no such rows here\n").is_err());
    }

    #[test]
    fn test_parse_top_idle() {
        let out = "top - 12:00:03 up 10 days\n\
                   %Cpu(s):  1.2 us,  0.3 sy,  0.0 ni, 97.3 id,  1.0 wa,  0.0 hi,  0.2 si,  0.0 st\n";
        assert_eq!(parse_top_idle(out).unwrap(), 97.3);
    }

    #[test]
    fn test_parse_top_idle_missing() {
        assert!(parse_top_idle("MiB Mem :  15843.3 total\n").is_err());
    }

    #[test]
    fn test_load_fallback_scaling() {
        // load 2.0 over 4 cores = 50%
        let (l1, _, _) = parse_loadavg("2.0 1.5 1.0 2/345 12345\n").unwrap();
        assert_eq!(load_to_percent(l1, 4), 50);
    }

    #[test]
    fn test_load_fallback_clamps() {
        assert_eq!(load_to_percent(9.0, 2), 100);
        assert_eq!(load_to_percent(0.0, 8), 0);
        // zero core count must not divide by zero
        assert_eq!(load_to_percent(1.0, 0), 100);
    }

    #[test]
    fn test_parse_cpuinfo() {
        let content = "\
processor\t: 0
model name\t: AMD Ryzen 7 5800X 8-Core Processor
processor\t: 1
model name\t: AMD Ryzen 7 5800X 8-Core Processor
";
        let (model, cores) = parse_cpuinfo(content);
        assert_eq!(model, "AMD Ryzen 7 5800X 8-Core Processor");
        assert_eq!(cores, 2);
    }

    #[test]
    fn test_parse_cpuinfo_android_hardware_line() {
        let content = "processor\t: 0\nHardware\t: Qualcomm Technologies, Inc SM8250\n";
        let (model, cores) = parse_cpuinfo(content);
        assert_eq!(model, "Qualcomm Technologies, Inc SM8250");
        assert_eq!(cores, 1);
    }

    #[test]
    fn test_parse_sensors_cpu_temp() {
        let out = "\
k10temp-pci-00c3
Adapter: PCI adapter
Tctl:         +54.1°C
Tdie:         +44.1°C

nvme-pci-0100
Composite:    +38.9°C
";
        assert_eq!(parse_sensors_cpu_temp(out), Some(54.1));
    }

    #[test]
    fn test_parse_sensors_package_label() {
        let out = "coretemp-isa-0000\nPackage id 0:  +45.0°C  (high = +80.0°C)\n";
        assert_eq!(parse_sensors_cpu_temp(out), Some(45.0));
    }

    #[test]
    fn test_parse_sensors_no_cpu_line() {
        let out = "nvme-pci-0100\nComposite:    +38.9°C\n";
        assert_eq!(parse_sensors_cpu_temp(out), None);
    }

    #[test]
    fn test_scan_thermal_zones_millidegrees() {
        let dir = tempfile::tempdir().unwrap();
        let zone = dir.path().join("thermal_zone0");
        fs::create_dir_all(&zone).unwrap();
        fs::write(zone.join("type"), "x86_pkg_temp\n").unwrap();
        fs::write(zone.join("temp"), "45000\n").unwrap();

        assert_eq!(scan_thermal_zones(dir.path(), CPU_ZONE_TYPES), Some(45.0));
    }

    #[test]
    fn test_scan_thermal_zones_whole_degrees() {
        let dir = tempfile::tempdir().unwrap();
        let zone = dir.path().join("thermal_zone1");
        fs::create_dir_all(&zone).unwrap();
        fs::write(zone.join("type"), "cpu-0-0\n").unwrap();
        fs::write(zone.join("temp"), "45\n").unwrap();

        assert_eq!(scan_thermal_zones(dir.path(), CPU_ZONE_TYPES), Some(45.0));
    }

    #[test]
    fn test_scan_thermal_zones_skips_unrelated_types() {
        let dir = tempfile::tempdir().unwrap();
        let zone = dir.path().join("thermal_zone0");
        fs::create_dir_all(&zone).unwrap();
        fs::write(zone.join("type"), "battery\n").unwrap();
        fs::write(zone.join("temp"), "30000\n").unwrap();

        assert_eq!(scan_thermal_zones(dir.path(), CPU_ZONE_TYPES), None);
    }
}
