//! GPU collector.
//!
//! Vendor chain: the NVIDIA query tool (rich metrics), then the Adreno kgsl
//! sysfs node (busy percent and clock only), then a generic PCI scan that
//! yields a device name with `available = false`. Consumers must check
//! `available` before reading the live metric fields.

use std::path::Path;
use std::time::Duration;

use crate::core::stats::{GpuStats, Reading};
use crate::core::units::percent_round;
use crate::error::{Result, VigilError};
use crate::platform::{run_tool, CapabilitySet, GpuVendor};

use super::read_value;

const NVIDIA_QUERY: &str = "name,utilization.gpu,temperature.gpu,memory.used,memory.total,fan.speed,power.draw,clocks.gr,pcie.link.gen.current,pcie.link.width.current";

const KGSL_ROOT: &str = "/sys/class/kgsl/kgsl-3d0";

pub async fn collect(caps: &CapabilitySet, timeout: Duration) -> GpuStats {
    match caps.gpu_vendor {
        GpuVendor::Nvidia => match collect_nvidia(timeout).await {
            Ok(stats) => return stats,
            Err(e) => log::debug!("nvidia query failed: {}", e),
        },
        GpuVendor::Adreno => {
            if let Ok(stats) = collect_adreno(Path::new(KGSL_ROOT)) {
                return stats;
            }
        }
        GpuVendor::None => {}
    }

    // Generic bus scan: name only, no live metrics.
    if caps.lspci {
        match run_tool("lspci", &[], timeout).await {
            Ok(out) => {
                if let Some(name) = parse_lspci_gpu_name(&out) {
                    return GpuStats {
                        name,
                        ..GpuStats::default()
                    };
                }
            }
            Err(e) => log::debug!("lspci failed: {}", e),
        }
    }

    GpuStats::default()
}

async fn collect_nvidia(timeout: Duration) -> Result<GpuStats> {
    let query = format!("--query-gpu={}", NVIDIA_QUERY);
    let out = run_tool(
        "nvidia-smi",
        &[&query, "--format=csv,noheader,nounits"],
        timeout,
    )
    .await?;
    parse_nvidia_csv(&out)
}

/// One CSV row per GPU; the first is reported. Fields the driver cannot
/// produce arrive as "[N/A]" and fall back to sentinels individually.
pub(crate) fn parse_nvidia_csv(output: &str) -> Result<GpuStats> {
    let line = output
        .lines()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| VigilError::parse("nvidia-smi produced no rows"))?;

    let fields: Vec<&str> = line.split(',').map(|f| f.trim()).collect();
    if fields.len() < 10 {
        return Err(VigilError::parse(format!(
            "expected 10 csv fields, got {}",
            fields.len()
        )));
    }

    let num = |idx: usize| -> Option<f64> { fields[idx].parse::<f64>().ok() };

    let link = match (num(8), num(9)) {
        (Some(generation), Some(width)) => format!("Gen{} x{}", generation, width),
        _ => "N/A".to_string(),
    };

    Ok(GpuStats {
        available: true,
        name: fields[0].to_string(),
        utilization: num(1).map(percent_round).unwrap_or(0),
        temperature: num(2).into(),
        memory_used: num(3).unwrap_or(0.0),
        memory_total: num(4).unwrap_or(0.0),
        fan: num(5).map(percent_round).unwrap_or(0),
        power: num(6).unwrap_or(0.0),
        clock: num(7).map(|c| c as u32).unwrap_or(0),
        link,
    })
}

/// Best-effort metrics from the kgsl node of an embedded Adreno GPU.
pub(crate) fn collect_adreno(root: &Path) -> Result<GpuStats> {
    // "57 %" on most kernels
    let busy_raw = read_value(&root.join("gpu_busy_percentage"))?;
    let busy = busy_raw
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .map_err(|_| VigilError::parse(format!("kgsl busy reading {:?}", busy_raw)))?;

    // gpuclk reports Hz
    let clock = read_value(&root.join("gpuclk"))
        .ok()
        .and_then(|raw| raw.parse::<u64>().ok())
        .map(|hz| (hz / 1_000_000) as u32)
        .unwrap_or(0);

    Ok(GpuStats {
        available: true,
        name: "Adreno (kgsl)".to_string(),
        utilization: percent_round(busy),
        clock,
        temperature: Reading::Unavailable,
        ..GpuStats::default()
    })
}

/// Name of the first VGA/3D-class device in `lspci` output.
pub(crate) fn parse_lspci_gpu_name(output: &str) -> Option<String> {
    for line in output.lines() {
        for class in ["VGA compatible controller:", "3D controller:"] {
            if let Some(pos) = line.find(class) {
                let name = line[pos + class.len()..].trim();
                if !name.is_empty() {
                    return Some(name.to_string());
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_nvidia_csv_full_row() {
        let out = "NVIDIA GeForce RTX 3080, 35, 62, 4096, 10240, 40, 220.50, 1710, 4, 16\n";
        let gpu = parse_nvidia_csv(out).unwrap();
        assert!(gpu.available);
        assert_eq!(gpu.name, "NVIDIA GeForce RTX 3080");
        assert_eq!(gpu.utilization, 35);
        assert_eq!(gpu.temperature, Reading::Value(62.0));
        assert_eq!(gpu.memory_used, 4096.0);
        assert_eq!(gpu.memory_total, 10240.0);
        assert_eq!(gpu.fan, 40);
        assert_eq!(gpu.power, 220.5);
        assert_eq!(gpu.clock, 1710);
        assert_eq!(gpu.link, "Gen4 x16");
    }

    #[test]
    fn test_parse_nvidia_csv_partial_na_fields() {
        // Passively cooled boards report "[N/A]" for fan
        let out = "NVIDIA T4, 10, 45, 1024, 16384, [N/A], 31.2, 585, 3, 8\n";
        let gpu = parse_nvidia_csv(out).unwrap();
        assert!(gpu.available);
        assert_eq!(gpu.fan, 0);
        assert_eq!(gpu.link, "Gen3 x8");
    }

    #[test]
    fn test_parse_nvidia_csv_rejects_short_rows() {
        assert!(parse_nvidia_csv("NVIDIA T4, 10, 45\n").is_err());
        assert!(parse_nvidia_csv("\n\n").is_err());
    }

    #[test]
    fn test_collect_adreno_from_fake_sysfs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("gpu_busy_percentage"), "57 %\n").unwrap();
        fs::write(dir.path().join("gpuclk"), "585000000\n").unwrap();

        let gpu = collect_adreno(dir.path()).unwrap();
        assert!(gpu.available);
        assert_eq!(gpu.utilization, 57);
        assert_eq!(gpu.clock, 585);
        assert_eq!(gpu.temperature, Reading::Unavailable);
    }

    #[test]
    fn test_collect_adreno_missing_node() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_adreno(dir.path()).is_err());
    }

    #[test]
    fn test_parse_lspci_gpu_name() {
        let out = "\
00:1f.4 SMBus: Intel Corporation Device 7a23
01:00.0 VGA compatible controller: Advanced Micro Devices [AMD/ATI] Navi 23
02:00.0 Ethernet controller: Realtek RTL8125
";
        assert_eq!(
            parse_lspci_gpu_name(out).as_deref(),
            Some("Advanced Micro Devices [AMD/ATI] Navi 23")
        );
    }

    #[test]
    fn test_parse_lspci_no_gpu() {
        assert_eq!(parse_lspci_gpu_name("00:1f.4 SMBus: Intel\n"), None);
    }

    #[test]
    fn test_bus_scan_result_has_no_live_metrics() {
        let gpu = GpuStats {
            name: "SomeChip".to_string(),
            ..GpuStats::default()
        };
        assert!(!gpu.available);
        assert_eq!(gpu.utilization, 0);
        assert_eq!(gpu.temperature, Reading::Unavailable);
    }
}
