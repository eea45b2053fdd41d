//! Power/battery collector.
//!
//! Chain: the Termux battery helper (structured JSON, with a text-pattern
//! fallback decoder for truncated or wrapped output), then a scan of
//! /sys/class/power_supply for a battery-type node, then sentinels plus a
//! remediation hint.

use std::path::Path;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::core::stats::{BatteryStats, Reading};
use crate::core::units::percent_round;
use crate::error::{Result, VigilError};
use crate::platform::{run_tool, CapabilitySet, PlatformClass, PlatformInfo};

use super::read_value;

static PCT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""percentage"\s*:\s*(\d+(?:\.\d+)?)"#).expect("static regex"));
static STATUS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""status"\s*:\s*"([A-Za-z_]+)""#).expect("static regex"));

/// Shape of `termux-battery-status` output.
#[derive(Debug, Deserialize)]
struct TermuxBattery {
    percentage: f64,
    status: String,
    #[serde(default)]
    plugged: Option<String>,
    #[serde(default)]
    temperature: Option<f64>,
}

pub async fn collect(caps: &CapabilitySet, platform: &PlatformInfo, timeout: Duration) -> BatteryStats {
    if caps.mobile_api {
        match run_tool("termux-battery-status", &[], timeout).await {
            Ok(out) => {
                if let Ok(stats) = decode_termux_battery(&out) {
                    return stats;
                }
                log::debug!("battery helper output not decodable");
            }
            Err(e) => log::debug!("battery helper failed: {}", e),
        }
    }

    if caps.power_supply {
        if let Ok(stats) = scan_power_supply(Path::new("/sys/class/power_supply")) {
            return stats;
        }
    }

    BatteryStats {
        hint: remediation_hint(platform.class).to_string(),
        ..BatteryStats::default()
    }
}

/// Strict JSON decode first; a regex pattern decoder handles helpers that
/// emit surrounding noise or partial documents.
pub(crate) fn decode_termux_battery(output: &str) -> Result<BatteryStats> {
    if let Ok(parsed) = serde_json::from_str::<TermuxBattery>(output.trim()) {
        return Ok(BatteryStats {
            available: true,
            percent: percent_round(parsed.percentage),
            status: parsed.status,
            plugged: parsed.plugged.unwrap_or_else(|| "N/A".to_string()),
            temperature: parsed.temperature.into(),
            hint: String::new(),
        });
    }

    let percent = PCT_PATTERN
        .captures(output)
        .and_then(|c| c[1].parse::<f64>().ok())
        .ok_or_else(|| VigilError::parse("no percentage field in battery output"))?;

    let status = STATUS_PATTERN
        .captures(output)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| "N/A".to_string());

    Ok(BatteryStats {
        available: true,
        percent: percent_round(percent),
        status,
        plugged: "N/A".to_string(),
        temperature: Reading::Unavailable,
        hint: String::new(),
    })
}

/// First node with `type == Battery` wins.
pub(crate) fn scan_power_supply(root: &Path) -> Result<BatteryStats> {
    let mut nodes: Vec<_> = std::fs::read_dir(root)
        .map_err(|e| VigilError::source_unavailable(format!("{}: {}", root.display(), e)))?
        .flatten()
        .map(|e| e.path())
        .collect();
    nodes.sort();

    for node in nodes {
        match read_value(&node.join("type")) {
            Ok(kind) if kind == "Battery" => {}
            _ => continue,
        }

        let percent = read_value(&node.join("capacity"))
            .ok()
            .and_then(|raw| raw.parse::<f64>().ok())
            .map(percent_round)
            .ok_or_else(|| VigilError::parse("battery node has no readable capacity"))?;

        let status = read_value(&node.join("status")).unwrap_or_else(|_| "N/A".to_string());

        // temp is reported in tenths of a degree
        let temperature = read_value(&node.join("temp"))
            .ok()
            .and_then(|raw| raw.parse::<f64>().ok())
            .map(|t| t / 10.0)
            .into();

        return Ok(BatteryStats {
            available: true,
            percent,
            status,
            plugged: "N/A".to_string(),
            temperature,
            hint: String::new(),
        });
    }

    Err(VigilError::source_unavailable("no battery-type power supply node"))
}

fn remediation_hint(class: PlatformClass) -> &'static str {
    match class {
        PlatformClass::Termux | PlatformClass::Android => {
            "battery not readable; install the termux-api package and grant it permission"
        }
        _ => "no battery detected under /sys/class/power_supply",
    }
}
