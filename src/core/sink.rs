//! Snapshot serialization.
//!
//! Two consumers: the JSON wire contract (terminal, popup and web renderers
//! all decode the same shape) and the historical text log. The log label
//! strings below are load-bearing: the offline report generator locates
//! data by matching them literally, so they are public constants and must
//! stay byte-stable.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::core::assembler::format_timestamp;
use crate::core::stats::Snapshot;
use crate::error::Result;

/// Prefix of the timestamp line opening every log entry.
pub const LOG_TIMESTAMP_PREFIX: &str = "=== ";
/// Marker between a domain label and its bracketed usage bar.
pub const LOG_BAR_MARKER: &str = " usage [";
/// Prefix of the health line closing every log entry.
pub const LOG_HEALTH_PREFIX: &str = "HEALTH ";

const BAR_WIDTH: usize = 20;

/// Serialize per the wire contract. Field order and names are fixed by the
/// struct definitions; decoding and re-encoding is idempotent.
pub fn to_json(snapshot: &Snapshot) -> Result<String> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

pub fn from_json(data: &str) -> Result<Snapshot> {
    Ok(serde_json::from_str(data)?)
}

/// Render one historical-log entry as labeled text blocks.
pub fn render_log_entry(snapshot: &Snapshot) -> String {
    let mut out = String::new();

    out.push_str(LOG_TIMESTAMP_PREFIX);
    out.push_str(&format_timestamp(snapshot.timestamp));
    out.push_str(" ===\n");

    out.push_str(&format!(
        "host {} kernel {} uptime {}s load {:.2} {:.2} {:.2}\n",
        snapshot.hostname,
        snapshot.kernel,
        snapshot.uptime,
        snapshot.load_avg[0],
        snapshot.load_avg[1],
        snapshot.load_avg[2],
    ));

    out.push_str(&usage_line("CPU", snapshot.cpu.current));
    out.push_str(&format!(
        " ({} cores, temp {})\n",
        snapshot.cpu.cores, snapshot.cpu.temperature
    ));

    out.push_str(&usage_line("MEM", snapshot.memory.percent));
    out.push_str(&format!(
        " ({}/{} GB)\n",
        snapshot.memory.used, snapshot.memory.total
    ));

    out.push_str(&usage_line("DISK", snapshot.disk.percent));
    out.push_str(&format!(
        " ({}/{} GB)\n",
        snapshot.disk.used, snapshot.disk.total
    ));

    out.push_str(&format!(
        "NET rx {} B/s tx {} B/s\n",
        snapshot.network.rx_rate, snapshot.network.tx_rate
    ));

    out.push_str(LOG_HEALTH_PREFIX);
    out.push_str(&snapshot.health.to_string());
    out.push_str("\n\n");

    out
}

/// Append one rendered entry to the log file, creating it if needed.
pub fn append_log(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(render_log_entry(snapshot).as_bytes())?;
    Ok(())
}

fn usage_line(label: &str, percent: u8) -> String {
    format!("{}{}{}] {}%", label, LOG_BAR_MARKER, usage_bar(percent, BAR_WIDTH), percent)
}

/// A fixed-width bracketless bar body, e.g. "#####---------------".
pub(crate) fn usage_bar(percent: u8, width: usize) -> String {
    let filled = (percent.min(100) as usize * width) / 100;
    let mut bar = String::with_capacity(width);
    bar.push_str(&"#".repeat(filled));
    bar.push_str(&"-".repeat(width - filled));
    bar
}
