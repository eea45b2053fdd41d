//! Contract tests for the snapshot wire format.
//!
//! Every consumer (terminal, popup, web, report generator) relies on a fixed
//! schema: fields are always present, holding sentinels when a source is
//! unavailable, and encoding is idempotent.

use serde_json::Value;

use vigil::core::stats::{HealthLevel, Reading, Snapshot};
use vigil::core::{sink, SnapshotAssembler, VigilConfig};
use vigil::platform::{self, CapabilitySet};

const TOP_LEVEL_FIELDS: &[&str] = &[
    "timestamp",
    "hostname",
    "kernel",
    "uptime",
    "load_avg",
    "health",
    "cpu",
    "memory",
    "disk",
    "network",
    "gpu",
    "battery",
    "processes",
];

const CPU_FIELDS: &[&str] = &[
    "current",
    "avg",
    "max",
    "min",
    "model",
    "cores",
    "temperature",
    "history",
    "timestamps",
];

const MEMORY_FIELDS: &[&str] = &["total", "used", "available", "cached", "percent", "swap_used"];

const DISK_FIELDS: &[&str] = &[
    "total",
    "used",
    "available",
    "percent",
    "inodes_percent",
    "read",
    "written",
    "filesystems",
];

const NETWORK_FIELDS: &[&str] = &["rx_total", "tx_total", "rx_rate", "tx_rate", "interfaces"];

const GPU_FIELDS: &[&str] = &[
    "available",
    "name",
    "utilization",
    "temperature",
    "memory_used",
    "memory_total",
    "fan",
    "power",
    "clock",
    "link",
];

const BATTERY_FIELDS: &[&str] = &["available", "percent", "status", "plugged", "temperature", "hint"];

fn assert_fields(value: &Value, fields: &[&str], context: &str) {
    let obj = value.as_object().unwrap_or_else(|| panic!("{} is not an object", context));
    for field in fields {
        assert!(
            obj.contains_key(*field),
            "{} is missing field {:?}",
            context,
            field
        );
        assert!(
            !obj[*field].is_null(),
            "{} field {:?} must never be null",
            context,
            field
        );
    }
}

/// The worst case: a snapshot where nearly every optional source was absent
/// still serializes with the complete schema and sentinel values.
#[test]
fn worst_case_snapshot_keeps_full_schema() {
    let snapshot = Snapshot::default();
    let json = sink::to_json(&snapshot).unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();

    assert_fields(&value, TOP_LEVEL_FIELDS, "snapshot");
    assert_fields(&value["cpu"], CPU_FIELDS, "cpu");
    assert_fields(&value["memory"], MEMORY_FIELDS, "memory");
    assert_fields(&value["disk"], DISK_FIELDS, "disk");
    assert_fields(&value["network"], NETWORK_FIELDS, "network");
    assert_fields(&value["gpu"], GPU_FIELDS, "gpu");
    assert_fields(&value["battery"], BATTERY_FIELDS, "battery");

    assert_eq!(value["cpu"]["temperature"], "N/A");
    assert_eq!(value["cpu"]["history"], Value::Array(vec![]));
    assert_eq!(value["gpu"]["available"], false);
    assert_eq!(value["health"], "good");
}

#[test]
fn encode_decode_encode_is_idempotent() {
    let mut snapshot = Snapshot {
        timestamp: 1_754_438_400,
        hostname: "host-a".to_string(),
        uptime: 86_400,
        load_avg: [2.0, 1.5, 1.0],
        health: HealthLevel::Warning,
        ..Snapshot::default()
    };
    snapshot.cpu.current = 85;
    snapshot.cpu.temperature = Reading::Value(45.0);
    snapshot.cpu.history = vec![80, 82, 85];
    snapshot.cpu.timestamps = vec!["12:00:01".into(), "12:00:03".into(), "12:00:05".into()];
    snapshot.memory.total = 16.0;
    snapshot.memory.used = 8.0;
    snapshot.memory.percent = 50;

    let first = sink::to_json(&snapshot).unwrap();
    let decoded = sink::from_json(&first).unwrap();
    let second = sink::to_json(&decoded).unwrap();

    assert_eq!(first, second);
    assert_eq!(decoded, snapshot);
}

/// End-to-end on the real host: whatever sources exist here, assembly must
/// produce a structurally complete snapshot with in-range percentages.
#[tokio::test]
async fn assembled_snapshot_is_structurally_complete() {
    let platform = platform::detect();
    let caps = CapabilitySet::build(platform).await;
    let mut assembler = SnapshotAssembler::new(platform, caps, VigilConfig::default());

    let snapshot = assembler.assemble().await;

    assert!(snapshot.cpu.current <= 100);
    assert!(snapshot.memory.percent <= 100);
    assert!(snapshot.disk.percent <= 100);
    assert_eq!(snapshot.cpu.history.len(), snapshot.cpu.timestamps.len());
    assert_eq!(snapshot.cpu.history.len(), 1);

    // GPU contract: no live metrics unless explicitly available
    if !snapshot.gpu.available {
        assert_eq!(snapshot.gpu.utilization, 0);
        assert_eq!(snapshot.gpu.temperature, Reading::Unavailable);
    }

    let json = sink::to_json(&snapshot).unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();
    assert_fields(&value, TOP_LEVEL_FIELDS, "assembled snapshot");
}

#[test]
fn log_entry_prefixes_are_locked() {
    // The offline report generator matches these literal strings; changing
    // them is a breaking change to the historical-log contract.
    assert_eq!(sink::LOG_TIMESTAMP_PREFIX, "=== ");
    assert_eq!(sink::LOG_BAR_MARKER, " usage [");
    assert_eq!(sink::LOG_HEALTH_PREFIX, "HEALTH ");

    let entry = sink::render_log_entry(&Snapshot::default());
    assert!(entry.starts_with(sink::LOG_TIMESTAMP_PREFIX));
    assert!(entry.contains(sink::LOG_BAR_MARKER));
    assert!(entry.contains(sink::LOG_HEALTH_PREFIX));
}
