use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A numeric reading that may be genuinely unavailable.
///
/// Serializes as the plain number, or as the literal string `"N/A"` when no
/// source produced a value. Consumers therefore always see the field present.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Reading {
    Value(f64),
    #[default]
    Unavailable,
}

impl Reading {
    pub fn value(&self) -> Option<f64> {
        match self {
            Reading::Value(v) => Some(*v),
            Reading::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Reading::Value(_))
    }
}

impl From<Option<f64>> for Reading {
    fn from(v: Option<f64>) -> Self {
        match v {
            Some(v) => Reading::Value(v),
            None => Reading::Unavailable,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Value(v) => write!(f, "{}", v),
            Reading::Unavailable => write!(f, "N/A"),
        }
    }
}

impl Serialize for Reading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Reading::Value(v) => serializer.serialize_f64(*v),
            Reading::Unavailable => serializer.serialize_str("N/A"),
        }
    }
}

struct ReadingVisitor;

impl Visitor<'_> for ReadingVisitor {
    type Value = Reading;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number or the string \"N/A\"")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Reading, E> {
        Ok(Reading::Value(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Reading, E> {
        Ok(Reading::Value(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Reading, E> {
        Ok(Reading::Value(v as f64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Reading, E> {
        if v == "N/A" {
            Ok(Reading::Unavailable)
        } else {
            Err(E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }
}

impl<'de> Deserialize<'de> for Reading {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Reading, D::Error> {
        deserializer.deserialize_any(ReadingVisitor)
    }
}

/// Coarse health classification derived from the current snapshot only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthLevel {
    #[default]
    Good,
    Warning,
    Critical,
}

impl fmt::Display for HealthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthLevel::Good => write!(f, "good"),
            HealthLevel::Warning => write!(f, "warning"),
            HealthLevel::Critical => write!(f, "critical"),
        }
    }
}

/// Complete host snapshot, one per poll tick.
///
/// Immutable once assembled. Every field is always populated, with sentinel
/// values (`0`, `"N/A"`, `[]`) standing in when a source is unavailable, so
/// every consumer can rely on a fixed schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: i64, // Unix timestamp
    pub hostname: String,
    pub kernel: String,
    pub uptime: u64, // seconds
    pub load_avg: [f64; 3],
    pub health: HealthLevel,
    pub cpu: CpuStats,
    pub memory: MemoryStats,
    pub disk: DiskStats,
    pub network: NetworkStats,
    pub gpu: GpuStats,
    pub battery: BatteryStats,
    pub processes: ProcessStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuStats {
    /// Current usage, integer percent in [0, 100] regardless of source.
    pub current: u8,
    pub avg: u8,
    pub max: u8,
    pub min: u8,
    pub model: String,
    pub cores: u32,
    /// Degrees Celsius, already normalized from millidegrees.
    pub temperature: Reading,
    /// Rolling usage samples, oldest first. Fed by repeated polls.
    pub history: Vec<u8>,
    /// One HH:MM:SS label per history sample.
    pub timestamps: Vec<String>,
}

impl Default for CpuStats {
    fn default() -> Self {
        Self {
            current: 0,
            avg: 0,
            max: 0,
            min: 0,
            model: "N/A".to_string(),
            cores: 0,
            temperature: Reading::Unavailable,
            history: Vec::new(),
            timestamps: Vec::new(),
        }
    }
}

/// Memory figures in gigabytes, one decimal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total: f64,
    pub used: f64,
    pub available: f64,
    pub cached: f64,
    pub percent: u8,
    pub swap_used: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilesystemUsage {
    pub mount: String,
    pub device: String,
    pub total: f64, // GB
    pub used: f64,
    pub available: f64,
    pub percent: u8,
}

impl Default for FilesystemUsage {
    fn default() -> Self {
        Self {
            mount: "N/A".to_string(),
            device: "N/A".to_string(),
            total: 0.0,
            used: 0.0,
            available: 0.0,
            percent: 0,
        }
    }
}

/// Root-filesystem usage plus all device-backed mounts, ordered by mount path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskStats {
    pub total: f64, // GB
    pub used: f64,
    pub available: f64,
    pub percent: u8,
    /// Inode usage of the root filesystem, tracked separately from bytes.
    pub inodes_percent: u8,
    /// Cumulative GB read/written across physical block devices since boot.
    pub read: f64,
    pub written: f64,
    pub filesystems: Vec<FilesystemUsage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceStats {
    pub name: String,
    /// Kernel operstate (`up`, `down`, `unknown`), or "N/A".
    pub status: String,
    /// Dotted-quad address, or "N/A" when no resolution source is usable.
    pub ipv4: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub rx_packets: u64,
    pub tx_packets: u64,
    pub rx_errors: u64,
    pub rx_dropped: u64,
}

impl Default for InterfaceStats {
    fn default() -> Self {
        Self {
            name: "N/A".to_string(),
            status: "N/A".to_string(),
            ipv4: "N/A".to_string(),
            rx_bytes: 0,
            tx_bytes: 0,
            rx_packets: 0,
            tx_packets: 0,
            rx_errors: 0,
            rx_dropped: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkStats {
    /// Aggregate counters across all non-loopback interfaces, in bytes.
    pub rx_total: u64,
    pub tx_total: u64,
    /// Bytes per second, derived from consecutive polls; 0 on the first.
    pub rx_rate: u64,
    pub tx_rate: u64,
    pub interfaces: Vec<InterfaceStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuStats {
    /// Consumers must check this before reading the live metric fields.
    pub available: bool,
    pub name: String,
    pub utilization: u8,
    pub temperature: Reading,
    pub memory_used: f64, // MB
    pub memory_total: f64,
    pub fan: u8,    // percent
    pub power: f64, // watts
    pub clock: u32, // MHz
    /// PCIe link, e.g. "Gen4 x16", or "N/A".
    pub link: String,
}

impl Default for GpuStats {
    fn default() -> Self {
        Self {
            available: false,
            name: "N/A".to_string(),
            utilization: 0,
            temperature: Reading::Unavailable,
            memory_used: 0.0,
            memory_total: 0.0,
            fan: 0,
            power: 0.0,
            clock: 0,
            link: "N/A".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryStats {
    pub available: bool,
    pub percent: u8,
    /// Charging state as reported by the source, or "N/A".
    pub status: String,
    /// Power source (e.g. "PLUGGED_AC"), or "N/A".
    pub plugged: String,
    pub temperature: Reading,
    /// Short remediation hint when no battery source is usable, else empty.
    pub hint: String,
}

impl Default for BatteryStats {
    fn default() -> Self {
        Self {
            available: false,
            percent: 0,
            status: "N/A".to_string(),
            plugged: "N/A".to_string(),
            temperature: Reading::Unavailable,
            hint: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessStats {
    pub total: u32,
    /// Processes currently in the running state, not merely existing.
    pub running: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_serializes_number_or_sentinel() {
        assert_eq!(serde_json::to_string(&Reading::Value(45.0)).unwrap(), "45.0");
        assert_eq!(serde_json::to_string(&Reading::Unavailable).unwrap(), "\"N/A\"");
    }

    #[test]
    fn test_reading_roundtrip() {
        for r in [Reading::Value(45.0), Reading::Value(0.5), Reading::Unavailable] {
            let json = serde_json::to_string(&r).unwrap();
            let back: Reading = serde_json::from_str(&json).unwrap();
            assert_eq!(back, r);
        }
    }

    #[test]
    fn test_reading_rejects_other_strings() {
        assert!(serde_json::from_str::<Reading>("\"whatever\"").is_err());
    }

    #[test]
    fn test_health_level_lowercase() {
        assert_eq!(serde_json::to_string(&HealthLevel::Warning).unwrap(), "\"warning\"");
    }

    #[test]
    fn test_default_snapshot_uses_sentinels() {
        let snap = Snapshot::default();
        assert_eq!(snap.cpu.model, "N/A");
        assert_eq!(snap.cpu.temperature, Reading::Unavailable);
        assert!(!snap.gpu.available);
        assert_eq!(snap.gpu.name, "N/A");
        assert_eq!(snap.battery.status, "N/A");
        assert!(snap.disk.filesystems.is_empty());
        assert!(snap.network.interfaces.is_empty());
    }
}
