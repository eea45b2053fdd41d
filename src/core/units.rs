//! Pure unit-conversion and rounding helpers shared by all collectors.
//!
//! Every collector normalizes raw kernel/tool readings through these
//! functions instead of carrying its own arithmetic.

/// Disk sector size used by /proc/diskstats counters, in bytes.
pub const SECTOR_SIZE: u64 = 512;

const KB_PER_GB: f64 = 1024.0 * 1024.0;
const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Kilobytes (as reported by /proc/meminfo) to gigabytes, one decimal.
pub fn kb_to_gb(kb: u64) -> f64 {
    round1(kb as f64 / KB_PER_GB)
}

/// Kilobytes to megabytes, one decimal.
pub fn kb_to_mb(kb: u64) -> f64 {
    round1(kb as f64 / 1024.0)
}

/// Bytes to gigabytes, one decimal.
pub fn bytes_to_gb(bytes: u64) -> f64 {
    round1(bytes as f64 / BYTES_PER_GB)
}

/// Bytes to megabytes, one decimal.
pub fn bytes_to_mb(bytes: u64) -> f64 {
    round1(bytes as f64 / BYTES_PER_MB)
}

/// Block-device sector count to bytes.
pub fn sectors_to_bytes(sectors: u64) -> u64 {
    sectors.saturating_mul(SECTOR_SIZE)
}

/// Clamp a float percentage into [0, 100].
pub fn clamp_percent(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Integer percentage of `part` in `whole`.
///
/// Rounding policy: round half up (0.5 rounds to 1), clamped to [0, 100].
/// A zero `whole` yields 0.
pub fn percent_of(part: u64, whole: u64) -> u8 {
    if whole == 0 {
        return 0;
    }
    let pct = (part as f64 / whole as f64) * 100.0;
    (clamp_percent(pct) + 0.5).floor() as u8
}

/// Round an already-computed float percentage to an integer, half up,
/// clamped to [0, 100].
pub fn percent_round(pct: f64) -> u8 {
    (clamp_percent(pct) + 0.5).floor() as u8
}

/// Normalize a temperature reading to whole degrees Celsius.
///
/// Kernel thermal interfaces report millidegrees; anything above 1000 is
/// treated as such and divided down, while small values are already degrees.
pub fn normalize_temp(raw: f64) -> f64 {
    if raw > 1000.0 {
        raw / 1000.0
    } else {
        raw
    }
}
