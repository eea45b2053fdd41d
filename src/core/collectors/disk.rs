//! Disk collector.
//!
//! Root-filesystem usage (bytes and inodes, queried separately) via
//! statvfs, every device-backed mount from /proc/mounts ordered by mount
//! path, and cumulative I/O derived from /proc/diskstats sector counters.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::stats::{DiskStats, FilesystemUsage};
use crate::core::units::{bytes_to_gb, percent_of, sectors_to_bytes};
use crate::error::{Result, VigilError};
use crate::platform::CapabilitySet;

use super::read_source;

/// Disk-level device names in /proc/diskstats; partitions are excluded so
/// their sectors are not counted twice.
static PHYSICAL_DISK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(sd[a-z]+|hd[a-z]+|vd[a-z]+|xvd[a-z]+|mmcblk\d+|nvme\d+n\d+)$")
        .expect("static regex")
});

/// Raw filesystem figures from statvfs.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct FsUsage {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
    pub inodes_total: u64,
    pub inodes_used: u64,
}

pub async fn collect(caps: &CapabilitySet) -> DiskStats {
    let mut stats = DiskStats::default();

    match statvfs("/") {
        Ok(root) => {
            stats.total = bytes_to_gb(root.total_bytes);
            stats.used = bytes_to_gb(root.used_bytes);
            stats.available = bytes_to_gb(root.available_bytes);
            stats.percent = percent_of(root.used_bytes, root.total_bytes);
            stats.inodes_percent = percent_of(root.inodes_used, root.inodes_total);
        }
        Err(e) => log::debug!("statvfs on / failed: {}", e),
    }

    if caps.procfs {
        if let Ok(content) = read_source(Path::new("/proc/mounts")) {
            stats.filesystems = device_mounts(&content)
                .into_iter()
                .filter_map(|(device, mount)| {
                    let usage = statvfs(&mount).ok()?;
                    Some(FilesystemUsage {
                        mount,
                        device,
                        total: bytes_to_gb(usage.total_bytes),
                        used: bytes_to_gb(usage.used_bytes),
                        available: bytes_to_gb(usage.available_bytes),
                        percent: percent_of(usage.used_bytes, usage.total_bytes),
                    })
                })
                .collect();
        }

        if let Ok(content) = read_source(Path::new("/proc/diskstats")) {
            let (read_sectors, written_sectors) = parse_diskstats(&content);
            stats.read = bytes_to_gb(sectors_to_bytes(read_sectors));
            stats.written = bytes_to_gb(sectors_to_bytes(written_sectors));
        }
    }

    stats
}

/// Device-backed mounts from /proc/mounts, sorted by mount path.
/// Virtual filesystems (proc, tmpfs, overlay scratch, ...) have non-/dev
/// sources and are skipped.
pub(crate) fn device_mounts(content: &str) -> Vec<(String, String)> {
    let mut mounts: Vec<(String, String)> = content
        .lines()
        .filter_map(|line| {
            let mut it = line.split_whitespace();
            let device = it.next()?;
            let mount = it.next()?;
            if !device.starts_with("/dev/") {
                return None;
            }
            // Mount paths with spaces are octal-escaped in /proc/mounts
            Some((device.to_string(), mount.replace("\\040", " ")))
        })
        .collect();
    mounts.sort_by(|a, b| a.1.cmp(&b.1));
    mounts.dedup_by(|a, b| a.1 == b.1);
    mounts
}

/// Sum of (sectors read, sectors written) across physical disks.
pub(crate) fn parse_diskstats(content: &str) -> (u64, u64) {
    let mut read = 0u64;
    let mut written = 0u64;

    for line in content.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        // major minor name reads merged sectors_read ms writes merged sectors_written ...
        if tokens.len() < 10 {
            continue;
        }
        if !PHYSICAL_DISK_RE.is_match(tokens[2]) {
            continue;
        }
        read += tokens[5].parse::<u64>().unwrap_or(0);
        written += tokens[9].parse::<u64>().unwrap_or(0);
    }

    (read, written)
}

#[cfg(unix)]
pub(crate) fn statvfs(path: &str) -> Result<FsUsage> {
    use std::ffi::CString;

    let c_path = CString::new(path)
        .map_err(|_| VigilError::parse(format!("path {:?} contains a NUL byte", path)))?;

    let mut vfs: libc::statvfs = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut vfs) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        return Err(match err.kind() {
            std::io::ErrorKind::PermissionDenied => VigilError::permission_denied(path),
            _ => VigilError::source_unavailable(format!("statvfs({}): {}", path, err)),
        });
    }

    let frsize = vfs.f_frsize as u64;
    let total = (vfs.f_blocks as u64).saturating_mul(frsize);
    let free = (vfs.f_bfree as u64).saturating_mul(frsize);
    // f_bavail is what an unprivileged caller can actually use
    let available = (vfs.f_bavail as u64).saturating_mul(frsize);

    Ok(FsUsage {
        total_bytes: total,
        used_bytes: total.saturating_sub(free),
        available_bytes: available,
        inodes_total: vfs.f_files as u64,
        inodes_used: (vfs.f_files as u64).saturating_sub(vfs.f_ffree as u64),
    })
}

#[cfg(not(unix))]
pub(crate) fn statvfs(_path: &str) -> Result<FsUsage> {
    Err(VigilError::source_unavailable("statvfs requires a unix host"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOUNTS: &str = "\
proc /proc proc rw,nosuid 0 0
/dev/nvme0n1p2 / ext4 rw,relatime 0 0
tmpfs /run tmpfs rw,nosuid 0 0
/dev/nvme0n1p1 /boot/efi vfat rw,relatime 0 0
/dev/sda1 /data ext4 rw 0 0
overlay /var/lib/docker/overlay2/abc/merged overlay rw 0 0
";

    #[test]
    fn test_device_mounts_filters_and_sorts() {
        let mounts = device_mounts(MOUNTS);
        assert_eq!(
            mounts,
            vec![
                ("/dev/nvme0n1p2".to_string(), "/".to_string()),
                ("/dev/nvme0n1p1".to_string(), "/boot/efi".to_string()),
                ("/dev/sda1".to_string(), "/data".to_string()),
            ]
        );
    }

    #[test]
    fn test_device_mounts_unescapes_spaces() {
        let mounts = device_mounts("/dev/sdb1 /mnt/my\\040disk ext4 rw 0 0\n");
        assert_eq!(mounts[0].1, "/mnt/my disk");
    }

    #[test]
    fn test_parse_diskstats_sums_disks_not_partitions() {
        let content = "\
   8       0 sda 1000 0 2000 0 500 0 1000 0 0 0 0
   8       1 sda1 900 0 1800 0 450 0 900 0 0 0 0
 259       0 nvme0n1 100 0 200 0 50 0 100 0 0 0 0
 259       1 nvme0n1p1 90 0 180 0 45 0 90 0 0 0 0
   7       0 loop0 5 0 10 0 0 0 0 0 0 0 0
";
        let (read, written) = parse_diskstats(content);
        assert_eq!(read, 2200);
        assert_eq!(written, 1100);
    }

    #[test]
    fn test_parse_diskstats_sector_bytes() {
        // 2200 sectors * 512 = 1126400 bytes
        assert_eq!(sectors_to_bytes(2200), 1_126_400);
    }

    #[test]
    fn test_percent_rounding_on_filesystem_entry() {
        // used=40 GB of total=100 GB is exactly 40
        assert_eq!(percent_of(40, 100), 40);
    }
}
