//! Capability probing.
//!
//! Built once from the platform class plus live existence and tool-presence
//! checks, then treated as read-only configuration for the session. Every
//! collector consults this set to skip strategies that cannot work here,
//! instead of discovering the same failures on every poll.

use std::path::Path;
use std::time::Duration;

use crate::platform::{command::run_tool, PlatformClass, PlatformInfo};

/// Deadline for the single live probe allowed during capability building.
const LIVE_PROBE_TIMEOUT: Duration = Duration::from_millis(1500);

/// GPU vendor usable on this host, decided once at probe time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GpuVendor {
    Nvidia,
    Adreno,
    #[default]
    None,
}

impl std::fmt::Display for GpuVendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpuVendor::Nvidia => write!(f, "nvidia"),
            GpuVendor::Adreno => write!(f, "adreno"),
            GpuVendor::None => write!(f, "none"),
        }
    }
}

/// Which optional data sources are usable on this host.
///
/// Every flag is a plain bool decided at build time; a probe that errors is
/// recorded as `false`, never propagated. The struct is immutable after
/// construction and safe to share by reference across collectors.
#[derive(Debug, Clone, Default)]
pub struct CapabilitySet {
    // Pseudo-filesystem roots
    pub procfs: bool,
    pub sysfs: bool,
    pub thermal: bool,
    pub power_supply: bool,
    pub net_sysfs: bool,
    pub kgsl: bool,

    // Tool presence
    pub mpstat: bool,
    pub top: bool,
    pub sensors: bool,
    pub nvidia_smi: bool,
    pub lspci: bool,
    pub ip: bool,
    pub getprop: bool,
    pub termux_battery: bool,

    /// The mobile battery helper answered a live probe. A helper that is
    /// installed but permission-blocked records `false` here.
    pub mobile_api: bool,

    pub gpu_vendor: GpuVendor,
}

impl CapabilitySet {
    /// Probe the host. Called once per session; re-probing is an explicit,
    /// user-triggered operation, never automatic.
    pub async fn build(platform: &PlatformInfo) -> Self {
        let mut caps = Self::probe_paths(Path::new("/"));

        caps.mpstat = tool_present("mpstat");
        caps.top = tool_present("top");
        caps.sensors = tool_present("sensors");
        caps.nvidia_smi = tool_present("nvidia-smi");
        caps.lspci = tool_present("lspci");
        caps.ip = tool_present("ip");
        caps.getprop = tool_present("getprop");
        caps.termux_battery = tool_present("termux-battery-status");

        caps.gpu_vendor = if caps.nvidia_smi {
            GpuVendor::Nvidia
        } else if caps.kgsl {
            GpuVendor::Adreno
        } else {
            GpuVendor::None
        };

        // The one live probe: the Termux API helper can be installed yet
        // still fail with a permission error, so presence alone is not
        // enough to call it usable.
        caps.mobile_api = if caps.termux_battery && platform.class == PlatformClass::Termux {
            run_tool("termux-battery-status", &[], LIVE_PROBE_TIMEOUT)
                .await
                .is_ok()
        } else {
            false
        };

        caps
    }

    /// Existence checks for pseudo-filesystem sources, rooted at `root` so
    /// tests can point this at a scratch tree.
    fn probe_paths(root: &Path) -> Self {
        Self {
            procfs: root.join("proc/stat").exists(),
            sysfs: root.join("sys/class").exists(),
            thermal: root.join("sys/class/thermal").exists(),
            power_supply: root.join("sys/class/power_supply").exists(),
            net_sysfs: root.join("sys/class/net").exists(),
            kgsl: root.join("sys/class/kgsl/kgsl-3d0").exists(),
            ..Self::default()
        }
    }
}

fn tool_present(name: &str) -> bool {
    which::which(name).is_ok()
}
