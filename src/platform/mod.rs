//! Platform-specific code.
//!
//! Detects the execution environment class once per process and probes which
//! optional data sources are usable on this host.

pub mod capabilities;
pub mod command;

pub use capabilities::{CapabilitySet, GpuVendor};
pub use command::run_tool;

use std::env;
use std::fmt;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;

/// Execution environment class, from most to least specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformClass {
    Termux,
    Android,
    Wsl,
    StandardLinux,
}

impl fmt::Display for PlatformClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformClass::Termux => write!(f, "Termux"),
            PlatformClass::Android => write!(f, "Android"),
            PlatformClass::Wsl => write!(f, "WSL"),
            PlatformClass::StandardLinux => write!(f, "Linux"),
        }
    }
}

/// Immutable description of the host environment, created once at startup.
#[derive(Debug, Clone)]
pub struct PlatformInfo {
    pub class: PlatformClass,
    pub kernel: String,
    pub arch: &'static str,
}

static PLATFORM: Lazy<PlatformInfo> = Lazy::new(probe);

/// Detect the execution environment. Cached for the process lifetime.
pub fn detect() -> &'static PlatformInfo {
    &PLATFORM
}

fn probe() -> PlatformInfo {
    let kernel = read_kernel_release();
    let termux_marker = env::var("TERMUX_VERSION").is_ok()
        || env::var("PREFIX").map(|p| p.contains("com.termux")).unwrap_or(false);
    let android_marker =
        env::var("ANDROID_ROOT").is_ok() || Path::new("/system/build.prop").exists();

    PlatformInfo {
        class: classify(termux_marker, android_marker, &kernel),
        kernel,
        arch: env::consts::ARCH,
    }
}

/// Ordered, mutually exclusive classification rules; first match wins.
/// Earlier rules are strictly more specific, so no ambiguity is possible.
fn classify(termux_marker: bool, android_marker: bool, kernel: &str) -> PlatformClass {
    if termux_marker {
        PlatformClass::Termux
    } else if android_marker {
        PlatformClass::Android
    } else if kernel.to_lowercase().contains("microsoft") {
        PlatformClass::Wsl
    } else {
        PlatformClass::StandardLinux
    }
}

fn read_kernel_release() -> String {
    fs::read_to_string("/proc/sys/kernel/osrelease")
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_termux_beats_android() {
        assert_eq!(classify(true, true, "4.14.117"), PlatformClass::Termux);
    }

    #[test]
    fn test_android_beats_wsl_kernel() {
        assert_eq!(
            classify(false, true, "4.4.0-19041-Microsoft"),
            PlatformClass::Android
        );
    }

    #[test]
    fn test_wsl_kernel_match_is_case_insensitive() {
        assert_eq!(
            classify(false, false, "5.15.167.4-microsoft-standard-WSL2"),
            PlatformClass::Wsl
        );
        assert_eq!(
            classify(false, false, "4.4.0-19041-Microsoft"),
            PlatformClass::Wsl
        );
    }

    #[test]
    fn test_plain_linux_fallback() {
        assert_eq!(
            classify(false, false, "6.8.0-41-generic"),
            PlatformClass::StandardLinux
        );
    }
}
