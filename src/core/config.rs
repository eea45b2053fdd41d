use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VigilError};

/// Health classification thresholds, in integer percent.
///
/// The defaults carry over the long-standing 80/90/95 values; there is no
/// deeper rationale behind them, which is why they live here as overridable
/// configuration instead of inline constants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HealthThresholds {
    #[serde(default = "default_cpu_critical")]
    pub cpu_critical: u8,
    #[serde(default = "default_cpu_warning")]
    pub cpu_warning: u8,
    #[serde(default = "default_memory_warning")]
    pub memory_warning: u8,
    #[serde(default = "default_disk_warning")]
    pub disk_warning: u8,
}

fn default_cpu_critical() -> u8 {
    95
}
fn default_cpu_warning() -> u8 {
    80
}
fn default_memory_warning() -> u8 {
    90
}
fn default_disk_warning() -> u8 {
    90
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            cpu_critical: default_cpu_critical(),
            cpu_warning: default_cpu_warning(),
            memory_warning: default_memory_warning(),
            disk_warning: default_disk_warning(),
        }
    }
}

/// Engine configuration, loaded from `<config_dir>/vigil/config.json`.
///
/// A missing or unreadable file falls back to defaults; the file is plain
/// JSON so users can edit it by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VigilConfig {
    #[serde(default)]
    pub thresholds: HealthThresholds,
    /// Watch-mode poll interval in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Capacity of the rolling CPU history buffer.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Upper bound for any single external tool invocation.
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_ms: u64,
}

fn default_poll_interval() -> u64 {
    2
}
fn default_history_capacity() -> usize {
    30
}
fn default_tool_timeout() -> u64 {
    3000
}

impl Default for VigilConfig {
    fn default() -> Self {
        Self {
            thresholds: HealthThresholds::default(),
            poll_interval_secs: default_poll_interval(),
            history_capacity: default_history_capacity(),
            tool_timeout_ms: default_tool_timeout(),
        }
    }
}

impl VigilConfig {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let data = fs::read_to_string(&config_path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }

        // A corrupted file falls back to defaults rather than aborting;
        // the engine must come up even with broken local state.
        Ok(serde_json::from_str(&data).unwrap_or_else(|e| {
            log::warn!("ignoring malformed config {}: {}", config_path.display(), e);
            Self::default()
        }))
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let data = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, data)?;

        Ok(())
    }

    pub fn tool_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tool_timeout_ms)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| VigilError::config("could not determine config directory"))?;

        Ok(config_dir.join("vigil").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = VigilConfig::default();
        assert_eq!(cfg.thresholds.cpu_critical, 95);
        assert_eq!(cfg.thresholds.cpu_warning, 80);
        assert_eq!(cfg.thresholds.memory_warning, 90);
        assert_eq!(cfg.thresholds.disk_warning, 90);
        assert_eq!(cfg.poll_interval_secs, 2);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let cfg: VigilConfig =
            serde_json::from_str(r#"{"thresholds": {"cpu_critical": 99}}"#).unwrap();
        assert_eq!(cfg.thresholds.cpu_critical, 99);
        assert_eq!(cfg.thresholds.cpu_warning, 80);
        assert_eq!(cfg.tool_timeout_ms, 3000);
    }
}
