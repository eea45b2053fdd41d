//! Continuous polling command.
//!
//! One snapshot per tick, at most one assembly in flight. Ctrl-C aborts the
//! in-flight poll promptly instead of letting it finish unused work.

use std::path::Path;

use colored::*;
use tokio::sync::broadcast;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::core::assembler::format_timestamp;
use crate::core::{sink, SnapshotAssembler, VigilConfig};
use crate::error::Result;
use crate::platform::{self, CapabilitySet};
use crate::ui::Theme;

pub async fn run(
    interval_secs: Option<u64>,
    count: Option<u64>,
    log_path: Option<&Path>,
    theme: Theme,
) -> Result<()> {
    let platform = platform::detect();
    let caps = CapabilitySet::build(platform).await;
    let config = VigilConfig::load()?;
    let tick_secs = interval_secs.unwrap_or(config.poll_interval_secs).max(1);

    let mut assembler = SnapshotAssembler::new(platform, caps, config);

    let (shutdown_tx, mut shutdown) = broadcast::channel::<()>(1);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(());
    })
    .map_err(|e| crate::error::VigilError::config(format!("signal handler: {}", e)))?;

    let mut ticker = interval(Duration::from_secs(tick_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut polled = 0u64;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.recv() => break,
        }

        // Dropping the assemble future on shutdown kills in-flight tools.
        let snapshot = tokio::select! {
            snapshot = assembler.assemble() => snapshot,
            _ = shutdown.recv() => break,
        };

        if let Some(path) = log_path {
            sink::append_log(path, &snapshot)?;
        }
        print_tick_line(&snapshot, &theme);

        polled += 1;
        if let Some(limit) = count {
            if polled >= limit {
                break;
            }
        }
    }

    Ok(())
}

fn print_tick_line(snapshot: &crate::core::Snapshot, theme: &Theme) {
    let health = snapshot.health.to_string();
    let health = if theme.color {
        match snapshot.health {
            crate::core::HealthLevel::Good => health.green(),
            crate::core::HealthLevel::Warning => health.yellow(),
            crate::core::HealthLevel::Critical => health.red().bold(),
        }
    } else {
        health.normal()
    };

    println!(
        "{}  cpu {:>3}%  mem {:>3}%  disk {:>3}%  rx {} B/s  tx {} B/s  {}",
        format_timestamp(snapshot.timestamp),
        snapshot.cpu.current,
        snapshot.memory.percent,
        snapshot.disk.percent,
        snapshot.network.rx_rate,
        snapshot.network.tx_rate,
        health
    );
}
