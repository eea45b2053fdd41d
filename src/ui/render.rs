//! Terminal rendering of snapshots and probe results.
//!
//! The engine itself never prints; these functions take a finished snapshot
//! plus an explicit, immutable [`Theme`] and write to stdout.

use colored::*;

use crate::core::assembler::format_timestamp;
use crate::core::stats::{HealthLevel, Snapshot};
use crate::platform::{CapabilitySet, PlatformInfo};

/// Presentation configuration passed into renderers.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub color: bool,
}

impl Theme {
    pub fn colored() -> Self {
        Self { color: true }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    fn paint(&self, text: &str, color: Color) -> ColoredString {
        if self.color {
            text.color(color)
        } else {
            text.normal()
        }
    }
}

fn health_color(health: HealthLevel) -> Color {
    match health {
        HealthLevel::Good => Color::Green,
        HealthLevel::Warning => Color::Yellow,
        HealthLevel::Critical => Color::Red,
    }
}

pub fn print_snapshot(snapshot: &Snapshot, theme: &Theme) {
    println!(
        "{} {}",
        theme.paint(&snapshot.hostname, Color::Cyan).bold(),
        format_timestamp(snapshot.timestamp)
    );
    println!(
        "kernel {}  uptime {}s  load {:.2} {:.2} {:.2}",
        snapshot.kernel,
        snapshot.uptime,
        snapshot.load_avg[0],
        snapshot.load_avg[1],
        snapshot.load_avg[2]
    );
    println!(
        "health: {}",
        theme
            .paint(&snapshot.health.to_string(), health_color(snapshot.health))
            .bold()
    );
    println!();

    section(theme, "CPU");
    println!(
        "  {}  {} cores  current {}%  avg {}%  max {}%  temp {}",
        snapshot.cpu.model,
        snapshot.cpu.cores,
        snapshot.cpu.current,
        snapshot.cpu.avg,
        snapshot.cpu.max,
        snapshot.cpu.temperature
    );

    section(theme, "Memory");
    println!(
        "  {}/{} GB used ({}%)  available {} GB  cached {} GB  swap used {} GB",
        snapshot.memory.used,
        snapshot.memory.total,
        snapshot.memory.percent,
        snapshot.memory.available,
        snapshot.memory.cached,
        snapshot.memory.swap_used
    );

    section(theme, "Disk");
    println!(
        "  root {}/{} GB used ({}%, inodes {}%)  read {} GB  written {} GB",
        snapshot.disk.used,
        snapshot.disk.total,
        snapshot.disk.percent,
        snapshot.disk.inodes_percent,
        snapshot.disk.read,
        snapshot.disk.written
    );
    for fs in &snapshot.disk.filesystems {
        println!(
            "    {} on {}  {}/{} GB ({}%)",
            fs.device, fs.mount, fs.used, fs.total, fs.percent
        );
    }

    section(theme, "Network");
    println!(
        "  rx {} B/s  tx {} B/s  (totals {} / {} bytes)",
        snapshot.network.rx_rate,
        snapshot.network.tx_rate,
        snapshot.network.rx_total,
        snapshot.network.tx_total
    );
    for iface in &snapshot.network.interfaces {
        println!("    {} [{}] {}", iface.name, iface.status, iface.ipv4);
    }

    section(theme, "GPU");
    if snapshot.gpu.available {
        println!(
            "  {}  util {}%  temp {}  mem {}/{} MB  fan {}%  power {} W  clock {} MHz  link {}",
            snapshot.gpu.name,
            snapshot.gpu.utilization,
            snapshot.gpu.temperature,
            snapshot.gpu.memory_used,
            snapshot.gpu.memory_total,
            snapshot.gpu.fan,
            snapshot.gpu.power,
            snapshot.gpu.clock,
            snapshot.gpu.link
        );
    } else {
        println!("  {} (no live metrics)", snapshot.gpu.name);
    }

    section(theme, "Battery");
    if snapshot.battery.available {
        println!(
            "  {}%  {}  plugged {}  temp {}",
            snapshot.battery.percent,
            snapshot.battery.status,
            snapshot.battery.plugged,
            snapshot.battery.temperature
        );
    } else {
        println!("  not available ({})", snapshot.battery.hint);
    }

    section(theme, "Processes");
    println!(
        "  {} total, {} running",
        snapshot.processes.total, snapshot.processes.running
    );
}

pub fn print_platform(platform: &PlatformInfo, theme: &Theme) {
    println!(
        "platform: {}",
        theme.paint(&platform.class.to_string(), Color::Cyan).bold()
    );
    println!("kernel:   {}", platform.kernel);
    println!("arch:     {}", platform.arch);
}

pub fn print_capabilities(caps: &CapabilitySet, theme: &Theme) {
    let flag = |present: bool| -> ColoredString {
        if present {
            theme.paint("yes", Color::Green)
        } else {
            theme.paint("no", Color::Red)
        }
    };

    println!("procfs          {}", flag(caps.procfs));
    println!("sysfs           {}", flag(caps.sysfs));
    println!("thermal         {}", flag(caps.thermal));
    println!("power_supply    {}", flag(caps.power_supply));
    println!("net_sysfs       {}", flag(caps.net_sysfs));
    println!("kgsl            {}", flag(caps.kgsl));
    println!("mpstat          {}", flag(caps.mpstat));
    println!("top             {}", flag(caps.top));
    println!("sensors         {}", flag(caps.sensors));
    println!("nvidia-smi      {}", flag(caps.nvidia_smi));
    println!("lspci           {}", flag(caps.lspci));
    println!("ip              {}", flag(caps.ip));
    println!("getprop         {}", flag(caps.getprop));
    println!("termux-battery  {}", flag(caps.termux_battery));
    println!("mobile api      {}", flag(caps.mobile_api));
    println!("gpu vendor      {}", caps.gpu_vendor);
}

fn section(theme: &Theme, title: &str) {
    println!("{}", theme.paint(title, Color::Green).bold());
}
