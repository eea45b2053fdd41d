//! One-shot snapshot command.

use std::path::Path;

use crate::core::{sink, SnapshotAssembler, VigilConfig};
use crate::error::Result;
use crate::platform::{self, CapabilitySet};
use crate::ui::{print_snapshot, Theme};

pub async fn run(json: bool, log_path: Option<&Path>, theme: Theme) -> Result<()> {
    let platform = platform::detect();
    let caps = CapabilitySet::build(platform).await;
    let config = VigilConfig::load()?;

    let mut assembler = SnapshotAssembler::new(platform, caps, config);
    let snapshot = assembler.assemble().await;

    if let Some(path) = log_path {
        sink::append_log(path, &snapshot)?;
    }

    if json {
        println!("{}", sink::to_json(&snapshot)?);
    } else {
        print_snapshot(&snapshot, &theme);
    }

    Ok(())
}
