//! Capability and platform inspection commands.

use crate::error::Result;
use crate::platform::{self, CapabilitySet};
use crate::ui::{print_capabilities, print_platform, Theme};

/// Probe and print the capability matrix. This is the explicit re-probe
/// path; the engine never refreshes capabilities on its own.
pub async fn run(theme: Theme) -> Result<()> {
    let platform = platform::detect();
    print_platform(platform, &theme);
    println!();

    let caps = CapabilitySet::build(platform).await;
    print_capabilities(&caps, &theme);

    Ok(())
}

pub fn run_platform(theme: Theme) -> Result<()> {
    print_platform(platform::detect(), &theme);
    Ok(())
}
