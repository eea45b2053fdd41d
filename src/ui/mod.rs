pub mod render;

pub use render::{print_capabilities, print_platform, print_snapshot, Theme};
