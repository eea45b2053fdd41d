use anyhow::Result;
use clap::{Arg, Command};
use std::path::PathBuf;

use vigil::commands;
use vigil::ui::Theme;

fn main() -> Result<()> {
    vigil::init_logging();

    let matches = Command::new("vigil")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Host health snapshot engine for Linux, WSL, Android and Termux")
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disable colored output")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("snapshot")
                .about("Collect and print one snapshot")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the snapshot as JSON instead of formatted text")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("log")
                        .long("log")
                        .value_name("FILE")
                        .help("Append a historical-log entry to FILE")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("watch")
                .about("Poll continuously, one status line per tick")
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval")
                        .value_name("SECS")
                        .help("Seconds between polls (default from config, 2)")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("count")
                        .short('n')
                        .long("count")
                        .value_name("N")
                        .help("Stop after N polls")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("log")
                        .long("log")
                        .value_name("FILE")
                        .help("Append a historical-log entry to FILE on every poll")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("capabilities")
                .about("Probe and print which data sources are usable on this host"),
        )
        .subcommand(Command::new("platform").about("Print the detected platform class"))
        .get_matches();

    let theme = if matches.get_flag("no-color") {
        Theme::plain()
    } else {
        Theme::colored()
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_time()
        .enable_io()
        .thread_name("vigil-worker")
        .build()?;

    match matches.subcommand() {
        Some(("snapshot", sub)) => {
            let json = sub.get_flag("json");
            let log = sub.get_one::<PathBuf>("log").cloned();
            runtime.block_on(commands::snapshot::run(json, log.as_deref(), theme))?;
        }
        Some(("watch", sub)) => {
            let interval = sub.get_one::<u64>("interval").copied();
            let count = sub.get_one::<u64>("count").copied();
            let log = sub.get_one::<PathBuf>("log").cloned();
            runtime.block_on(commands::watch::run(interval, count, log.as_deref(), theme))?;
        }
        Some(("capabilities", _)) => {
            runtime.block_on(commands::capabilities::run(theme))?;
        }
        Some(("platform", _)) => {
            commands::capabilities::run_platform(theme)?;
        }
        _ => {
            // Bare invocation behaves like `vigil snapshot`
            runtime.block_on(commands::snapshot::run(false, None, theme))?;
        }
    }

    Ok(())
}
