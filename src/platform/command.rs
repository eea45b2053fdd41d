//! Bounded external tool execution.
//!
//! Every collector strategy that shells out goes through [`run_tool`], so
//! tool invocations are uniformly time-limited and killed on cancellation.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::{Result, VigilError};

/// Run an external tool and capture stdout, bounded by `timeout`.
///
/// A missing binary maps to `SourceUnavailable`, an expired deadline to
/// `Timeout`, and a non-zero exit status to `SourceUnavailable`; callers
/// treat all three identically and advance their fallback chain. The child
/// is killed if the returned future is dropped mid-flight.
pub async fn run_tool(program: &str, args: &[&str], timeout: Duration) -> Result<String> {
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                VigilError::source_unavailable(format!("'{}' not found", program))
            }
            std::io::ErrorKind::PermissionDenied => {
                VigilError::permission_denied(format!("'{}' not executable", program))
            }
            _ => VigilError::Io(e),
        })?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| VigilError::timeout(format!("'{}' exceeded {:?}", program, timeout)))??;

    if !output.status.success() {
        return Err(VigilError::source_unavailable(format!(
            "'{}' exited with {}",
            program, output.status
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
