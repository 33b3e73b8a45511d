//! Windows has no command-line grep; services are matched on their window
//! title instead, which is a weaker signal than the Unix process table.

use std::io;
use tokio::process::Command;

fn title_filter(pattern: &str) -> String { format!("WINDOWTITLE eq *{pattern}*") }

pub async fn window_open(pattern: &str) -> io::Result<bool> {
    let output = Command::new("tasklist").args(["/FI", &title_filter(pattern), "/NH"]).output().await?;

    if !output.status.success() {
        return Err(io::Error::other(format!("tasklist exited with {}", output.status)));
    }

    Ok(String::from_utf8_lossy(&output.stdout).contains(".exe"))
}

/// Exit status is ignored: taskkill fails when nothing matched, which counts as stopped.
pub async fn terminate(pattern: &str) -> io::Result<()> {
    let output = Command::new("taskkill").args(["/F", "/FI", &title_filter(pattern), "/T"]).output().await?;
    log::debug!("taskkill for {pattern} exited with {}", output.status);

    Ok(())
}
