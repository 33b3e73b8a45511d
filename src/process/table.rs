use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use regex::Regex;
use std::io;

#[derive(Debug, Clone)]
pub struct Entry {
    pub pid: u32,
    pub command: String,
}

/// Snapshot of every process with a non-empty command line.
pub async fn snapshot() -> io::Result<Vec<Entry>> {
    #[cfg(target_os = "linux")]
    {
        tokio::task::spawn_blocking(read_proc).await.map_err(io::Error::other)?
    }

    #[cfg(not(target_os = "linux"))]
    {
        let output = tokio::process::Command::new("ps").args(["-axww", "-o", "pid=", "-o", "command="]).output().await?;

        if !output.status.success() {
            return Err(io::Error::other(format!("ps exited with {}", output.status)));
        }

        Ok(parse_ps(&String::from_utf8_lossy(&output.stdout)))
    }
}

#[cfg(target_os = "linux")]
fn read_proc() -> io::Result<Vec<Entry>> {
    use std::fs;

    let mut entries = Vec::new();

    for entry in fs::read_dir("/proc")? {
        let Ok(entry) = entry else { continue };
        let Some(pid) = entry.file_name().to_str().and_then(|name| name.parse::<u32>().ok()) else {
            continue;
        };

        // kernel threads have no command line; processes may also exit mid-scan
        let Ok(raw) = fs::read(entry.path().join("cmdline")) else { continue };
        if let Some(command) = join_cmdline(&raw) {
            entries.push(Entry { pid, command });
        }
    }

    Ok(entries)
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn join_cmdline(raw: &[u8]) -> Option<String> {
    let args: Vec<_> = raw.split(|byte| *byte == 0).filter(|arg| !arg.is_empty()).map(String::from_utf8_lossy).collect();
    match args.is_empty() {
        true => None,
        false => Some(args.join(" ")),
    }
}

#[cfg_attr(target_os = "linux", allow(dead_code))]
fn parse_ps(output: &str) -> Vec<Entry> {
    output
        .lines()
        .filter_map(|line| {
            let (pid, command) = line.trim().split_once(char::is_whitespace)?;
            Some(Entry {
                pid: pid.parse().ok()?,
                command: command.trim().to_string(),
            })
        })
        .collect()
}

/// Pids whose command line matches `pattern`, excluding this process.
pub async fn find(pattern: &Regex) -> io::Result<Vec<u32>> {
    let own = std::process::id();
    let pids = snapshot()
        .await?
        .into_iter()
        .filter(|entry| entry.pid != own && pattern.is_match(&entry.command))
        .map(|entry| entry.pid)
        .collect();

    Ok(pids)
}

/// Sends SIGTERM to every match. A process vanishing between scan and signal is not an error.
pub async fn terminate(pattern: &Regex) -> io::Result<usize> {
    let mut signalled = 0;

    for pid in find(pattern).await? {
        let Ok(raw) = i32::try_from(pid) else { continue };

        match kill(Pid::from_raw(raw), Signal::SIGTERM) {
            Ok(()) => signalled += 1,
            Err(Errno::ESRCH) => log::debug!("pid {pid} exited before SIGTERM"),
            Err(err) => return Err(io::Error::from(err)),
        }
    }

    Ok(signalled)
}
