use crate::config::structs::{HealthPolicy, Runner};
use crate::error::LaunchError;
use crate::file::Exists;
use crate::probe::http;
use crate::service::ServiceDescriptor;

use reqwest::Client;
use std::{process::Stdio, time::Duration};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::{process::Command, sync::mpsc, time};

/// First thing a freshly spawned process told us.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Signal {
    Output,
    Failure(String),
    Timeout,
}

#[derive(Clone, Copy, Debug)]
enum Source {
    Stdout,
    Stderr,
}

struct Chunk {
    source: Source,
    text: String,
}

fn classify(chunk: Chunk) -> Signal {
    match chunk.source {
        Source::Stderr if chunk.text.to_lowercase().contains("error") => Signal::Failure(chunk.text.trim().to_string()),
        _ => Signal::Output,
    }
}

/// Reads to EOF but forwards only the first chunk; the rest is discarded so the
/// child never blocks on a full pipe.
async fn watch<R: AsyncRead + Unpin>(source: Source, mut reader: R, tx: mpsc::Sender<Chunk>) {
    let mut buf = vec![0u8; 4096];
    let mut tx = Some(tx);

    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if let Some(tx) = tx.take() {
                    let text = String::from_utf8_lossy(&buf[..n]).into_owned();
                    let _ = tx.send(Chunk { source, text }).await;
                }
            }
        }
    }
}

/// Races the first output chunk of either stream against `timeout`. A stream
/// closing without output is not a signal.
pub(crate) async fn first_signal<O, E>(stdout: O, stderr: E, timeout: Duration) -> Signal
where
    O: AsyncRead + Unpin + Send + 'static,
    E: AsyncRead + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel(2);
    tokio::spawn(watch(Source::Stdout, stdout, tx.clone()));
    tokio::spawn(watch(Source::Stderr, stderr, tx));

    tokio::select! {
        Some(chunk) = rx.recv() => classify(chunk),
        _ = time::sleep(timeout) => Signal::Timeout,
    }
}

/// Spawns services through the configured shell and decides whether each launch took.
///
/// Children outlive this process, but their stdout and stderr pipes are only
/// drained while it runs. A service that keeps writing to them after the
/// supervisor exits receives SIGPIPE, so long-lived services should redirect
/// their output in the start command.
pub struct Launcher {
    shell: String,
    args: Vec<String>,
    readiness: Duration,
    policy: HealthPolicy,
    client: Client,
}

impl Launcher {
    pub fn new(runner: &Runner) -> Self {
        Launcher {
            shell: runner.shell.clone(),
            args: runner.args.clone(),
            policy: runner.health_policy,
            readiness: Duration::from_millis(runner.readiness_ms),
            client: http::client(Duration::from_millis(runner.health_timeout_ms)),
        }
    }

    fn command(&self, service: &ServiceDescriptor) -> Command {
        let mut command = Command::new(&self.shell);

        command
            .args(&self.args)
            .arg(service.command())
            .current_dir(&service.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        detach(&mut command);
        command
    }

    pub(crate) async fn start(&self, service: &ServiceDescriptor) -> Result<(), LaunchError> {
        if !Exists::check(&service.dir).folder() {
            return Err(LaunchError::MissingDirectory(service.dir.clone()));
        }

        let mut child = self.command(service).spawn().map_err(|err| LaunchError::Spawn(err.to_string()))?;
        log::debug!("spawned {} (pid={:?}, command={:?})", service.id, child.id(), service.command());

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(LaunchError::Spawn("output streams are not piped".into()));
        };

        tokio::spawn(async move {
            let _ = child.wait().await;
        });

        match first_signal(stdout, stderr, self.readiness).await {
            Signal::Output => Ok(()),
            Signal::Failure(message) => Err(LaunchError::Stderr(message)),
            Signal::Timeout => self.settle(service).await,
        }
    }

    /// Silent after the readiness window: fall back to the health check, if any.
    async fn settle(&self, service: &ServiceDescriptor) -> Result<(), LaunchError> {
        let Some(url) = &service.health else {
            return Ok(());
        };

        let reason = match http::healthy(&self.client, url).await {
            Ok(true) => return Ok(()),
            Ok(false) => format!("{url} answered outside 200-399"),
            Err(err) => err.to_string(),
        };

        match self.policy {
            HealthPolicy::Lenient => {
                log::warn!("{} health check failed ({reason}), assuming it is still starting", service.name);
                Ok(())
            }
            HealthPolicy::Strict => Err(LaunchError::Unhealthy(reason)),
        }
    }
}

#[cfg(unix)]
fn detach(command: &mut Command) {
    #[allow(unsafe_code)]
    unsafe {
        command.pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

#[cfg(windows)]
fn detach(command: &mut Command) {
    const DETACHED_PROCESS: u32 = 0x0000_0008;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;

    command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
}
