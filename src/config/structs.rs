use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    pub project_root: PathBuf,
    pub runner: Runner,
    #[serde(default)]
    pub monitor: Monitor,
    #[serde(default)]
    pub device: Device,
    pub services: BTreeMap<String, Service>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Runner {
    pub shell: String,
    pub args: Vec<String>,
    #[serde(default = "default_readiness")]
    pub readiness_ms: u64,
    #[serde(default = "default_health_timeout")]
    pub health_timeout_ms: u64,
    #[serde(default)]
    pub health_policy: HealthPolicy,
}

/// What a launch reports when its health check fails after the readiness timeout.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthPolicy {
    /// Log a warning and still report the launch as succeeded.
    #[default]
    Lenient,
    Strict,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Monitor {
    pub interval: u64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Device {
    pub binary: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Service {
    pub name: String,
    pub port: Option<u16>,
    pub dir: PathBuf,
    pub pattern: String,
    pub health: Option<String>,
    pub start: StartCommand,
    pub liveness: Option<Liveness>,
}

/// Shell command line, either shared by every platform or split per platform.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum StartCommand {
    Shared(String),
    PerOs { unix: String, windows: String },
}

impl StartCommand {
    pub fn current(&self) -> &str {
        match self {
            StartCommand::Shared(command) => command,
            StartCommand::PerOs { windows, .. } if cfg!(windows) => windows,
            StartCommand::PerOs { unix, .. } => unix,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Liveness {
    #[serde(default = "default_quorum")]
    pub quorum: usize,
    pub checks: Vec<Check>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Check {
    Port { port: u16 },
    Pattern { pattern: String },
    Http { http: String },
}

fn default_readiness() -> u64 { 2000 }
fn default_health_timeout() -> u64 { 1500 }
fn default_quorum() -> usize { 1 }

impl Default for Runner {
    fn default() -> Self {
        let (shell, args) = match cfg!(windows) {
            true => ("cmd", "/c"),
            false => ("bash", "-c"),
        };

        Runner {
            shell: shell.to_string(),
            args: vec![args.to_string()],
            readiness_ms: default_readiness(),
            health_timeout_ms: default_health_timeout(),
            health_policy: HealthPolicy::Lenient,
        }
    }
}

impl Default for Monitor {
    fn default() -> Self { Monitor { interval: 1000 } }
}

impl Default for Device {
    fn default() -> Self { Device { binary: "adb".to_string() } }
}
