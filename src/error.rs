use std::path::PathBuf;
use thiserror::Error;

pub type Result<R, E = Error> = std::result::Result<R, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown service `{0}`")]
    UnknownService(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("invalid process pattern for `{id}`: {source}")]
    Pattern { id: String, source: regex::Error },
    #[error("device command failed: {0}")]
    Device(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Why a single launch was reported as failed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LaunchError {
    #[error("service directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),
    #[error("process error: {0}")]
    Spawn(String),
    #[error("{0}")]
    Stderr(String),
    #[error("service started but health check failed ({0})")]
    Unhealthy(String),
}
