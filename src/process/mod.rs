mod launch;

#[cfg(unix)]
pub mod table;
#[cfg(windows)]
pub mod windows;

pub use launch::Launcher;

use crate::error::LaunchError;
use crate::service::ServiceDescriptor;

use async_trait::async_trait;
use regex::Regex;
use std::io;

/// Starts and stops the OS processes behind a service.
#[async_trait]
pub trait ProcessControl: Send + Sync {
    /// Spawns a detached process and waits for the readiness race to settle.
    async fn launch(&self, service: &ServiceDescriptor) -> Result<(), LaunchError>;
    /// Asks every process matching the service to exit. Finding none is success.
    async fn terminate(&self, service: &ServiceDescriptor) -> io::Result<()>;
}

#[async_trait]
impl ProcessControl for Launcher {
    async fn launch(&self, service: &ServiceDescriptor) -> Result<(), LaunchError> { self.start(service).await }

    async fn terminate(&self, service: &ServiceDescriptor) -> io::Result<()> {
        #[cfg(unix)]
        {
            let signalled = table::terminate(&service.pattern).await?;
            log::debug!("sent SIGTERM to {signalled} process(es) for {}", service.id);
            Ok(())
        }

        #[cfg(windows)]
        {
            windows::terminate(service.pattern.as_str()).await
        }
    }
}

/// Whether any process in the OS table matches `pattern`.
pub async fn is_alive(pattern: &Regex) -> io::Result<bool> {
    #[cfg(unix)]
    {
        Ok(!table::find(pattern).await?.is_empty())
    }

    #[cfg(windows)]
    {
        windows::window_open(pattern.as_str()).await
    }
}
