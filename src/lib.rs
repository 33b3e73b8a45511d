pub mod config;
pub mod device;
pub mod error;
pub mod file;
pub mod helpers;
pub mod probe;
pub mod process;
pub mod service;
pub mod supervisor;

pub use error::{Error, LaunchError, Result};
pub use service::{Registry, Selector, ServiceDescriptor};
pub use supervisor::Supervisor;
