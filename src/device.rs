use crate::error::{Error, Result};
use std::ffi::OsStr;
use tokio::process::Command;

/// Runs the device-control binary and hands back its raw output.
#[derive(Clone, Debug)]
pub struct Adb {
    binary: String,
}

impl Adb {
    pub fn new(binary: impl Into<String>) -> Self { Adb { binary: binary.into() } }

    /// A non-zero exit is the only failure signal; output is never interpreted.
    pub async fn run<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .await
            .map_err(|err| Error::Device(format!("{}: {err}", self.binary)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(Error::Device(match stderr.is_empty() {
                true => format!("{} exited with {}", self.binary, output.status),
                false => stderr,
            }));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    pub async fn devices(&self) -> Result<String> { self.run(["devices", "-l"]).await }
}
