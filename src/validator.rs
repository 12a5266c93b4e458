//! `ksvalidator` adapter
//!
//! Runs the external checker against a file on disk. A clean exit means the
//! file is valid; otherwise stderr carries the error report that
//! [`crate::diagnostics`] turns into diagnostics.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{KickstartError, KsResult};

/// Default validator program, looked up on `PATH`.
pub const DEFAULT_PROGRAM: &str = "ksvalidator";

/// Something that can check a kickstart file on disk.
#[async_trait]
pub trait Validate: Send + Sync {
    /// Probe whether the validator can be run at all.
    fn is_available(&self) -> bool;

    /// Validate the file at `path`.
    ///
    /// Returns the captured stderr when the validator reported a problem and
    /// `None` when it exited cleanly.
    async fn run(&self, path: &Path) -> KsResult<Option<String>>;
}

/// The real `ksvalidator` binary.
#[derive(Debug, Clone)]
pub struct Ksvalidator {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl Default for Ksvalidator {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl Ksvalidator {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    /// Bound every run by `timeout`. Without one a hung validator hangs the
    /// validation that started it.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn spawn_error(&self, source: std::io::Error) -> KickstartError {
        KickstartError::Spawn {
            program: self.program.clone(),
            source,
        }
    }
}

#[async_trait]
impl Validate for Ksvalidator {
    fn is_available(&self) -> bool {
        // --help always exits cleanly when the program is installed
        match std::process::Command::new(&self.program)
            .arg("--help")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) => status.success(),
            Err(e) => {
                warn!(
                    "Failed to check {} availability: {}",
                    self.program.display(),
                    e
                );
                false
            }
        }
    }

    async fn run(&self, path: &Path) -> KsResult<Option<String>> {
        debug!(
            "Running {} -- {}",
            self.program.display(),
            path.display()
        );

        let output = Command::new(&self.program)
            .arg("--")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, output)
                .await
                .map_err(|_| KickstartError::Timeout(limit))?,
            None => output.await,
        }
        .map_err(|e| self.spawn_error(e))?;

        if output.status.success() {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&output.stderr).into_owned()))
    }
}
