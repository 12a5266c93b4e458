//! Scratch directories for validating unsaved buffers
//!
//! `ksvalidator` only reads files, so buffer content is copied into a fresh
//! directory under the system temp root before each run. The directory is
//! removed when the [`ScratchWorkspace`] is closed or dropped.
//!
//! Directory creation and removal run on the blocking pool so a validation
//! never stalls the runtime on filesystem work.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::{Builder, TempDir};
use tokio::task::{self, JoinError};
use tracing::debug;

use crate::error::KsResult;

/// File name the buffer is written to inside the workspace.
pub const INPUT_FILE_NAME: &str = "ksvalidator-input.ks";

const DIR_PREFIX: &str = "kickstart-ls-";

/// A uniquely named directory owned by a single validation run.
#[derive(Debug)]
pub struct ScratchWorkspace {
    dir: TempDir,
}

impl ScratchWorkspace {
    /// Create a new directory under the canonical system temp root.
    pub async fn create() -> KsResult<Self> {
        Self::create_in(std::env::temp_dir()).await
    }

    /// Create a new directory under `root`, resolving symlinks first.
    pub async fn create_in(root: impl Into<PathBuf>) -> KsResult<Self> {
        let root = root.into();
        let dir = task::spawn_blocking(move || {
            let root = root.canonicalize()?;
            Builder::new().prefix(DIR_PREFIX).tempdir_in(root)
        })
        .await
        .map_err(join_error)??;

        debug!("Created scratch workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `content` to the input file and return its path.
    pub async fn write_input(&self, content: &str) -> KsResult<PathBuf> {
        let file = self.dir.path().join(INPUT_FILE_NAME);
        tokio::fs::write(&file, content).await?;
        Ok(file)
    }

    /// Remove the directory and everything in it.
    ///
    /// A directory that someone else already removed counts as closed.
    pub async fn close(self) -> KsResult<()> {
        let dir = self.dir;
        task::spawn_blocking(move || match dir.close() {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            result => result,
        })
        .await
        .map_err(join_error)??;
        Ok(())
    }
}

fn join_error(e: JoinError) -> io::Error {
    io::Error::other(e)
}

/// Recursively remove `path`. A path that is already gone is not an error.
pub fn destroy(path: &Path) -> io::Result<()> {
    match std::fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        result => result,
    }
}
