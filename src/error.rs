use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tower_lsp::lsp_types::Url;

pub type KsResult<T> = Result<T, KickstartError>;

#[derive(Error, Debug)]
pub enum KickstartError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to run {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Validator did not finish within {0:?}")]
    Timeout(Duration),

    #[error("Invalid settings: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("Configuration request failed: {0}")]
    Configuration(String),

    #[error("Not a local file: {0}")]
    NonLocalUri(Url),

    #[error("File watcher error: {0}")]
    Watch(String),

    #[error("Lint found {problems} problem(s)")]
    LintFailed { problems: usize },
}
