//! Kickstart Extension for Zed
//!
//! Starts kickstart-ls for Kickstart files:
//! - Diagnostics reported by ksvalidator
//! - Completion for commands and their options
//!
//! Requires: kickstart-ls and ksvalidator (pykickstart) in PATH

use zed_extension_api::{self as zed, LanguageServerId, Result};

struct KickstartExtension;

impl zed::Extension for KickstartExtension {
    fn new() -> Self {
        Self
    }

    fn language_server_command(
        &mut self,
        _language_server_id: &LanguageServerId,
        worktree: &zed::Worktree,
    ) -> Result<zed::Command> {
        let path = worktree.which("kickstart-ls").ok_or_else(|| {
            "kickstart-ls not found in PATH. Install with: cargo install kickstart-ls".to_string()
        })?;

        Ok(zed::Command {
            command: path,
            args: vec!["serve".to_string()],
            env: worktree.shell_env(),
        })
    }
}

zed::register_extension!(KickstartExtension);
