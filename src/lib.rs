//! kickstart-ls - language server for Kickstart files
//!
//! Provides command completion and live diagnostics for Kickstart files.
//! Validation is delegated to `ksvalidator`; its error report is translated
//! into positioned diagnostics and published to the editor.
//!
//! # Example
//!
//! ```no_run
//! use kickstart_ls::diagnostics::parse_stderr;
//! use kickstart_ls::validator::{Ksvalidator, Validate};
//! use std::path::Path;
//!
//! # async fn demo() -> kickstart_ls::KsResult<()> {
//! let validator = Ksvalidator::default();
//! if let Some(stderr) = validator.run(Path::new("anaconda-ks.cfg")).await? {
//!     for diagnostic in parse_stderr(&stderr, None) {
//!         println!("{}: {}", diagnostic.range.start.line + 1, diagnostic.message);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod completion;
pub mod diagnostics;
pub mod error;
pub mod lsp;
pub mod scratch;
pub mod settings;
pub mod validator;

// Re-export commonly used types
pub use error::{KickstartError, KsResult};
pub use settings::{LintingSettings, ServerSettings};
