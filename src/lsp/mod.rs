//! LSP Server for Kickstart files
//!
//! Provides Language Server Protocol support for:
//! - Live diagnostics from `ksvalidator`
//! - Command and argument completion

pub mod capabilities;
pub mod controller;
pub mod document;
pub mod server;

pub use controller::{DiagnosticSink, DocumentController, Session};
pub use server::run_lsp_server;
pub use server::{KickstartLsp, ServerConfig};
